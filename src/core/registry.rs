//! Supported generator implementations, their executables and capabilities,
//! and version detection of installed binaries.

use super::error::DetectionError;
use super::types::{HeaderFlag, Implementation, ToolFamily};
use super::version::Version;
use crate::transport::ToolProbe;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Flags and quirks of one implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Accepts `--wincompat`
    pub wincompat: bool,
    /// How the header path is passed
    pub header_flag: HeaderFlag,
    /// Accepts `--tables-file=`
    pub tables_file: bool,
    /// C++ scanners include `FlexLexer.h`
    pub needs_flex_lexer_header: bool,
}

/// Process-wide, read-only table of known generators.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    lexers: Vec<Implementation>,
    parsers: Vec<Implementation>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        // Priority order: native tool, alternates, platform variant last.
        Self {
            lexers: vec![
                Implementation::Lex,
                Implementation::Flex,
                Implementation::Reflex,
                Implementation::WinFlex,
            ],
            parsers: vec![
                Implementation::Yacc,
                Implementation::Byacc,
                Implementation::Bison,
                Implementation::WinBison,
            ],
        }
    }
}

impl ToolRegistry {
    /// Shared registry, built on first use.
    pub fn global() -> &'static ToolRegistry {
        static REGISTRY: OnceLock<ToolRegistry> = OnceLock::new();
        REGISTRY.get_or_init(ToolRegistry::default)
    }

    /// Implementations of a family in resolution priority order.
    pub fn implementations_for(&self, family: ToolFamily) -> &[Implementation] {
        match family {
            ToolFamily::Lexer => &self.lexers,
            ToolFamily::Parser => &self.parsers,
        }
    }

    pub fn executable_name_of(&self, implementation: Implementation) -> &'static str {
        implementation.name()
    }

    pub fn capabilities(&self, implementation: Implementation) -> Capabilities {
        match implementation {
            Implementation::Lex | Implementation::Reflex => Capabilities {
                wincompat: false,
                header_flag: HeaderFlag::HeaderFile,
                tables_file: true,
                needs_flex_lexer_header: false,
            },
            Implementation::Flex => Capabilities {
                wincompat: false,
                header_flag: HeaderFlag::HeaderFile,
                tables_file: true,
                needs_flex_lexer_header: true,
            },
            Implementation::WinFlex => Capabilities {
                wincompat: true,
                header_flag: HeaderFlag::HeaderFile,
                tables_file: true,
                needs_flex_lexer_header: true,
            },
            Implementation::Byacc => Capabilities {
                wincompat: false,
                header_flag: HeaderFlag::DashH,
                tables_file: false,
                needs_flex_lexer_header: false,
            },
            Implementation::Yacc | Implementation::Bison | Implementation::WinBison => {
                Capabilities {
                    wincompat: false,
                    header_flag: HeaderFlag::Defines,
                    tables_file: false,
                    needs_flex_lexer_header: false,
                }
            }
        }
    }

    /// Locate an implementation's binary and read its version.
    pub fn detect(
        &self,
        implementation: Implementation,
        probe: &dyn ToolProbe,
    ) -> Result<(PathBuf, Version), DetectionError> {
        let executable = self.executable_name_of(implementation);
        let path = probe
            .locate(executable)
            .ok_or_else(|| DetectionError::NotFound {
                executable: executable.to_string(),
            })?;
        let version = self.detect_version(implementation, &path, probe)?;
        Ok((path, version))
    }

    /// Run `<path> --version` and parse the first dotted number.
    pub fn detect_version(
        &self,
        implementation: Implementation,
        path: &Path,
        probe: &dyn ToolProbe,
    ) -> Result<Version, DetectionError> {
        let out = probe
            .run(path, &["--version"])
            .map_err(|message| DetectionError::Spawn {
                path: path.to_path_buf(),
                message,
            })?;

        if implementation == Implementation::Reflex {
            check_reflex_identity(path, &out.stdout, &out.stderr)?;
        }

        if !out.success() {
            return Err(DetectionError::NonZeroExit {
                path: path.to_path_buf(),
                code: out.exit_code,
            });
        }

        let text = if out.stdout.trim().is_empty() {
            &out.stderr
        } else {
            &out.stdout
        };
        Version::extract(text).ok_or_else(|| DetectionError::UnparsableVersion {
            path: path.to_path_buf(),
        })
    }
}

/// Three unrelated programs ship as `reflex`; only the flex fork is usable.
fn check_reflex_identity(path: &Path, stdout: &str, stderr: &str) -> Result<(), DetectionError> {
    if stderr.contains("unknown flag: --version") {
        return Err(DetectionError::Incompatible {
            path: path.to_path_buf(),
            reason: "cespare/reflex is a file watcher, not a lexer".to_string(),
        });
    }
    if stdout.contains("Written by Robert van Engelen") {
        return Err(DetectionError::Incompatible {
            path: path.to_path_buf(),
            reason: "RE/flex is not compatible with POSIX lex".to_string(),
        });
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::FakeProbe;
    use super::*;

    #[test]
    fn test_priority_order() {
        let r = ToolRegistry::default();
        assert_eq!(
            r.implementations_for(ToolFamily::Lexer),
            &[
                Implementation::Lex,
                Implementation::Flex,
                Implementation::Reflex,
                Implementation::WinFlex
            ]
        );
        assert_eq!(
            r.implementations_for(ToolFamily::Parser),
            &[
                Implementation::Yacc,
                Implementation::Byacc,
                Implementation::Bison,
                Implementation::WinBison
            ]
        );
    }

    #[test]
    fn test_every_implementation_in_its_family() {
        let r = ToolRegistry::global();
        for family in [ToolFamily::Lexer, ToolFamily::Parser] {
            for i in r.implementations_for(family) {
                assert_eq!(i.family(), family);
            }
        }
        assert_eq!(r.executable_name_of(Implementation::WinBison), "win_bison");
    }

    #[test]
    fn test_capabilities() {
        let r = ToolRegistry::default();
        assert!(r.capabilities(Implementation::WinFlex).wincompat);
        assert!(!r.capabilities(Implementation::Flex).wincompat);
        assert_eq!(r.capabilities(Implementation::Byacc).header_flag, HeaderFlag::DashH);
        assert_eq!(r.capabilities(Implementation::Bison).header_flag, HeaderFlag::Defines);
        assert!(r.capabilities(Implementation::Flex).needs_flex_lexer_header);
        assert!(!r.capabilities(Implementation::Lex).needs_flex_lexer_header);
    }

    #[test]
    fn test_detect_version() {
        let probe = FakeProbe::new().with_tool("flex", "flex 2.6.4\n");
        let (path, version) = ToolRegistry::default()
            .detect(Implementation::Flex, &probe)
            .unwrap();
        assert_eq!(path, PathBuf::from("/usr/bin/flex"));
        assert_eq!(version, "2.6.4".parse().unwrap());
    }

    #[test]
    fn test_detect_version_from_stderr() {
        let probe = FakeProbe::new().with_output("byacc", 0, "", "byacc - 2.0 20230219\n");
        let (_, version) = ToolRegistry::default()
            .detect(Implementation::Byacc, &probe)
            .unwrap();
        assert_eq!(version.to_string(), "2.0");
    }

    #[test]
    fn test_detect_not_found() {
        let probe = FakeProbe::new();
        let err = ToolRegistry::default()
            .detect(Implementation::Bison, &probe)
            .unwrap_err();
        assert_eq!(
            err,
            DetectionError::NotFound {
                executable: "bison".to_string()
            }
        );
        assert_eq!(probe.run_count(), 0);
    }

    #[test]
    fn test_detect_non_zero_exit() {
        let probe = FakeProbe::new().with_output("lex", 1, "", "usage: lex ...");
        let err = ToolRegistry::default()
            .detect(Implementation::Lex, &probe)
            .unwrap_err();
        assert!(matches!(err, DetectionError::NonZeroExit { code: 1, .. }));
    }

    #[test]
    fn test_detect_unparsable() {
        let probe = FakeProbe::new().with_tool("yacc", "yacc (no version info)");
        let err = ToolRegistry::default()
            .detect(Implementation::Yacc, &probe)
            .unwrap_err();
        assert!(matches!(err, DetectionError::UnparsableVersion { .. }));
    }

    #[test]
    fn test_reflex_file_watcher_rejected() {
        let probe =
            FakeProbe::new().with_output("reflex", 2, "", "unknown flag: --version\nUsage: ...");
        let err = ToolRegistry::default()
            .detect(Implementation::Reflex, &probe)
            .unwrap_err();
        match err {
            DetectionError::Incompatible { reason, .. } => assert!(reason.contains("cespare")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reflex_re_flex_rejected() {
        let probe = FakeProbe::new().with_tool(
            "reflex",
            "reflex 3.3.2 C++ lexer generator\nWritten by Robert van Engelen",
        );
        let err = ToolRegistry::default()
            .detect(Implementation::Reflex, &probe)
            .unwrap_err();
        assert!(matches!(err, DetectionError::Incompatible { .. }));
    }

    #[test]
    fn test_reflex_flex_fork_accepted() {
        let probe = FakeProbe::new().with_tool("reflex", "reflex 2.6.4");
        let (_, version) = ToolRegistry::default()
            .detect(Implementation::Reflex, &probe)
            .unwrap();
        assert_eq!(version.to_string(), "2.6.4");
    }
}
