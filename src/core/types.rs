//! Shared types: tool families, implementations, resolved tools, generation
//! requests, output sets, command descriptions, and the YAML build description.
//!
//! Description types derive Serialize/Deserialize for YAML roundtripping.

use super::version::{Version, VersionSpec};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// Families and implementations
// ============================================================================

/// The two kinds of code generator this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFamily {
    Lexer,
    Parser,
}

impl ToolFamily {
    /// Extension marking a C++ flavoured input (`.ll` / `.yy`).
    pub fn cpp_input_extension(self) -> &'static str {
        match self {
            Self::Lexer => "ll",
            Self::Parser => "yy",
        }
    }

    /// Short name used in target names (`codegen-lex-*`, `codegen-yacc-*`).
    pub fn target_prefix(self) -> &'static str {
        match self {
            Self::Lexer => "lex",
            Self::Parser => "yacc",
        }
    }
}

impl fmt::Display for ToolFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexer => write!(f, "lexer"),
            Self::Parser => write!(f, "parser"),
        }
    }
}

impl FromStr for ToolFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lexer" | "lex" => Ok(Self::Lexer),
            "parser" | "yacc" => Ok(Self::Parser),
            other => Err(format!("unknown tool family: {}", other)),
        }
    }
}

/// A concrete generator implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Implementation {
    Lex,
    Flex,
    Reflex,
    WinFlex,
    Yacc,
    Byacc,
    Bison,
    WinBison,
}

impl Implementation {
    pub fn family(self) -> ToolFamily {
        match self {
            Self::Lex | Self::Flex | Self::Reflex | Self::WinFlex => ToolFamily::Lexer,
            Self::Yacc | Self::Byacc | Self::Bison | Self::WinBison => ToolFamily::Parser,
        }
    }

    /// Canonical executable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lex => "lex",
            Self::Flex => "flex",
            Self::Reflex => "reflex",
            Self::WinFlex => "win_flex",
            Self::Yacc => "yacc",
            Self::Byacc => "byacc",
            Self::Bison => "bison",
            Self::WinBison => "win_bison",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::Lex,
            Self::Flex,
            Self::Reflex,
            Self::WinFlex,
            Self::Yacc,
            Self::Byacc,
            Self::Bison,
            Self::WinBison,
        ]
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Implementation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|i| i.name() == s)
            .ok_or_else(|| format!("unknown implementation: {}", s))
    }
}

/// How an implementation takes the header output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFlag {
    /// `--header-file=<path>` (flex family)
    HeaderFile,
    /// `--defines=<path>` (bison, POSIX yacc)
    Defines,
    /// `-H <path>` (byacc)
    DashH,
}

// ============================================================================
// Resolution
// ============================================================================

/// A tool chosen for one (scope, family) pair. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTool {
    pub family: ToolFamily,
    pub implementation: Implementation,
    pub path: PathBuf,
    pub version: Version,
}

impl fmt::Display for ResolvedTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.implementation,
            self.version,
            self.path.display()
        )
    }
}

/// Whether a resolution came from a generation request or an explicit find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOrigin {
    Implicit,
    Explicit,
}

impl fmt::Display for ResolutionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Implicit => write!(f, "implicitly"),
            Self::Explicit => write!(f, "explicitly"),
        }
    }
}

/// Parameters for one resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    /// Allow-list; `None` means every implementation of the family.
    pub allowed: Option<Vec<Implementation>>,

    /// Constraints keyed by implementation.
    pub versions: IndexMap<Implementation, VersionSpec>,

    /// Constraint applied to every candidate (per-call version).
    pub version: VersionSpec,
}

impl ResolveRequest {
    pub fn allow(mut self, implementations: &[Implementation]) -> Self {
        self.allowed = Some(implementations.to_vec());
        self
    }

    pub fn with_version(mut self, implementation: Implementation, spec: VersionSpec) -> Self {
        self.versions.insert(implementation, spec);
        self
    }

    pub fn is_allowed(&self, implementation: Implementation) -> bool {
        self.allowed
            .as_ref()
            .map(|a| a.contains(&implementation))
            .unwrap_or(true)
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Input to a generator: a file, or an output of another build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceRef {
    File(PathBuf),
    Generated { target: String, outputs: Vec<String> },
}

impl SourceRef {
    /// The path the generator reads: the file itself, or the first output.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(p) => Some(p.as_path()),
            Self::Generated { outputs, .. } => outputs.first().map(Path::new),
        }
    }

    /// Bare file name, directories dropped.
    pub fn file_name(&self) -> Option<&str> {
        self.path()?.file_name()?.to_str()
    }
}

impl From<&str> for SourceRef {
    fn from(s: &str) -> Self {
        Self::File(PathBuf::from(s))
    }
}

/// Output name overrides and naming policy for one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub source: Option<String>,
    pub header: Option<String>,
    pub table: Option<String>,
    pub locations: Option<String>,
    pub plain_name: bool,
}

/// One call to `lex()` / `yacc()`.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub input: SourceRef,
    pub options: OutputOptions,
    pub args: Vec<String>,
    pub version: VersionSpec,
}

impl GenerationRequest {
    pub fn new(input: impl Into<SourceRef>) -> Self {
        Self {
            input: input.into(),
            options: OutputOptions::default(),
            args: Vec::new(),
            version: VersionSpec::default(),
        }
    }
}

/// Role of a planned output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Source,
    Header,
    Table,
    Locations,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Header => write!(f, "header"),
            Self::Table => write!(f, "table"),
            Self::Locations => write!(f, "locations"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedOutput {
    pub kind: OutputKind,
    pub name: String,
}

/// Ordered outputs. Lexer: source, header?, table?. Parser: source, header, locations?.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSet {
    pub family: ToolFamily,
    pub base: String,
    /// Input is C++ flavoured (`.ll` / `.yy`), whatever the output names
    pub is_cpp: bool,
    pub outputs: Vec<PlannedOutput>,
}

impl OutputSet {
    pub fn names(&self) -> Vec<&str> {
        self.outputs.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn get(&self, kind: OutputKind) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.kind == kind)
            .map(|o| o.name.as_str())
    }

    pub fn source(&self) -> &str {
        // The planner always puts the source first.
        self.outputs.first().map(|o| o.name.as_str()).unwrap_or_default()
    }

    pub fn header(&self) -> Option<&str> {
        self.get(OutputKind::Header)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// An executable command for an external build-graph runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescription {
    /// Build target name (e.g. `codegen-lex-scanner`)
    pub target: String,

    /// Human-readable progress line
    pub description: String,

    /// Generator binary
    pub program: PathBuf,

    /// Arguments after the program, in order
    pub args: Vec<String>,

    /// Generator input path
    pub input: String,

    /// Output names, in OutputSet order
    pub outputs: Vec<String>,

    /// Headers the generated code needs from the compiler's include path
    pub required_headers: Vec<String>,

    /// BLAKE3 over program, args and outputs
    pub fingerprint: String,
}

impl CommandDescription {
    /// Full argv, program first.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.to_string_lossy().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

// ============================================================================
// Build description (gentool.yaml)
// ============================================================================

/// Root of a build description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildDescription {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Project name
    pub name: String,

    /// Scopes (subprojects) and their tool preferences
    #[serde(default)]
    pub scopes: IndexMap<String, ScopeConfig>,

    /// Generation requests, in declaration order
    #[serde(default)]
    pub generate: Vec<GenerateEntry>,
}

/// Tool preferences for one scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeConfig {
    #[serde(default)]
    pub lexer: Option<ToolPreference>,

    #[serde(default)]
    pub parser: Option<ToolPreference>,
}

impl ScopeConfig {
    pub fn preference(&self, family: ToolFamily) -> Option<&ToolPreference> {
        match family {
            ToolFamily::Lexer => self.lexer.as_ref(),
            ToolFamily::Parser => self.parser.as_ref(),
        }
    }
}

/// Allowed implementations and version constraints for one family.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolPreference {
    /// Allow-list; empty means all
    #[serde(default)]
    pub implementations: Vec<Implementation>,

    /// Constraints per implementation (e.g. `flex: [">=2.6"]`)
    #[serde(default)]
    pub version: IndexMap<Implementation, Vec<String>>,

    /// Resolve with an explicit find before any generation
    #[serde(default)]
    pub explicit: bool,
}

/// One generation request in the description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateEntry {
    pub scope: String,
    pub family: ToolFamily,
    pub input: SourceRef,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub header: Option<String>,

    #[serde(default)]
    pub table: Option<String>,

    #[serde(default)]
    pub locations: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub plainname: bool,

    /// Per-call constraint, applied only when this call resolves the tool
    #[serde(default)]
    pub version: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implementation_family() {
        assert_eq!(Implementation::WinFlex.family(), ToolFamily::Lexer);
        assert_eq!(Implementation::Byacc.family(), ToolFamily::Parser);
        for i in Implementation::all() {
            assert_eq!(i.name().parse::<Implementation>().unwrap(), *i);
        }
    }

    #[test]
    fn test_implementation_serde_names() {
        let yaml = "[win_flex, win_bison, byacc]";
        let parsed: Vec<Implementation> = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(
            parsed,
            vec![
                Implementation::WinFlex,
                Implementation::WinBison,
                Implementation::Byacc
            ]
        );
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("lex".parse::<ToolFamily>().unwrap(), ToolFamily::Lexer);
        assert_eq!("parser".parse::<ToolFamily>().unwrap(), ToolFamily::Parser);
        assert!("grammar".parse::<ToolFamily>().is_err());
    }

    #[test]
    fn test_source_ref_file_name() {
        let s = SourceRef::from("src/deep/lexer.l");
        assert_eq!(s.file_name(), Some("lexer.l"));

        let g = SourceRef::Generated {
            target: "gen-grammar".to_string(),
            outputs: vec!["out/grammar.yy".to_string(), "out/other.txt".to_string()],
        };
        assert_eq!(g.file_name(), Some("grammar.yy"));

        let empty = SourceRef::Generated {
            target: "nothing".to_string(),
            outputs: vec![],
        };
        assert_eq!(empty.file_name(), None);
    }

    #[test]
    fn test_source_ref_untagged_yaml() {
        let file: SourceRef = serde_yaml_ng::from_str("src/lexer.l").unwrap();
        assert_eq!(file, SourceRef::File(PathBuf::from("src/lexer.l")));

        let generated: SourceRef =
            serde_yaml_ng::from_str("{target: pre, outputs: [pre.y]}").unwrap();
        assert_eq!(generated.file_name(), Some("pre.y"));
    }

    #[test]
    fn test_resolve_request_allow() {
        let any = ResolveRequest::default();
        assert!(any.is_allowed(Implementation::Bison));

        let only = ResolveRequest::default().allow(&[Implementation::Byacc]);
        assert!(only.is_allowed(Implementation::Byacc));
        assert!(!only.is_allowed(Implementation::Bison));
    }

    #[test]
    fn test_command_argv() {
        let cmd = CommandDescription {
            target: "codegen-lex-x".to_string(),
            description: String::new(),
            program: PathBuf::from("/usr/bin/flex"),
            args: vec!["-o".to_string(), "x.c".to_string(), "x.l".to_string()],
            input: "x.l".to_string(),
            outputs: vec!["x.c".to_string()],
            required_headers: vec![],
            fingerprint: String::new(),
        };
        assert_eq!(cmd.argv(), vec!["/usr/bin/flex", "-o", "x.c", "x.l"]);
    }
}
