//! Command building: turn a resolved tool and planned outputs into a
//! command description for an external runner.
//!
//! Argument order: implementation fixed flags, user args, output flags, input.
//! Nothing is executed here.

use super::registry::ToolRegistry;
use super::types::*;
use tracing::warn;

/// Assembles generator command lines.
pub struct InvocationBuilder<'a> {
    registry: &'a ToolRegistry,
}

impl<'a> InvocationBuilder<'a> {
    pub fn new(registry: &'a ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn build(
        &self,
        tool: &ResolvedTool,
        outputs: &OutputSet,
        input: &str,
        extra_args: &[String],
    ) -> CommandDescription {
        let caps = self.registry.capabilities(tool.implementation);
        let mut args = Vec::new();

        if caps.wincompat {
            args.push("--wincompat".to_string());
        }
        args.extend(extra_args.iter().cloned());
        args.push("-o".to_string());
        args.push(outputs.source().to_string());

        if let Some(header) = outputs.header() {
            match caps.header_flag {
                HeaderFlag::HeaderFile => args.push(format!("--header-file={}", header)),
                HeaderFlag::Defines => {
                    if tool.implementation == Implementation::Yacc {
                        warn!(
                            path = %tool.path.display(),
                            "this yacc does not appear to be bison or byacc; POSIX does not \
                             require the header location to be configurable"
                        );
                    }
                    args.push(format!("--defines={}", header));
                }
                HeaderFlag::DashH => {
                    args.push("-H".to_string());
                    args.push(header.to_string());
                }
            }
        }
        if let Some(table) = outputs.get(OutputKind::Table) {
            if caps.tables_file {
                args.push(format!("--tables-file={}", table));
            }
        }
        args.push(input.to_string());

        let mut required_headers = Vec::new();
        if caps.needs_flex_lexer_header && outputs.is_cpp {
            required_headers.push("FlexLexer.h".to_string());
        }

        let output_names: Vec<String> = outputs.outputs.iter().map(|o| o.name.clone()).collect();
        let program = tool.path.clone();
        let fingerprint = fingerprint(&program.to_string_lossy(), &args, &output_names);

        CommandDescription {
            target: format!("codegen-{}-{}", tool.family.target_prefix(), outputs.base),
            description: format!(
                "Generating {} {} with {}",
                tool.family, outputs.base, tool.implementation
            ),
            program,
            args,
            input: input.to_string(),
            outputs: output_names,
            required_headers,
            fingerprint,
        }
    }
}

/// BLAKE3 over program, args and outputs. Returns `"blake3:{hex}"`.
pub fn fingerprint(program: &str, args: &[String], outputs: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(program.as_bytes());
    hasher.update(b"\0");
    for a in args {
        hasher.update(a.as_bytes());
        hasher.update(b"\0");
    }
    hasher.update(b"\n");
    for o in outputs {
        hasher.update(o.as_bytes());
        hasher.update(b"\0");
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}
