//! CLI subcommands: init, validate, plan, commands, find.

use crate::core::executor::{self, RunReport};
use crate::core::generator::CodeGen;
use crate::core::registry::ToolRegistry;
use crate::core::resolver::Scope;
use crate::core::types::{CommandDescription, Implementation, OutputSet, ResolvedTool, ToolFamily};
use crate::core::{parser, types};
use crate::transport::{SystemProbe, ToolProbe};
use clap::Subcommand;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a template gentool.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate gentool.yaml without probing any tools
    Validate {
        /// Path to gentool.yaml
        #[arg(short, long, default_value = "gentool.yaml")]
        file: PathBuf,
    },

    /// Show planned outputs for every generation entry (no tool detection)
    Plan {
        /// Path to gentool.yaml
        #[arg(short, long, default_value = "gentool.yaml")]
        file: PathBuf,
    },

    /// Resolve tools on this system and print generator commands
    Commands {
        /// Path to gentool.yaml
        #[arg(short, long, default_value = "gentool.yaml")]
        file: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Find a lexer or parser generator on this system
    Find {
        /// Tool family: lexer or parser
        family: ToolFamily,

        /// Restrict to these implementations (repeatable)
        #[arg(long = "allow", value_name = "IMPL")]
        allow: Vec<Implementation>,

        /// Version constraint, e.g. ">=2.6, <3"
        #[arg(long = "version", value_name = "SPEC")]
        version: Option<String>,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Plan { file } => cmd_plan(&file),
        Commands::Commands { file, json } => {
            cmd_commands(&file, json, &SystemProbe::from_env())
        }
        Commands::Find {
            family,
            allow,
            version,
        } => cmd_find(family, &allow, version.as_deref(), &SystemProbe::from_env()),
    }
}

const TEMPLATE: &str = r#"version: "1.0"
name: my-project

scopes:
  main:
    lexer:
      implementations: [flex, win_flex, lex, reflex]
    parser:
      implementations: [bison, win_bison, byacc, yacc]
      version:
        bison: [">=3.0"]

generate: []
  # - scope: main
  #   family: lexer
  #   input: src/lexer.l
  #   header: lexer.h
  # - scope: main
  #   family: parser
  #   input: src/parser.y
"#;

fn cmd_init(path: &Path) -> Result<(), String> {
    let desc_path = path.join("gentool.yaml");
    if desc_path.exists() {
        return Err(format!("{} already exists", desc_path.display()));
    }
    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    std::fs::write(&desc_path, TEMPLATE)
        .map_err(|e| format!("cannot write {}: {}", desc_path.display(), e))?;

    println!("Created {}", desc_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let desc = parse_and_validate(file)?;
    println!(
        "OK: {} ({} scopes, {} generation entries)",
        desc.name,
        desc.scopes.len(),
        desc.generate.len()
    );
    Ok(())
}

/// Parse and validate a description file, returning errors if invalid.
fn parse_and_validate(file: &Path) -> Result<types::BuildDescription, String> {
    let desc = parser::parse_description_file(file)?;
    let errors = parser::validate_description(&desc);
    if errors.is_empty() {
        return Ok(desc);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(format!("{} validation error(s)", errors.len()))
}

fn cmd_plan(file: &Path) -> Result<(), String> {
    let desc = parse_and_validate(file)?;
    let planned = executor::plan_only(&desc, ToolRegistry::global())?;

    println!("Planning: {} ({} entries)", desc.name, planned.len());
    println!();
    for entry in &planned {
        println!("{} as {}:", entry.label, entry.implementation);
        for output in &entry.outputs.outputs {
            println!("  + {} ({})", output.name, output.kind);
        }
    }
    Ok(())
}

/// One line of `commands --json`.
#[derive(Debug, Serialize)]
struct CommandRecord<'a> {
    entry: &'a str,
    scope: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool: Option<&'a ResolvedTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<&'a OutputSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<&'a CommandDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn records(report: &RunReport) -> Vec<CommandRecord<'_>> {
    report
        .entries
        .iter()
        .map(|e| match &e.outcome {
            Ok(g) => CommandRecord {
                entry: &e.label,
                scope: &e.scope,
                tool: Some(g.tool.as_ref()),
                outputs: Some(&g.outputs),
                command: Some(&g.command),
                error: None,
            },
            Err(err) => CommandRecord {
                entry: &e.label,
                scope: &e.scope,
                tool: None,
                outputs: None,
                command: None,
                error: Some(err.to_string()),
            },
        })
        .collect()
}

fn cmd_commands(file: &Path, json: bool, probe: &dyn ToolProbe) -> Result<(), String> {
    let desc = parse_and_validate(file)?;
    let report = executor::run(&desc, ToolRegistry::global(), probe)?;

    if json {
        let out = serde_json::to_string_pretty(&records(&report))
            .map_err(|e| format!("JSON serialization error: {}", e))?;
        println!("{}", out);
    } else {
        print_report(&report);
    }

    match report.failed() {
        0 => Ok(()),
        n => Err(format!("{} of {} entries failed", n, report.entries.len())),
    }
}

fn print_report(report: &RunReport) {
    for (scope, tool) in &report.found {
        println!("{}: found {} {}", scope, tool.family, tool);
    }
    for entry in &report.entries {
        match &entry.outcome {
            Ok(g) => {
                println!("[{}] {}", g.command.target, g.command.description);
                println!("  $ {}", g.command.argv().join(" "));
                if !g.command.required_headers.is_empty() {
                    println!("  needs: {}", g.command.required_headers.join(", "));
                }
            }
            Err(e) => println!("{}: FAILED: {}", entry.label, e),
        }
    }
}

fn cmd_find(
    family: ToolFamily,
    allow: &[Implementation],
    version: Option<&str>,
    probe: &dyn ToolProbe,
) -> Result<(), String> {
    let tool = find_tool(family, allow, version, probe)?;
    println!("{}: {}", family, tool);
    Ok(())
}

fn find_tool(
    family: ToolFamily,
    allow: &[Implementation],
    version: Option<&str>,
    probe: &dyn ToolProbe,
) -> Result<ResolvedTool, String> {
    let scope = Scope::new("cli");
    let codegen = CodeGen::new(ToolRegistry::global(), probe);
    let tool = codegen
        .find_matching(&scope, family, allow, version.unwrap_or_default())
        .map_err(|e| e.to_string())?;
    Ok(tool.as_ref().clone())
}
