//! Build description parsing and validation.
//!
//! Parses gentool.yaml and validates structural constraints:
//! - Version must be "1.0"
//! - Generation scopes must be declared
//! - Implementation names must belong to the section's family
//! - Version constraints must parse
//! - Table outputs only for lexers, locations only for parsers

use super::error::VersionSyntaxError;
use super::types::*;
use super::version::VersionSpec;
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a gentool.yaml file from disk.
pub fn parse_description_file(path: &Path) -> Result<BuildDescription, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_description(&content)
}

/// Parse a gentool.yaml from a string.
pub fn parse_description(yaml: &str) -> Result<BuildDescription, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Validate a parsed description. Returns a list of errors (empty = valid).
pub fn validate_description(desc: &BuildDescription) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut error = |message: String| errors.push(ValidationError { message });

    if desc.version != "1.0" {
        error(format!("version must be \"1.0\", got \"{}\"", desc.version));
    }
    if desc.name.is_empty() {
        error("name must not be empty".to_string());
    }

    for (scope_name, scope) in &desc.scopes {
        for family in [ToolFamily::Lexer, ToolFamily::Parser] {
            let Some(pref) = scope.preference(family) else {
                continue;
            };
            let named = pref.implementations.iter().chain(pref.version.keys());
            for implementation in named {
                if implementation.family() != family {
                    error(format!(
                        "scope '{}': {} is not a {} implementation",
                        scope_name, implementation, family
                    ));
                }
            }
            for (implementation, constraints) in &pref.version {
                if let Err(e) = VersionSpec::from_constraints(constraints) {
                    error(format!(
                        "scope '{}': {} version: {}",
                        scope_name, implementation, e
                    ));
                }
            }
        }
    }

    for (i, entry) in desc.generate.iter().enumerate() {
        let label = entry_label(i, entry);
        if !desc.scopes.contains_key(&entry.scope) {
            error(format!("{} uses unknown scope '{}'", label, entry.scope));
        }
        if entry.input.file_name().is_none() {
            error(format!("{} has no input file", label));
        }
        if entry.family == ToolFamily::Parser && entry.table.is_some() {
            error(format!("{}: parsers have no table output", label));
        }
        if entry.family == ToolFamily::Lexer && entry.locations.is_some() {
            error(format!("{}: lexers have no locations output", label));
        }
        if let Err(e) = VersionSpec::from_constraints(&entry.version) {
            error(format!("{} version: {}", label, e));
        }
    }

    errors
}

/// `generate[2] (parser p.y)` style label for messages.
pub fn entry_label(index: usize, entry: &GenerateEntry) -> String {
    format!(
        "generate[{}] ({} {})",
        index,
        entry.family,
        entry.input.file_name().unwrap_or("?")
    )
}

/// Scope preferences for a family as a resolve request.
pub fn preference_request(pref: Option<&ToolPreference>) -> Result<ResolveRequest, VersionSyntaxError> {
    let mut request = ResolveRequest::default();
    let Some(pref) = pref else {
        return Ok(request);
    };
    if !pref.implementations.is_empty() {
        request.allowed = Some(pref.implementations.clone());
    }
    for (implementation, constraints) in &pref.version {
        request
            .versions
            .insert(*implementation, VersionSpec::from_constraints(constraints)?);
    }
    Ok(request)
}

/// A description entry as a generation request.
pub fn generation_request(entry: &GenerateEntry) -> Result<GenerationRequest, VersionSyntaxError> {
    Ok(GenerationRequest {
        input: entry.input.clone(),
        options: OutputOptions {
            source: entry.source.clone(),
            header: entry.header.clone(),
            table: entry.table.clone(),
            locations: entry.locations.clone(),
            plain_name: entry.plainname,
        },
        args: entry.args.clone(),
        version: VersionSpec::from_constraints(&entry.version)?,
    })
}
