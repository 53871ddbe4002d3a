//! Output planning: deterministic output names and order per family.
//!
//! Lexer: [source, header?, table?]. Parser: [source, header, locations?].
//! Callers index the result positionally, so the order is fixed.

use super::error::PlanError;
use super::types::*;

/// Compute the ordered outputs for one generation.
pub fn plan(
    family: ToolFamily,
    implementation: Implementation,
    input: &SourceRef,
    options: &OutputOptions,
) -> Result<OutputSet, PlanError> {
    if implementation.family() != family {
        return Err(PlanError::FamilyMismatch {
            implementation,
            family,
        });
    }

    let file_name = input.file_name().ok_or(PlanError::NoFileName)?;
    let base = base_name(file_name, options.plain_name);
    let is_cpp = extension(file_name) == Some(family.cpp_input_extension());

    let mut outputs = Vec::with_capacity(3);
    let source = options
        .source
        .clone()
        .unwrap_or_else(|| format!("{}.{}", base, if is_cpp { "cpp" } else { "c" }));
    outputs.push(PlannedOutput {
        kind: OutputKind::Source,
        name: source,
    });

    match family {
        ToolFamily::Lexer => {
            if options.locations.is_some() {
                return Err(PlanError::UnsupportedOutput {
                    family,
                    kind: OutputKind::Locations,
                });
            }
            push_given(&mut outputs, OutputKind::Header, &options.header);
            push_given(&mut outputs, OutputKind::Table, &options.table);
        }
        ToolFamily::Parser => {
            if options.table.is_some() {
                return Err(PlanError::UnsupportedOutput {
                    family,
                    kind: OutputKind::Table,
                });
            }
            let header = options
                .header
                .clone()
                .unwrap_or_else(|| format!("{}.{}", base, if is_cpp { "hpp" } else { "h" }));
            outputs.push(PlannedOutput {
                kind: OutputKind::Header,
                name: header,
            });
            push_given(&mut outputs, OutputKind::Locations, &options.locations);
        }
    }

    Ok(OutputSet {
        family,
        base,
        is_cpp,
        outputs,
    })
}

fn push_given(outputs: &mut Vec<PlannedOutput>, kind: OutputKind, name: &Option<String>) {
    if let Some(name) = name {
        outputs.push(PlannedOutput {
            kind,
            name: name.clone(),
        });
    }
}

/// Plain name keeps the whole file name; otherwise only the last suffix goes.
pub fn base_name(file_name: &str, plain_name: bool) -> String {
    if plain_name {
        return file_name.to_string();
    }
    match file_name.rfind('.') {
        Some(0) | None => file_name.to_string(),
        Some(dot) => file_name[..dot].to_string(),
    }
}

fn extension(file_name: &str) -> Option<&str> {
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some(&file_name[dot + 1..]),
    }
}
