//! Executor: drives a build description through the generator.
//!
//! validate → scopes → explicit finds → for each entry: resolve → plan → build

use super::error::GenerateError;
use super::generator::{CodeGen, Generated};
use super::parser::{self, entry_label};
use super::planner;
use super::registry::ToolRegistry;
use super::resolver::Scope;
use super::types::*;
use crate::transport::ToolProbe;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one generation entry.
#[derive(Debug)]
pub struct EntryResult {
    pub index: usize,
    pub label: String,
    pub scope: String,
    pub outcome: Result<Generated, GenerateError>,
}

/// Resolved tools and per-entry outcomes of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Tools picked by explicit finds, as (scope, tool)
    pub found: Vec<(String, Arc<ResolvedTool>)>,
    pub entries: Vec<EntryResult>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_err()).count()
    }
}

/// Planned outputs for one entry, without tool detection.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    pub index: usize,
    pub label: String,
    pub implementation: Implementation,
    pub outputs: OutputSet,
}

/// One `Scope` per declared scope, in declaration order.
pub fn build_scopes(desc: &BuildDescription) -> IndexMap<String, Scope> {
    desc.scopes
        .keys()
        .map(|name| (name.clone(), Scope::new(name)))
        .collect()
}

/// Run every generation entry. Entry failures are collected; invalid
/// descriptions and failed explicit finds abort the run.
pub fn run(
    desc: &BuildDescription,
    registry: &ToolRegistry,
    probe: &dyn ToolProbe,
) -> Result<RunReport, String> {
    let errors = parser::validate_description(desc);
    if let Some(first) = errors.first() {
        return Err(format!(
            "{} validation error(s), first: {}",
            errors.len(),
            first
        ));
    }

    let codegen = CodeGen::new(registry, probe);
    let scopes = build_scopes(desc);
    let mut report = RunReport::default();

    info!(name = %desc.name, entries = desc.generate.len(), "running build description");

    for (name, config) in &desc.scopes {
        let Some(scope) = scopes.get(name) else {
            continue;
        };
        for family in [ToolFamily::Lexer, ToolFamily::Parser] {
            let Some(pref) = config.preference(family).filter(|p| p.explicit) else {
                continue;
            };
            let request = parser::preference_request(Some(pref)).map_err(|e| e.to_string())?;
            let tool = codegen
                .find(scope, family, &request)
                .map_err(|e| e.to_string())?;
            report.found.push((name.clone(), tool));
        }
    }

    for (index, entry) in desc.generate.iter().enumerate() {
        let label = entry_label(index, entry);
        let scope = scopes
            .get(&entry.scope)
            .ok_or_else(|| format!("{} uses unknown scope '{}'", label, entry.scope))?;
        let preferences = desc
            .scopes
            .get(&entry.scope)
            .and_then(|c| c.preference(entry.family));
        let preferences = parser::preference_request(preferences).map_err(|e| e.to_string())?;
        let request = parser::generation_request(entry).map_err(|e| e.to_string())?;

        let outcome = codegen.generate_with(scope, entry.family, &request, &preferences);
        if let Err(e) = &outcome {
            warn!(entry = %label, error = %e, "generation failed");
        }
        report.entries.push(EntryResult {
            index,
            label,
            scope: entry.scope.clone(),
            outcome,
        });
    }

    Ok(report)
}

/// Plan outputs for every entry using the first allowed implementation
/// of the family. No executables are probed.
pub fn plan_only(
    desc: &BuildDescription,
    registry: &ToolRegistry,
) -> Result<Vec<PlannedEntry>, String> {
    let mut planned = Vec::with_capacity(desc.generate.len());
    for (index, entry) in desc.generate.iter().enumerate() {
        let label = entry_label(index, entry);
        let implementation = nominal_implementation(desc, entry, registry)
            .ok_or_else(|| format!("{}: no {} implementation allowed", label, entry.family))?;
        let request = parser::generation_request(entry).map_err(|e| format!("{}: {}", label, e))?;
        let outputs = planner::plan(entry.family, implementation, &request.input, &request.options)
            .map_err(|e| format!("{}: {}", label, e))?;
        planned.push(PlannedEntry {
            index,
            label,
            implementation,
            outputs,
        });
    }
    Ok(planned)
}

fn nominal_implementation(
    desc: &BuildDescription,
    entry: &GenerateEntry,
    registry: &ToolRegistry,
) -> Option<Implementation> {
    let allowed = desc
        .scopes
        .get(&entry.scope)
        .and_then(|c| c.preference(entry.family))
        .map(|p| p.implementations.as_slice())
        .unwrap_or_default();
    registry
        .implementations_for(entry.family)
        .iter()
        .copied()
        .find(|i| allowed.is_empty() || allowed.contains(i))
}
