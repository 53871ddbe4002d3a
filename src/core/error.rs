//! Error taxonomy for detection, version syntax, resolution and planning.

use super::types::{Implementation, OutputKind, ResolvedTool, ToolFamily};
use super::version::{Version, VersionSpec};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A constraint or version string that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version syntax '{input}': {reason}")]
pub struct VersionSyntaxError {
    pub input: String,
    pub reason: String,
}

impl VersionSyntaxError {
    pub fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Why a candidate binary could not be used. Recovered by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("{executable} not found")]
    NotFound { executable: String },

    #[error("failed to run {}: {message}", .path.display())]
    Spawn { path: PathBuf, message: String },

    #[error("{} --version exited with {code}", .path.display())]
    NonZeroExit { path: PathBuf, code: i32 },

    #[error("no version number in output of {}", .path.display())]
    UnparsableVersion { path: PathBuf },

    #[error("{} is not a compatible implementation: {reason}", .path.display())]
    Incompatible { path: PathBuf, reason: String },
}

/// Why one candidate was passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotFound,
    VersionMismatch { found: Version, wanted: VersionSpec },
    Detection(DetectionError),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::VersionMismatch { found, wanted } => {
                write!(f, "version {} does not satisfy {}", found, wanted)
            }
            Self::Detection(e) => write!(f, "detection failed: {}", e),
        }
    }
}

/// One entry in the resolver's attempt log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub implementation: Implementation,
    pub rejection: Rejection,
}

/// Render an attempt log as `flex: not found; bison: version ...`.
pub fn format_attempts(attempts: &[Attempt]) -> String {
    if attempts.is_empty() {
        return "no candidates were allowed".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.implementation, a.rejection))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    InvalidVersionSyntax(#[from] VersionSyntaxError),

    #[error("no suitable {family} found for scope '{scope}' ({})", format_attempts(.attempts))]
    NoSuitableTool {
        scope: String,
        family: ToolFamily,
        attempts: Vec<Attempt>,
    },

    #[error("{family} for scope '{scope}' already resolved to {existing}: {reason}")]
    AlreadyResolved {
        scope: String,
        family: ToolFamily,
        existing: Box<ResolvedTool>,
        reason: String,
    },

    #[error("{implementation} is not a {family} implementation")]
    WrongFamily {
        implementation: Implementation,
        family: ToolFamily,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("input has no file name")]
    NoFileName,

    #[error("{implementation} cannot generate {family} outputs")]
    FamilyMismatch {
        implementation: Implementation,
        family: ToolFamily,
    },

    #[error("{family} generators have no {kind} output")]
    UnsupportedOutput { family: ToolFamily, kind: OutputKind },
}

/// Errors from the `lex` / `yacc` entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}
