//! Gentool: lexer and parser generator invocation.
//!
//! Finds a suitable lex/flex/reflex or yacc/byacc/bison binary per scope,
//! plans deterministic output names, and describes the command to run.
//! Nothing is executed except `--version` probes.

pub mod cli;
pub mod core;
pub mod transport;
pub mod util;

pub use crate::core::error::{GenerateError, PlanError, ResolveError, VersionSyntaxError};
pub use crate::core::generator::{CodeGen, Generated};
pub use crate::core::registry::ToolRegistry;
pub use crate::core::resolver::{Scope, ToolResolver};
pub use crate::core::types::{
    CommandDescription, GenerationRequest, Implementation, OutputSet, ResolveRequest,
    ResolvedTool, SourceRef, ToolFamily,
};
pub use crate::core::version::{satisfies, Version, VersionSpec};
pub use crate::transport::{SystemProbe, ToolProbe};
