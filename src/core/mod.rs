//! Core generator logic: versions, registry, resolution, planning, command building.

pub mod codegen;
pub mod error;
pub mod executor;
pub mod generator;
pub mod parser;
pub mod planner;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod version;
