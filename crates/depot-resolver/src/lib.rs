//! Dependency resolution engine: rule application, version selection,
//! highest-wins conflict resolution, cycle detection, and a single-flight
//! descriptor cache shared by concurrent branches.

pub mod cache;
pub mod conflict;
pub mod module;
pub mod resolver;
pub mod rules;

pub use module::{Module, ModuleError, ModuleState};
pub use resolver::{CancellationHandle, ResolutionResult, Resolver};
