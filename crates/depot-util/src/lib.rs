//! Shared utilities for depot.
//!
//! This crate provides cross-cutting concerns used by all other depot crates:
//! the unified error type, the wildcard matcher behind rule predicates, and
//! Cargo-style status output for the CLI.

pub mod errors;
pub mod glob;
pub mod progress;
