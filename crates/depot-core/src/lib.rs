//! Core data types for depot: module coordinates, version ordering,
//! repository descriptors, resolution rules, and request files.

pub mod config;
pub mod descriptor;
pub mod module;
pub mod rule;
pub mod version;
