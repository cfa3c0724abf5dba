//! Maven repository protocol: the repository client seam used by the
//! resolver, POM and `maven-metadata.xml` parsing, HTTP and `file:`
//! transport, and checksum signatures.

pub mod checksum;
pub mod client;
pub mod download;
pub mod memory;
pub mod metadata;
pub mod pom;
pub mod repository;
