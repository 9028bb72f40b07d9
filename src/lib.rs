//! Loreweave
//!
//! A schema-driven compiler for narrative worldbuilding vaults: a
//! directory of loosely-structured markdown documents plus a declarative,
//! inheritable schema become a typed, validated entity graph of lore
//! content (characters, locations, factions, ...).
//!
//! ## Pipeline
//!
//! ```text
//! schema.json --resolve--> LoreSchema (immutable)
//!                              |
//! *.md --read--> blocks --parse--> per-file nodes/collections   (parallel)
//!                              |
//!                  merge same-identity nodes (composites)
//!                              |
//!                  resolve reference attributes
//!                              |
//!                  validate against the schema -> report
//! ```
//!
//! Document parsing fans out over a bounded worker pool against the
//! read-only schema; merge, reference resolution and validation run
//! single-threaded on the closed graph.

pub mod config;
pub mod doc;
pub mod error;
pub mod loader;
pub mod merge;
pub mod model;
pub mod refs;
pub mod schema;
pub mod validate;

pub use config::VaultConfig;
pub use error::{IssueKind, ParseIssue, SchemaError, SchemaResult};
pub use loader::{VaultLoadResult, VaultLoader};
pub use model::{Attribute, Collection, Node, Section};
pub use schema::{LoreSchema, RawSchema};
pub use validate::{ValidationReport, ValidationState};
