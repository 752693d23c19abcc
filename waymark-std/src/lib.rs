//! # waymark-std
//!
//! Standard implementations for the Waymark routing table.
//!
//! This crate provides:
//! - **Aggregation**: [`composite::CompositeEndpointDataSource`]
//! - **Sources**: static, dynamic and (feature `inventory`) link-time collected
//! - **Caching**: [`cache::DataSourceDependentCache`]
//! - **Matching**: [`matching::Matcher`] with constraints and candidate policies
//! - **Link generation**: [`generation::LinkGenerator`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use waymark_core;

// Modules
pub mod cache;
pub mod composite;
pub mod generation;
pub mod matching;
pub mod sources;
pub mod testing;

#[cfg(feature = "inventory")]
pub use inventory;
