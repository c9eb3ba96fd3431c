//! # Core Module
//!
//! The foundation of the library: hierarchy data models, the error type shared by
//! every operation, and small numeric utilities.
//!
//! - **Hierarchy Models** ([`models`]) - Arena, node payloads, identifiers and read-only views
//! - **Errors** ([`error`]) - The [`HierarchyError`](error::HierarchyError) enum
//! - **Utilities** ([`utils`]) - Element masses and coordinate geometry

pub mod error;
pub mod models;
pub mod utils;
