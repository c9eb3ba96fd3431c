//! Reading and writing structure descriptions.
//!
//! - [`description`] - The serde schema of the TOML structure format
//! - [`loader`] - Builds a [`Hierarchy`](biotree::core::models::hierarchy::Hierarchy) from a description and resolves disorder
//! - [`writer`] - Flattens a hierarchy back into a description

pub mod description;
pub mod loader;
pub mod writer;
