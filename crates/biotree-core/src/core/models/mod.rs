//! # Hierarchy Models Module
//!
//! Data structures that represent a biomolecular structure as a tree of entities.
//!
//! ## Key Components
//!
//! - [`hierarchy`] - The [`Hierarchy`](hierarchy::Hierarchy) arena owning every entity and all mutations
//! - [`view`] - [`NodeRef`](view::NodeRef), a borrowed read-only handle with lookup, equality and aggregation
//! - [`node`] - Arena node layout: container, disordered group and atom bodies
//! - [`atom`] - The leaf payload carrying coordinates and physical properties
//! - [`identity`] - Level-specific identifiers and the cached full path
//! - [`level`] - The fixed five-level taxonomy
//! - [`ids`] - Arena key type
//!
//! ## Usage
//!
//! ```ignore
//! use biotree::core::models::{atom::Atom, hierarchy::Hierarchy, identity::ResidueId};
//! use nalgebra::Point3;
//!
//! let mut hierarchy = Hierarchy::new();
//! let structure = hierarchy.create_structure("1abc");
//! let model = hierarchy.create_model(0);
//! let chain = hierarchy.create_chain('A');
//! let residue = hierarchy.create_residue(ResidueId::standard(10, 'A'), "ALA", "");
//! let atom = hierarchy.create_atom(Atom::new("CA", Point3::origin(), "C"));
//!
//! hierarchy.add(residue, atom)?;
//! hierarchy.add(chain, residue)?;
//! hierarchy.add(model, chain)?;
//! hierarchy.add(structure, model)?;
//!
//! let full_id = hierarchy.node(residue)?.full_id();
//! let center = hierarchy.node(chain)?.center_of_mass(false)?;
//! ```

pub mod atom;
pub mod hierarchy;
pub mod identity;
pub mod ids;
pub mod level;
pub mod node;
pub mod view;
