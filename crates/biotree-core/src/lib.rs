//! # biotree Core Library
//!
//! In-memory containers for biomolecular structures, organised as the classic
//! five-level hierarchy: structure → model → chain → residue → atom.
//!
//! ## Architectural Philosophy
//!
//! - **Arena ownership.** Every entity lives in a single [`Hierarchy`](core::models::hierarchy::Hierarchy)
//!   arena and is addressed by a stable [`NodeKey`](core::models::ids::NodeKey). Parents own their
//!   children through the arena; children refer back to their parent through a plain key, so there
//!   are no reference cycles.
//!
//! - **Explicit disorder.** Alternate conformations of a residue and alternate locations of an atom
//!   are grouped behind a disordered node. Read operations on such a node are forwarded to the
//!   currently selected alternative; mutations that must keep every alternative consistent (parent
//!   links, renames, rigid-body motion) reach all of them.
//!
//! - **Cached identity.** The full path of ids from the root to a node is cached per node and
//!   invalidated explicitly whenever an id changes or a subtree is attached or detached.

pub mod core;
