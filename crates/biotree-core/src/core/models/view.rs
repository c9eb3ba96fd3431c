use super::atom::Atom;
use super::hierarchy::Hierarchy;
use super::identity::{AltKey, EntityId, FullId};
use super::ids::NodeKey;
use super::level::Level;
use super::node::{ContainerPayload, DisorderedGroup, Extra, Node, NodeBody};
use crate::core::error::{HierarchyError, Result};
use crate::core::utils::geometry::weighted_centroid;
use nalgebra::Point3;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use tracing::instrument;

/// Borrowed, read-only handle to one entity of a [`Hierarchy`].
///
/// Operations fall in two groups. Those that describe the node itself (id,
/// level, parent, full id, extra data, strict equality and the `disordered_*`
/// accessors) act on the node as stored. Content operations (length, lookup,
/// children, identity comparison, payload access, center of mass) act on the
/// entity the node stands for: a disordered group forwards them to its
/// selected alternative and fails with [`HierarchyError::Unselected`] when
/// nothing has been selected yet.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    hierarchy: &'a Hierarchy,
    key: NodeKey,
    node: &'a Node,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(hierarchy: &'a Hierarchy, key: NodeKey, node: &'a Node) -> Self {
        Self {
            hierarchy,
            key,
            node,
        }
    }

    fn at(&self, key: NodeKey) -> Option<NodeRef<'a>> {
        self.hierarchy
            .raw(key)
            .map(|node| NodeRef::new(self.hierarchy, key, node))
    }

    fn at_all(&self, keys: &[NodeKey]) -> Vec<NodeRef<'a>> {
        keys.iter().filter_map(|&key| self.at(key)).collect()
    }

    /// The arena key this handle was created from.
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// The node's own id; a disordered group shares it with its alternatives.
    pub fn id(&self) -> &'a EntityId {
        &self.node.id
    }

    pub fn level(&self) -> Level {
        self.node.level()
    }

    /// The owning container, or `None` for a root or a detached subtree.
    ///
    /// Alternatives of a disordered group report the group's parent.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node.parent.and_then(|key| self.at(key))
    }

    pub fn is_disordered(&self) -> bool {
        self.node.is_disordered()
    }

    pub fn extra(&self) -> &'a Extra {
        &self.node.extra
    }

    /// Ids from the root down to this node, computed once and cached.
    pub fn full_id(&self) -> &'a FullId {
        self.node.full_id.get_or_init(|| {
            let mut ids = vec![self.node.id.clone()];
            let mut current = self.node.parent;
            while let Some(node) = current.and_then(|key| self.hierarchy.raw(key)) {
                ids.push(node.id.clone());
                current = node.parent;
            }
            ids.reverse();
            FullId::new(ids)
        })
    }

    // --- Forwarding ---

    /// The entity content operations act on: the node itself, or the selected
    /// alternative of a disordered group.
    pub fn resolved(&self) -> Result<NodeRef<'a>> {
        match self.node.group() {
            None => Ok(*self),
            Some(group) => group
                .selected()
                .and_then(|key| self.at(key))
                .ok_or_else(|| HierarchyError::Unselected {
                    level: self.level(),
                    id: self.node.id.clone(),
                }),
        }
    }

    fn child_keys(&self) -> Result<&'a [NodeKey]> {
        let target = self.resolved()?;
        Ok(target
            .node
            .container()
            .map(|container| container.children())
            .unwrap_or(&[]))
    }

    /// Number of direct children, counting a disordered child once.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::Unselected`] on a group without a selection.
    pub fn len(&self) -> Result<usize> {
        Ok(self.child_keys()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.child_keys()?.is_empty())
    }

    /// Checks whether a direct child uses `id`.
    ///
    /// # Arguments
    ///
    /// * `id` - Id of the child, at the level below this one.
    ///
    /// # Return
    ///
    /// `Ok(false)` for an atom, which never has children.
    pub fn has_id(&self, id: &EntityId) -> Result<bool> {
        let target = self.resolved()?;
        Ok(target
            .node
            .container()
            .is_some_and(|container| container.child_key(id).is_some()))
    }

    /// Looks up a direct child by id.
    pub fn get(&self, id: &EntityId) -> Result<NodeRef<'a>> {
        let target = self.resolved()?;
        target
            .node
            .container()
            .and_then(|container| container.child_key(id))
            .and_then(|key| self.at(key))
            .ok_or_else(|| HierarchyError::NotFound { id: id.clone() })
    }

    /// Snapshot of the direct children in insertion order.
    pub fn children(&self) -> Result<Vec<NodeRef<'a>>> {
        Ok(self.at_all(self.child_keys()?))
    }

    /// Direct children with every disordered child replaced by all of its alternatives.
    pub fn unpacked_children(&self) -> Result<Vec<NodeRef<'a>>> {
        let mut unpacked = Vec::new();
        for child in self.children()? {
            if child.is_disordered() {
                unpacked.extend(child.disordered_get_list()?);
            } else {
                unpacked.push(child);
            }
        }
        Ok(unpacked)
    }

    /// All entities at `level` below this one, in depth-first order.
    ///
    /// Disordered entities at the requested level are returned as groups;
    /// above it the walk descends through selected alternatives.
    pub fn descendants(&self, level: Level) -> Result<Vec<NodeRef<'a>>> {
        if level >= self.level() {
            return Err(HierarchyError::LevelMismatch {
                expected: self.level(),
                found: level,
            });
        }
        let mut found = Vec::new();
        let mut stack = vec![*self];
        while let Some(entity) = stack.pop() {
            if entity.level() == level {
                found.push(entity);
                continue;
            }
            let mut children = entity.children()?;
            children.reverse();
            stack.extend(children);
        }
        Ok(found)
    }

    /// The atom payload of an atom node or of a disordered atom's selection.
    pub fn atom(&self) -> Result<&'a Atom> {
        let target = self.resolved()?;
        match &target.node.body {
            NodeBody::Atom(atom) => Ok(atom),
            _ => Err(HierarchyError::LevelMismatch {
                expected: Level::Atom,
                found: self.level(),
            }),
        }
    }

    fn payload(&self) -> Result<&'a ContainerPayload> {
        let target = self.resolved()?;
        match &target.node.body {
            NodeBody::Container(_, payload) => Ok(payload),
            _ => Err(HierarchyError::LevelMismatch {
                expected: Level::Residue,
                found: self.level(),
            }),
        }
    }

    /// Residue name, e.g. "ALA".
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::LevelMismatch`] for anything but a residue.
    pub fn resname(&self) -> Result<&'a str> {
        match self.payload()? {
            ContainerPayload::Residue { resname, .. } => Ok(resname),
            _ => Err(HierarchyError::LevelMismatch {
                expected: Level::Residue,
                found: self.level(),
            }),
        }
    }

    /// Segment identifier of a residue.
    pub fn segid(&self) -> Result<&'a str> {
        match self.payload()? {
            ContainerPayload::Residue { segid, .. } => Ok(segid),
            _ => Err(HierarchyError::LevelMismatch {
                expected: Level::Residue,
                found: self.level(),
            }),
        }
    }

    /// Serial number of a model, which may differ from its id.
    pub fn serial_num(&self) -> Result<usize> {
        match self.payload()? {
            ContainerPayload::Model { serial_num } => Ok(*serial_num),
            _ => Err(HierarchyError::LevelMismatch {
                expected: Level::Model,
                found: self.level(),
            }),
        }
    }

    // --- Identity ---

    /// Path used for identity comparison: the full id without the root's id,
    /// or just the own id when this node is a root.
    pub fn identity_key(&self) -> &'a [EntityId] {
        if self.node.parent.is_some() {
            self.full_id().below_root()
        } else {
            std::slice::from_ref(&self.node.id)
        }
    }

    /// Identity equality, independent of which root holds the subtree.
    ///
    /// Entities of different levels are never equal.
    pub fn identity_eq(&self, other: &NodeRef<'_>) -> Result<bool> {
        let (this, that) = (self.resolved()?, other.resolved()?);
        if this.level() != that.level() {
            return Ok(false);
        }
        Ok(this.identity_key() == that.identity_key())
    }

    /// Identity ordering: lexicographic over [`identity_key`](Self::identity_key).
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::LevelMismatch`] when the levels differ.
    pub fn identity_cmp(&self, other: &NodeRef<'_>) -> Result<Ordering> {
        let (this, that) = (self.resolved()?, other.resolved()?);
        if this.level() != that.level() {
            return Err(HierarchyError::LevelMismatch {
                expected: this.level(),
                found: that.level(),
            });
        }
        Ok(this.identity_key().cmp(that.identity_key()))
    }

    /// Structural equality of two subtrees, possibly from different arenas.
    ///
    /// Plain entities must share level, id, payload and child count, with
    /// children pairwise strictly equal in order. Disordered groups must share
    /// id, selected key and key set, with every alternative strictly equal.
    pub fn strictly_equals(&self, other: &NodeRef<'_>, compare_coordinates: bool) -> bool {
        if self.node.id != other.node.id {
            return false;
        }
        match (&self.node.body, &other.node.body) {
            (NodeBody::Atom(a), NodeBody::Atom(b)) => a.strictly_equals(b, compare_coordinates),
            (NodeBody::Container(a, payload_a), NodeBody::Container(b, payload_b)) => {
                payload_a == payload_b
                    && a.children().len() == b.children().len()
                    && a.children().iter().zip(b.children()).all(|(&left, &right)| {
                        match (self.at(left), other.at(right)) {
                            (Some(left), Some(right)) => {
                                left.strictly_equals(&right, compare_coordinates)
                            }
                            _ => false,
                        }
                    })
            }
            (NodeBody::Disordered(a), NodeBody::Disordered(b)) => {
                a.selected_key() == b.selected_key()
                    && a.alternatives.keys().eq(b.alternatives.keys())
                    && a.alternatives.values().zip(b.alternatives.values()).all(
                        |(&left, &right)| match (self.at(left), other.at(right)) {
                            (Some(left), Some(right)) => {
                                left.strictly_equals(&right, compare_coordinates)
                            }
                            _ => false,
                        },
                    )
            }
            _ => false,
        }
    }

    // --- Aggregation ---

    /// Mass-weighted (or, with `geometric`, unweighted) mean position of all
    /// atoms below this entity.
    ///
    /// The walk is breadth-first and passes through the selected alternative
    /// of every disordered residue or atom, so alternatives are never counted
    /// twice. On an atom the result is that atom's own coordinate.
    ///
    /// # Errors
    ///
    /// - [`HierarchyError::EmptyContainer`] when there are no atoms below.
    /// - [`HierarchyError::Unselected`] when a disordered group on the way has no selection.
    /// - [`HierarchyError::ZeroMass`] when the atom masses sum to zero.
    #[instrument(level = "trace", skip(self), fields(id = %self.node.id))]
    pub fn center_of_mass(&self, geometric: bool) -> Result<Point3<f64>> {
        let start = self.resolved()?;
        if let NodeBody::Atom(atom) = &start.node.body {
            return Ok(atom.coord);
        }
        let empty = || HierarchyError::EmptyContainer {
            level: self.level(),
            id: self.node.id.clone(),
        };
        if start.is_empty()? {
            return Err(empty());
        }

        let mut atoms: Vec<&Atom> = Vec::new();
        let mut frontier = VecDeque::from([start]);
        while let Some(entity) = frontier.pop_front() {
            match &entity.node.body {
                NodeBody::Atom(atom) => atoms.push(atom),
                NodeBody::Container(container, _) => {
                    frontier.extend(entity.at_all(container.children()));
                }
                NodeBody::Disordered(_) => frontier.push_back(entity.resolved()?),
            }
        }
        if atoms.is_empty() {
            return Err(empty());
        }

        let coords: Vec<Point3<f64>> = atoms.iter().map(|atom| atom.coord).collect();
        if geometric {
            return weighted_centroid(&coords, None).ok_or_else(empty);
        }
        let masses: Vec<f64> = atoms.iter().map(|atom| atom.mass).collect();
        weighted_centroid(&coords, Some(&masses)).ok_or_else(|| HierarchyError::ZeroMass {
            level: self.level(),
            id: self.node.id.clone(),
        })
    }

    // --- Disorder ---

    fn disordered_group(&self) -> Result<&'a DisorderedGroup> {
        self.node
            .group()
            .ok_or_else(|| HierarchyError::NotDisordered {
                level: self.level(),
                id: self.node.id.clone(),
            })
    }

    /// Alternative keys in sorted order.
    pub fn disordered_keys(&self) -> Result<Vec<AltKey>> {
        Ok(self.disordered_group()?.alternatives.keys().cloned().collect())
    }

    pub fn disordered_has_id(&self, alt_key: &AltKey) -> Result<bool> {
        Ok(self.disordered_group()?.alternatives.contains_key(alt_key))
    }

    pub fn selected_key(&self) -> Result<Option<&'a AltKey>> {
        Ok(self.disordered_group()?.selected_key())
    }

    /// The alternative under `alt_key`, or the selected one when `None`.
    pub fn disordered_get(&self, alt_key: Option<&AltKey>) -> Result<NodeRef<'a>> {
        let group = self.disordered_group()?;
        match alt_key {
            None => self.resolved(),
            Some(alt_key) => group
                .alternatives
                .get(alt_key)
                .and_then(|&key| self.at(key))
                .ok_or_else(|| HierarchyError::AlternativeNotFound {
                    key: alt_key.clone(),
                }),
        }
    }

    /// Every alternative, ordered by key.
    pub fn disordered_get_list(&self) -> Result<Vec<NodeRef<'a>>> {
        let group = self.disordered_group()?;
        let keys: Vec<NodeKey> = group.alternatives.values().copied().collect();
        Ok(self.at_all(&keys))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", &self.key)
            .field("level", &self.level())
            .field("id", &self.node.id)
            .field("disordered", &self.is_disordered())
            .finish()
    }
}
