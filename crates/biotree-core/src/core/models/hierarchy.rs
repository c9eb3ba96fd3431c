use super::atom::Atom;
use super::identity::{AltKey, EntityId, ResidueId};
use super::ids::NodeKey;
use super::level::Level;
use super::node::{Container, ContainerPayload, DisorderedGroup, Extra, Node, NodeBody};
use super::view::NodeRef;
use crate::core::error::{HierarchyError, Result};
use crate::core::utils::geometry::apply_rigid_transform;
use nalgebra::{Matrix3, Vector3};
use slotmap::SlotMap;
use tracing::{debug, instrument, trace, warn};

/// Arena owning every entity of one or more structure hierarchies.
///
/// Nodes are created detached, then linked top-down with [`add`](Self::add) or
/// [`insert`](Self::insert). A parent owns its children; a child refers back to
/// its parent by key only. Detached subtrees stay in the arena until
/// [`prune`](Self::prune) frees them.
///
/// Read access goes through [`NodeRef`], obtained from [`node`](Self::node).
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: SlotMap<NodeKey, Node>,
}

impl Hierarchy {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Checks whether `key` still refers to a live node.
    ///
    /// # Arguments
    ///
    /// * `key` - A key previously returned by one of the `create_*` methods.
    ///
    /// # Return
    ///
    /// `false` once the node has been freed by [`prune`](Self::prune).
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Borrows a read-only view of a node.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::StaleKey`] if the node was pruned.
    pub fn node(&self, key: NodeKey) -> Result<NodeRef<'_>> {
        let node = self.entry(key)?;
        Ok(NodeRef::new(self, key, node))
    }

    pub(crate) fn raw(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    fn entry(&self, key: NodeKey) -> Result<&Node> {
        self.nodes.get(key).ok_or(HierarchyError::StaleKey)
    }

    fn entry_mut(&mut self, key: NodeKey) -> Result<&mut Node> {
        self.nodes.get_mut(key).ok_or(HierarchyError::StaleKey)
    }

    // --- Construction ---

    /// Creates a detached structure root.
    ///
    /// # Arguments
    ///
    /// * `id` - The structure's accession, e.g. a PDB code.
    ///
    /// # Return
    ///
    /// The key of the new node.
    pub fn create_structure(&mut self, id: &str) -> NodeKey {
        self.insert_container(EntityId::structure(id), ContainerPayload::Structure)
    }

    /// Creates a model whose serial number defaults to its id.
    pub fn create_model(&mut self, id: usize) -> NodeKey {
        self.create_model_with_serial(id, id)
    }

    /// Creates a model whose serial number differs from its id.
    pub fn create_model_with_serial(&mut self, id: usize, serial_num: usize) -> NodeKey {
        self.insert_container(EntityId::Model(id), ContainerPayload::Model { serial_num })
    }

    /// Creates a detached, empty chain.
    ///
    /// # Arguments
    ///
    /// * `id` - The one-character chain identifier.
    ///
    /// # Return
    ///
    /// The key of the new node.
    pub fn create_chain(&mut self, id: char) -> NodeKey {
        self.insert_container(EntityId::Chain(id), ContainerPayload::Chain)
    }

    /// Creates a detached, empty residue.
    ///
    /// # Arguments
    ///
    /// * `id` - Hetero flag, sequence number and insertion code.
    /// * `resname` - Residue name such as "ALA"; it keys the residue inside a point-mutation group.
    /// * `segid` - Segment identifier, usually empty.
    pub fn create_residue(&mut self, id: ResidueId, resname: &str, segid: &str) -> NodeKey {
        self.insert_container(
            EntityId::Residue(id),
            ContainerPayload::Residue {
                resname: resname.to_string(),
                segid: segid.to_string(),
            },
        )
    }

    /// Wraps `atom` in a detached node whose id is the atom's trimmed name.
    pub fn create_atom(&mut self, atom: Atom) -> NodeKey {
        let id = EntityId::Atom(atom.name.clone());
        self.nodes.insert(Node::new(id, NodeBody::Atom(atom)))
    }

    /// Creates an empty, unselected group for point mutations of one residue.
    pub fn create_disordered_residue(&mut self, id: ResidueId) -> NodeKey {
        self.nodes.insert(Node::new(
            EntityId::Residue(id),
            NodeBody::Disordered(DisorderedGroup::default()),
        ))
    }

    /// Creates an empty, unselected group for alternate locations of one atom.
    pub fn create_disordered_atom(&mut self, name: &str) -> NodeKey {
        self.nodes.insert(Node::new(
            EntityId::atom(name.trim()),
            NodeBody::Disordered(DisorderedGroup::default()),
        ))
    }

    fn insert_container(&mut self, id: EntityId, payload: ContainerPayload) -> NodeKey {
        self.nodes.insert(Node::new(
            id,
            NodeBody::Container(Container::default(), payload),
        ))
    }

    // --- Topology ---

    /// Appends `child` to the children of `parent`.
    ///
    /// A disordered `parent` forwards to its selected alternative.
    ///
    /// # Errors
    ///
    /// - [`HierarchyError::DuplicateId`] if a sibling already uses the child's id.
    /// - [`HierarchyError::AlreadyAttached`] if the child still has a parent or group.
    /// - [`HierarchyError::LevelMismatch`] if the child does not belong under `parent`.
    ///
    /// Nothing is modified when an error is returned.
    pub fn add(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let target = self.resolve(parent)?;
        let position = self
            .entry(target)?
            .container()
            .map_or(0, |container| container.children.len());
        self.link(target, position, child)
    }

    /// Inserts `child` at `position` among the children of `parent`.
    ///
    /// Same checks as [`add`](Self::add); `position` may equal the current
    /// number of children to append.
    pub fn insert(&mut self, parent: NodeKey, position: usize, child: NodeKey) -> Result<()> {
        let target = self.resolve(parent)?;
        self.link(target, position, child)
    }

    fn link(&mut self, parent: NodeKey, position: usize, child: NodeKey) -> Result<()> {
        let child_node = self.entry(child)?;
        let child_id = child_node.id.clone();
        if child_node.parent.is_some() || child_node.group.is_some() {
            return Err(HierarchyError::AlreadyAttached {
                level: child_id.level(),
                id: child_id,
            });
        }

        let parent_node = self.entry(parent)?;
        let parent_level = parent_node.level();
        if parent_level.child_level() != Some(child_id.level()) {
            return Err(HierarchyError::LevelMismatch {
                expected: child_id.level().parent_level().unwrap_or(Level::Structure),
                found: parent_level,
            });
        }
        let container = parent_node
            .container()
            .ok_or(HierarchyError::LevelMismatch {
                expected: parent_level,
                found: child_id.level(),
            })?;
        if container.child_index.contains_key(&child_id) {
            return Err(HierarchyError::DuplicateId { id: child_id });
        }
        if position > container.children.len() {
            return Err(HierarchyError::InvalidPosition {
                position,
                len: container.children.len(),
            });
        }

        let container = self
            .entry_mut(parent)?
            .container_mut()
            .ok_or(HierarchyError::StaleKey)?;
        container.children.insert(position, child);
        container.child_index.insert(child_id.clone(), child);
        self.assign_parent(child, Some(parent));

        trace!(child = %child_id, position, "Attached child to {} parent", parent_level);
        Ok(())
    }

    /// Detaches the child with `id` from `parent` and returns its key.
    ///
    /// The detached subtree keeps its own children and stays in the arena.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::NotFound`] if no child has that id.
    pub fn remove(&mut self, parent: NodeKey, id: &EntityId) -> Result<NodeKey> {
        let target = self.resolve(parent)?;
        let child = self
            .entry(target)?
            .container()
            .and_then(|container| container.child_key(id))
            .ok_or_else(|| HierarchyError::NotFound { id: id.clone() })?;
        self.unlink(target, child)?;
        debug!(child = %id, "Detached child");
        Ok(child)
    }

    /// Detaches `child` from whatever container currently holds it.
    ///
    /// A no-op for a root. Alternatives of a disordered group must be released
    /// with [`disordered_remove`](Self::disordered_remove) instead.
    pub fn detach_parent(&mut self, child: NodeKey) -> Result<()> {
        let node = self.entry(child)?;
        if node.group.is_some() {
            return Err(HierarchyError::AlreadyAttached {
                level: node.level(),
                id: node.id.clone(),
            });
        }
        let parent = node.parent;
        match parent {
            Some(parent) => self.unlink(parent, child),
            None => Ok(()),
        }
    }

    fn unlink(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let child_id = self.entry(child)?.id.clone();
        let container = self
            .entry_mut(parent)?
            .container_mut()
            .ok_or(HierarchyError::StaleKey)?;
        container.children.retain(|&key| key != child);
        // A colliding rename may have re-pointed the id at a sibling.
        if container.child_index.get(&child_id) == Some(&child) {
            container.child_index.remove(&child_id);
        }
        self.assign_parent(child, None);
        Ok(())
    }

    /// Sets the parent link of `key` and of every alternative it groups.
    fn assign_parent(&mut self, key: NodeKey, parent: Option<NodeKey>) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        node.parent = parent;
        let alternatives: Vec<NodeKey> = match &node.body {
            NodeBody::Disordered(group) => group.alternatives.values().copied().collect(),
            _ => Vec::new(),
        };
        for alternative in alternatives {
            if let Some(alt) = self.nodes.get_mut(alternative) {
                alt.parent = parent;
            }
        }
        self.invalidate_subtree(key);
    }

    /// Clears the cached full id of `key` and of everything below it.
    fn invalidate_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                node.invalidate_full_id();
                stack.extend(node.owned_keys());
            }
        }
    }

    /// Renames an entity.
    ///
    /// The parent's index is re-keyed. If another sibling already uses
    /// `new_id` a warning is logged and the rename proceeds; the index entry
    /// then points at the renamed node. Renaming a disordered group renames
    /// all of its alternatives.
    ///
    /// # Errors
    ///
    /// - [`HierarchyError::InvalidId`] if `new_id` belongs to another level.
    /// - [`HierarchyError::AlreadyAttached`] for an alternative of a group.
    pub fn set_id(&mut self, key: NodeKey, new_id: EntityId) -> Result<()> {
        let node = self.entry(key)?;
        if new_id.level() != node.level() {
            return Err(HierarchyError::InvalidId {
                level: node.level(),
                id: new_id,
            });
        }
        if node.group.is_some() {
            return Err(HierarchyError::AlreadyAttached {
                level: node.level(),
                id: node.id.clone(),
            });
        }
        if node.id == new_id {
            return Ok(());
        }

        let old_id = node.id.clone();
        let parent = node.parent;
        let alternatives: Vec<NodeKey> = node.group().map_or_else(Vec::new, |group| {
            group.alternatives.values().copied().collect()
        });

        if let Some(parent) = parent {
            let container = self
                .entry_mut(parent)?
                .container_mut()
                .ok_or(HierarchyError::StaleKey)?;
            if container.child_index.contains_key(&new_id) {
                warn!(
                    "The id {} is already used for a sibling of this entity. Changing id from {} to {} might create access inconsistencies to children of the parent entity.",
                    new_id, old_id, new_id
                );
            }
            if container.child_index.get(&old_id) == Some(&key) {
                container.child_index.remove(&old_id);
            }
            container.child_index.insert(new_id.clone(), key);
        }

        for renamed in std::iter::once(key).chain(alternatives) {
            if let Some(node) = self.nodes.get_mut(renamed) {
                node.id = new_id.clone();
                if let NodeBody::Atom(atom) = &mut node.body {
                    if let EntityId::Atom(name) = &new_id {
                        atom.name = name.clone();
                        atom.fullname = name.clone();
                    }
                }
            }
        }
        self.invalidate_subtree(key);
        debug!(from = %old_id, to = %new_id, "Renamed entity");
        Ok(())
    }

    // --- Payload access ---

    /// Mutable access to an atom's properties.
    ///
    /// A disordered atom forwards to its selected location. Use
    /// [`set_id`](Self::set_id) rather than this to rename an atom.
    pub fn atom_mut(&mut self, key: NodeKey) -> Result<&mut Atom> {
        let target = self.resolve(key)?;
        let node = self.entry_mut(target)?;
        let level = node.level();
        match &mut node.body {
            NodeBody::Atom(atom) => Ok(atom),
            _ => Err(HierarchyError::LevelMismatch {
                expected: Level::Atom,
                found: level,
            }),
        }
    }

    /// Mutable access to the free-form annotations of a node.
    ///
    /// Unlike [`atom_mut`](Self::atom_mut) this does not forward through a
    /// disordered group: the group carries its own annotations.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::StaleKey`] if the node was pruned.
    pub fn extra_mut(&mut self, key: NodeKey) -> Result<&mut Extra> {
        Ok(&mut self.entry_mut(key)?.extra)
    }

    // --- Geometry ---

    /// Applies `p * rotation + translation` to every atom below `key`.
    ///
    /// All alternatives of disordered groups are moved, not only the selected
    /// one.
    pub fn transform(
        &mut self,
        key: NodeKey,
        rotation: &Matrix3<f64>,
        translation: &Vector3<f64>,
    ) -> Result<()> {
        self.entry(key)?;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get_mut(current) else {
                continue;
            };
            if let NodeBody::Atom(atom) = &mut node.body {
                atom.coord = apply_rigid_transform(&atom.coord, rotation, translation);
            }
            stack.extend(node.owned_keys());
        }
        Ok(())
    }

    // --- Copy and cleanup ---

    /// Deep-copies the subtree at `key` into new, detached nodes.
    ///
    /// Children are re-added in order, so ids and ordering are preserved.
    /// A disordered group keeps its selected key. If any child cannot be
    /// re-added (siblings sharing an id after a colliding rename), the nodes
    /// created so far are freed and the arena is left as it was.
    #[instrument(level = "trace", skip(self))]
    pub fn copy(&mut self, key: NodeKey) -> Result<NodeKey> {
        let mut created = Vec::new();
        match self.copy_subtree(key, &mut created) {
            Ok(copy) => Ok(copy),
            Err(e) => {
                for orphan in &created {
                    self.nodes.remove(*orphan);
                }
                debug!(discarded = created.len(), "Copy failed: {}", e);
                Err(e)
            }
        }
    }

    fn copy_subtree(&mut self, key: NodeKey, created: &mut Vec<NodeKey>) -> Result<NodeKey> {
        let node = self.entry(key)?;
        let (body, children) = match &node.body {
            NodeBody::Container(container, payload) => (
                NodeBody::Container(Container::default(), payload.clone()),
                container.children.clone(),
            ),
            NodeBody::Atom(atom) => (NodeBody::Atom(atom.clone()), Vec::new()),
            NodeBody::Disordered(_) => {
                (NodeBody::Disordered(DisorderedGroup::default()), Vec::new())
            }
        };
        let alternatives: Vec<NodeKey> = node
            .group()
            .map_or_else(Vec::new, |group| group.alternatives.values().copied().collect());
        let selected = node.group().and_then(|group| group.selected.clone());

        let mut copy = Node::new(node.id.clone(), body);
        copy.extra = node.extra.clone();
        let copy = self.nodes.insert(copy);
        created.push(copy);

        for child in children {
            let child_copy = self.copy_subtree(child, created)?;
            self.link(copy, self.container_len(copy), child_copy)?;
        }
        for alternative in alternatives {
            let alternative_copy = self.copy_subtree(alternative, created)?;
            self.disordered_add(copy, alternative_copy)?;
        }
        if let Some(selected) = selected {
            self.disordered_select(copy, &selected)?;
        }
        Ok(copy)
    }

    fn container_len(&self, key: NodeKey) -> usize {
        self.nodes
            .get(key)
            .and_then(Node::container)
            .map_or(0, |container| container.children.len())
    }

    /// Frees a detached subtree. Returns the number of nodes removed.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::AlreadyAttached`] if `key` still has a parent
    /// or belongs to a disordered group.
    pub fn prune(&mut self, key: NodeKey) -> Result<usize> {
        let node = self.entry(key)?;
        if node.parent.is_some() || node.group.is_some() {
            return Err(HierarchyError::AlreadyAttached {
                level: node.level(),
                id: node.id.clone(),
            });
        }
        let mut removed = 0;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.owned_keys());
                removed += 1;
            }
        }
        Ok(removed)
    }

    // --- Disorder ---

    /// Follows a disordered group to its selected alternative.
    pub(crate) fn resolve(&self, key: NodeKey) -> Result<NodeKey> {
        let node = self.entry(key)?;
        match node.group() {
            Some(group) => group.selected().ok_or_else(|| HierarchyError::Unselected {
                level: node.level(),
                id: node.id.clone(),
            }),
            None => Ok(key),
        }
    }

    fn group_of(&self, key: NodeKey) -> Result<&DisorderedGroup> {
        let node = self.entry(key)?;
        node.group().ok_or_else(|| HierarchyError::NotDisordered {
            level: node.level(),
            id: node.id.clone(),
        })
    }

    /// Admits `alternative` into the disordered group `group`.
    ///
    /// Atom groups key alternatives by alternate-location code and require
    /// every alternative to carry the group's atom name. Residue groups key
    /// alternatives by residue name and require the group's residue id. The
    /// alternative inherits the group's parent; the selection is unchanged.
    pub fn disordered_add(&mut self, group: NodeKey, alternative: NodeKey) -> Result<()> {
        let group_node = self.entry(group)?;
        let group_id = group_node.id.clone();
        let level = group_node.level();
        let parent = group_node.parent;
        let group_body = self.group_of(group)?;

        let alt_node = self.entry(alternative)?;
        if alt_node.parent.is_some() || alt_node.group.is_some() {
            return Err(HierarchyError::AlreadyAttached {
                level: alt_node.level(),
                id: alt_node.id.clone(),
            });
        }
        if alt_node.level() != level {
            return Err(HierarchyError::LevelMismatch {
                expected: level,
                found: alt_node.level(),
            });
        }
        let mismatch = |reason: String| HierarchyError::AlternativeMismatch {
            level,
            group: group_id.clone(),
            reason,
        };
        let alt_key = match &alt_node.body {
            NodeBody::Atom(atom) => {
                if alt_node.id != group_id {
                    return Err(mismatch(format!(
                        "atom name {} differs from the group's",
                        alt_node.id
                    )));
                }
                AltKey::Location(atom.altloc.unwrap_or(' '))
            }
            NodeBody::Container(_, ContainerPayload::Residue { resname, .. }) => {
                if alt_node.id != group_id {
                    return Err(mismatch(format!(
                        "residue id {} differs from the group's",
                        alt_node.id
                    )));
                }
                AltKey::Residue(resname.clone())
            }
            _ => return Err(mismatch("nested disorder is not supported".to_string())),
        };
        if group_body.alternatives.contains_key(&alt_key) {
            return Err(HierarchyError::DuplicateAlternative { key: alt_key });
        }

        if let Some(group_body) = self.entry_mut(group)?.group_mut() {
            group_body.alternatives.insert(alt_key.clone(), alternative);
        }
        let alt_node = self.entry_mut(alternative)?;
        alt_node.parent = parent;
        alt_node.group = Some(group);
        self.invalidate_subtree(alternative);
        trace!(group = %group_id, key = %alt_key, "Admitted alternative");
        Ok(())
    }

    /// Releases the alternative stored under `alt_key` and returns its key.
    ///
    /// If it was selected, the smallest remaining key becomes the selection;
    /// removing the last alternative leaves the group unselected.
    pub fn disordered_remove(&mut self, group: NodeKey, alt_key: &AltKey) -> Result<NodeKey> {
        let group_body = self.group_of(group)?;
        if !group_body.alternatives.contains_key(alt_key) {
            return Err(HierarchyError::AlternativeNotFound {
                key: alt_key.clone(),
            });
        }
        let group_body = self
            .entry_mut(group)?
            .group_mut()
            .ok_or(HierarchyError::StaleKey)?;
        let alternative = group_body
            .alternatives
            .remove(alt_key)
            .ok_or(HierarchyError::StaleKey)?;
        if group_body.selected.as_ref() == Some(alt_key) {
            group_body.selected = group_body.alternatives.keys().next().cloned();
        }

        let alt_node = self.entry_mut(alternative)?;
        alt_node.parent = None;
        alt_node.group = None;
        self.invalidate_subtree(alternative);
        Ok(alternative)
    }

    /// Makes the alternative under `alt_key` the target of forwarded operations.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::AlternativeNotFound`] if the key is absent.
    pub fn disordered_select(&mut self, group: NodeKey, alt_key: &AltKey) -> Result<()> {
        if !self.group_of(group)?.alternatives.contains_key(alt_key) {
            return Err(HierarchyError::AlternativeNotFound {
                key: alt_key.clone(),
            });
        }
        let node = self.entry_mut(group)?;
        trace!(group = %node.id, key = %alt_key, "Selected alternative");
        if let Some(group_body) = node.group_mut() {
            group_body.selected = Some(alt_key.clone());
        }
        Ok(())
    }

    /// Selects the location with the highest occupancy in an atom group.
    ///
    /// Ties go to the smallest alternate-location code.
    pub fn select_highest_occupancy(&mut self, group: NodeKey) -> Result<AltKey> {
        let group_node = self.entry(group)?;
        if group_node.level() != Level::Atom {
            return Err(HierarchyError::LevelMismatch {
                expected: Level::Atom,
                found: group_node.level(),
            });
        }
        let mut best: Option<(&AltKey, f64)> = None;
        for (alt_key, &alternative) in &self.group_of(group)?.alternatives {
            if let Some(NodeBody::Atom(atom)) = self.nodes.get(alternative).map(|n| &n.body) {
                if best.is_none_or(|(_, occupancy)| atom.occupancy > occupancy) {
                    best = Some((alt_key, atom.occupancy));
                }
            }
        }
        let alt_key = best
            .map(|(alt_key, _)| alt_key.clone())
            .ok_or_else(|| HierarchyError::EmptyContainer {
                level: group_node.level(),
                id: group_node.id.clone(),
            })?;
        self.disordered_select(group, &alt_key)?;
        Ok(alt_key)
    }
}
