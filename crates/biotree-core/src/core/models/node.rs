use super::atom::Atom;
use super::identity::{AltKey, EntityId, FullId};
use super::ids::NodeKey;
use super::level::Level;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Caller-attached metadata, copied by value when a node is copied.
pub type Extra = BTreeMap<String, toml::Value>;

/// Level-specific data carried by a container node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerPayload {
    Structure,
    Model { serial_num: usize },
    Chain,
    Residue { resname: String, segid: String },
}

/// Ordered children plus an id index kept in step with them.
#[derive(Debug, Clone, Default)]
pub struct Container {
    pub(crate) children: Vec<NodeKey>,
    pub(crate) child_index: HashMap<EntityId, NodeKey>,
}

impl Container {
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn child_key(&self, id: &EntityId) -> Option<NodeKey> {
        self.child_index.get(id).copied()
    }
}

/// Mutually alternative observations of one residue or atom.
#[derive(Debug, Clone, Default)]
pub struct DisorderedGroup {
    pub(crate) alternatives: BTreeMap<AltKey, NodeKey>,
    pub(crate) selected: Option<AltKey>,
}

impl DisorderedGroup {
    pub fn selected_key(&self) -> Option<&AltKey> {
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<NodeKey> {
        self.selected
            .as_ref()
            .and_then(|key| self.alternatives.get(key))
            .copied()
    }
}

#[derive(Debug, Clone)]
pub enum NodeBody {
    Container(Container, ContainerPayload),
    Atom(Atom),
    Disordered(DisorderedGroup),
}

/// One entity stored in the [`Hierarchy`](super::hierarchy::Hierarchy) arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: EntityId,
    /// Non-owning link to the containing node.
    pub(crate) parent: Option<NodeKey>,
    /// Disordered group this node is an alternative of.
    pub(crate) group: Option<NodeKey>,
    pub(crate) full_id: OnceLock<FullId>,
    pub(crate) extra: Extra,
    pub(crate) body: NodeBody,
}

impl Node {
    pub(crate) fn new(id: EntityId, body: NodeBody) -> Self {
        Self {
            id,
            parent: None,
            group: None,
            full_id: OnceLock::new(),
            extra: Extra::new(),
            body,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn level(&self) -> Level {
        self.id.level()
    }

    pub fn is_disordered(&self) -> bool {
        matches!(self.body, NodeBody::Disordered(_))
    }

    pub(crate) fn container(&self) -> Option<&Container> {
        match &self.body {
            NodeBody::Container(container, _) => Some(container),
            _ => None,
        }
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut Container> {
        match &mut self.body {
            NodeBody::Container(container, _) => Some(container),
            _ => None,
        }
    }

    pub(crate) fn group(&self) -> Option<&DisorderedGroup> {
        match &self.body {
            NodeBody::Disordered(group) => Some(group),
            _ => None,
        }
    }

    pub(crate) fn group_mut(&mut self) -> Option<&mut DisorderedGroup> {
        match &mut self.body {
            NodeBody::Disordered(group) => Some(group),
            _ => None,
        }
    }

    /// Keys this node owns directly: children of a container, alternatives of a group.
    pub(crate) fn owned_keys(&self) -> Vec<NodeKey> {
        match &self.body {
            NodeBody::Container(container, _) => container.children.clone(),
            NodeBody::Disordered(group) => group.alternatives.values().copied().collect(),
            NodeBody::Atom(_) => Vec::new(),
        }
    }

    pub(crate) fn invalidate_full_id(&mut self) {
        self.full_id.take();
    }
}
