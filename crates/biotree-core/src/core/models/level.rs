use std::fmt;

/// One of the five fixed depths of the structure hierarchy.
///
/// The level of a node never changes after creation. Ordering follows the
/// hierarchy from leaf to root, so `Level::Atom < Level::Structure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Atom,
    Residue,
    Chain,
    Model,
    Structure,
}

impl Level {
    /// The level a node at this level must be attached to, if any.
    pub fn parent_level(self) -> Option<Level> {
        match self {
            Level::Atom => Some(Level::Residue),
            Level::Residue => Some(Level::Chain),
            Level::Chain => Some(Level::Model),
            Level::Model => Some(Level::Structure),
            Level::Structure => None,
        }
    }

    /// The level of the children a node at this level holds, if any.
    pub fn child_level(self) -> Option<Level> {
        match self {
            Level::Atom => None,
            Level::Residue => Some(Level::Atom),
            Level::Chain => Some(Level::Residue),
            Level::Model => Some(Level::Chain),
            Level::Structure => Some(Level::Model),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Level::Atom => "Atom",
                Level::Residue => "Residue",
                Level::Chain => "Chain",
                Level::Model => "Model",
                Level::Structure => "Structure",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_and_child_levels_are_inverse() {
        for level in [
            Level::Atom,
            Level::Residue,
            Level::Chain,
            Level::Model,
            Level::Structure,
        ] {
            if let Some(parent) = level.parent_level() {
                assert_eq!(parent.child_level(), Some(level));
            }
            if let Some(child) = level.child_level() {
                assert_eq!(child.parent_level(), Some(level));
            }
        }
    }

    #[test]
    fn leaf_and_root_have_no_further_levels() {
        assert_eq!(Level::Atom.child_level(), None);
        assert_eq!(Level::Structure.parent_level(), None);
    }

    #[test]
    fn display_and_ordering_are_stable() {
        assert_eq!(Level::Structure.to_string(), "Structure");
        assert!(Level::Atom < Level::Structure);
    }
}
