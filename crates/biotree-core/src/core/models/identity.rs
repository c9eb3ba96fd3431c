use super::level::Level;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use thiserror::Error;

/// Distinguishes standard polymer residues from ligands and waters.
///
/// The derived ordering (standard < hetero < water) matches the ordering of
/// the conventional text codes `" "`, `"H_<name>"` and `"W"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HeteroFlag {
    Standard,
    Hetero(String),
    Water,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid hetero flag '{0}'")]
pub struct ParseHeteroFlagError(pub String);

impl FromStr for HeteroFlag {
    type Err = ParseHeteroFlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(HeteroFlag::Standard),
            "W" | "w" => Ok(HeteroFlag::Water),
            other => match other.strip_prefix("H_") {
                Some(name) if !name.is_empty() => Ok(HeteroFlag::Hetero(name.to_string())),
                _ => Err(ParseHeteroFlagError(s.to_string())),
            },
        }
    }
}

impl TryFrom<String> for HeteroFlag {
    type Error = ParseHeteroFlagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HeteroFlag> for String {
    fn from(flag: HeteroFlag) -> Self {
        flag.to_string()
    }
}

impl fmt::Display for HeteroFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeteroFlag::Standard => write!(f, " "),
            HeteroFlag::Hetero(name) => write!(f, "H_{}", name),
            HeteroFlag::Water => write!(f, "W"),
        }
    }
}

/// Residue identifier: hetero flag, sequence number and insertion code.
///
/// A blank insertion code is stored as `' '`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResidueId {
    pub hetero: HeteroFlag,
    pub number: i32,
    pub insertion: char,
}

impl ResidueId {
    pub fn new(hetero: HeteroFlag, number: i32, insertion: char) -> Self {
        Self {
            hetero,
            number,
            insertion,
        }
    }

    pub fn standard(number: i32, insertion: char) -> Self {
        Self::new(HeteroFlag::Standard, number, insertion)
    }

    pub fn hetero(name: &str, number: i32, insertion: char) -> Self {
        Self::new(HeteroFlag::Hetero(name.to_string()), number, insertion)
    }

    pub fn water(number: i32) -> Self {
        Self::new(HeteroFlag::Water, number, ' ')
    }
}

impl fmt::Display for ResidueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(\"{}\", {}, \"{}\")",
            self.hetero, self.number, self.insertion
        )
    }
}

/// Level-specific identifier of an entity, unique among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityId {
    Atom(String),
    Residue(ResidueId),
    Chain(char),
    Model(usize),
    Structure(String),
}

impl EntityId {
    /// The hierarchy level this identifier belongs to.
    pub fn level(&self) -> Level {
        match self {
            EntityId::Atom(_) => Level::Atom,
            EntityId::Residue(_) => Level::Residue,
            EntityId::Chain(_) => Level::Chain,
            EntityId::Model(_) => Level::Model,
            EntityId::Structure(_) => Level::Structure,
        }
    }

    pub fn atom(name: &str) -> Self {
        EntityId::Atom(name.to_string())
    }

    pub fn structure(name: &str) -> Self {
        EntityId::Structure(name.to_string())
    }
}

impl From<ResidueId> for EntityId {
    fn from(id: ResidueId) -> Self {
        EntityId::Residue(id)
    }
}

impl From<char> for EntityId {
    fn from(id: char) -> Self {
        EntityId::Chain(id)
    }
}

impl From<usize> for EntityId {
    fn from(id: usize) -> Self {
        EntityId::Model(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Atom(name) => write!(f, "\"{}\"", name),
            EntityId::Residue(id) => write!(f, "{}", id),
            EntityId::Chain(id) => write!(f, "\"{}\"", id),
            EntityId::Model(id) => write!(f, "{}", id),
            EntityId::Structure(id) => write!(f, "\"{}\"", id),
        }
    }
}

/// Key of one alternative inside a disordered group.
///
/// Atom-level groups are keyed by alternate-location code, residue-level
/// groups by residue name (point mutations share one residue id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AltKey {
    Location(char),
    Residue(String),
}

impl fmt::Display for AltKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AltKey::Location(code) => write!(f, "'{}'", code),
            AltKey::Residue(name) => write!(f, "\"{}\"", name),
        }
    }
}

/// Ordered ids from the root of a hierarchy down to one entity, inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FullId(Vec<EntityId>);

impl FullId {
    pub fn new(ids: Vec<EntityId>) -> Self {
        Self(ids)
    }

    /// The path with the root id removed.
    pub fn below_root(&self) -> &[EntityId] {
        self.0.get(1..).unwrap_or(&[])
    }

    pub fn into_inner(self) -> Vec<EntityId> {
        self.0
    }
}

impl Deref for FullId {
    type Target = [EntityId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for FullId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, ")")
    }
}
