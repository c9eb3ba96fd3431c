use crate::error::{CliError, Result};
use biotree::core::models::identity::HeteroFlag;
use biotree::core::models::node::Extra;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// On-disk form of a structure: nested models, chains, residues and atoms.
///
/// Alternate conformations are listed flat. Residues sharing a residue id
/// but differing in name are point mutations; atoms sharing a name within
/// a residue are alternate locations told apart by `altloc`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StructureDescription {
    pub id: String,
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
    #[serde(default)]
    pub models: Vec<ModelDescription>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ModelDescription {
    pub id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_num: Option<usize>,
    #[serde(default)]
    pub chains: Vec<ChainDescription>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ChainDescription {
    pub id: char,
    #[serde(default)]
    pub residues: Vec<ResidueDescription>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ResidueDescription {
    pub name: String,
    pub number: i32,
    #[serde(default = "standard_flag", skip_serializing_if = "is_standard")]
    pub hetero: HeteroFlag,
    #[serde(default = "blank", skip_serializing_if = "is_blank")]
    pub insertion: char,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub segid: String,
    #[serde(default)]
    pub atoms: Vec<AtomDescription>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct AtomDescription {
    pub name: String,
    pub element: String,
    pub coord: [f64; 3],
    #[serde(default = "full_occupancy")]
    pub occupancy: f64,
    #[serde(default)]
    pub bfactor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altloc: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<u32>,
    /// Explicit mass; taken from the element when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
}

fn standard_flag() -> HeteroFlag {
    HeteroFlag::Standard
}

fn is_standard(flag: &HeteroFlag) -> bool {
    *flag == HeteroFlag::Standard
}

fn blank() -> char {
    ' '
}

fn is_blank(c: &char) -> bool {
    *c == ' '
}

fn full_occupancy() -> f64 {
    1.0
}

impl StructureDescription {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading structure description from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        debug!("Writing structure description to file: {:?}", path);
        let content = toml::to_string(self).map_err(|e| CliError::Other(e.into()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
id = "1abc"

[[models]]
id = 0

[[models.chains]]
id = "A"

[[models.chains.residues]]
name = "ALA"
number = 10
insertion = "A"

[[models.chains.residues.atoms]]
name = "CA"
element = "C"
coord = [0.0, 0.0, 0.0]
"#;

    #[test]
    fn minimal_description_fills_defaults() {
        let description: StructureDescription = toml::from_str(MINIMAL).unwrap();
        let residue = &description.models[0].chains[0].residues[0];
        assert_eq!(residue.hetero, HeteroFlag::Standard);
        assert_eq!(residue.insertion, 'A');
        assert_eq!(residue.segid, "");
        let atom = &residue.atoms[0];
        assert_eq!(atom.occupancy, 1.0);
        assert_eq!(atom.altloc, None);
        assert_eq!(atom.mass, None);
    }

    #[test]
    fn hetero_residues_use_conventional_flag() {
        let text = r#"
name = "GLC"
number = 1
hetero = "H_GLC"
"#;
        let residue: ResidueDescription = toml::from_str(text).unwrap();
        assert_eq!(residue.hetero, HeteroFlag::Hetero("GLC".to_string()));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = format!("{MINIMAL}\nchain-count = 1\n");
        assert!(toml::from_str::<StructureDescription>(&text).is_err());
    }

    #[test]
    fn written_file_reads_back_identically() {
        let description: StructureDescription = toml::from_str(MINIMAL).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.toml");
        description.to_file(&path).unwrap();
        assert_eq!(StructureDescription::from_file(&path).unwrap(), description);
    }
}
