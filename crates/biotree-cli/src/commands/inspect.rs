use super::load_input;
use crate::cli::InspectArgs;
use crate::config::build_settings;
use crate::error::Result;
use crate::io::loader::{LoadedStructure, disordered_groups};
use biotree::core::models::identity::EntityId;
use biotree::core::models::level::Level;
use std::fmt;
use tracing::info;

/// One disordered group as reported by `inspect`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub path: String,
    pub keys: Vec<String>,
    pub selected: Option<String>,
}

/// Entity counts and disorder overview of one structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub id: String,
    pub models: usize,
    pub chains: usize,
    pub residues: usize,
    pub atoms: usize,
    pub groups: Vec<GroupReport>,
    pub residue_paths: Vec<String>,
}

/// Summarises the structure at `root`.
///
/// Residue slots are counted once however many conformers they hold; atoms
/// count every recorded location.
pub fn summarize(loaded: &LoadedStructure, full_ids: bool) -> Result<Summary> {
    let root = loaded.root()?;
    let chains = root.descendants(Level::Chain)?;
    let mut residues = 0;
    let mut atoms = 0;
    let mut residue_paths = Vec::new();
    for chain in &chains {
        residues += chain.len()?;
        for residue in chain.unpacked_children()? {
            atoms += residue.unpacked_children()?.len();
            if full_ids {
                residue_paths.push(residue.full_id().to_string());
            }
        }
    }

    let mut groups = Vec::new();
    for key in disordered_groups(root)? {
        let group = loaded.hierarchy.node(key)?;
        groups.push(GroupReport {
            path: group.full_id().to_string(),
            keys: group
                .disordered_keys()?
                .iter()
                .map(ToString::to_string)
                .collect(),
            selected: group.selected_key()?.map(ToString::to_string),
        });
    }

    Ok(Summary {
        id: match root.id() {
            EntityId::Structure(accession) => accession.clone(),
            other => other.to_string(),
        },
        models: root.len()?,
        chains: chains.len(),
        residues,
        atoms,
        groups,
        residue_paths,
    })
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Structure {}", self.id)?;
        writeln!(f, "  models:   {}", self.models)?;
        writeln!(f, "  chains:   {}", self.chains)?;
        writeln!(f, "  residues: {}", self.residues)?;
        writeln!(f, "  atoms:    {}", self.atoms)?;
        writeln!(f, "Disordered groups: {}", self.groups.len())?;
        for group in &self.groups {
            writeln!(
                f,
                "  {} [{}] selected: {}",
                group.path,
                group.keys.join(", "),
                group.selected.as_deref().unwrap_or("none")
            )?;
        }
        for path in &self.residue_paths {
            writeln!(f, "  {}", path)?;
        }
        Ok(())
    }
}

pub fn run(args: InspectArgs) -> Result<()> {
    let settings = build_settings(&args.input, None)?;
    let loaded = load_input(&args.input, &settings)?;
    info!("Summarising structure...");
    let summary = summarize(&loaded, args.full_ids)?;
    print!("{}", summary);
    Ok(())
}
