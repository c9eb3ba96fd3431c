use super::description::{AtomDescription, ResidueDescription, StructureDescription};
use crate::cli::DisorderPolicy;
use crate::error::{CliError, Result};
use biotree::core::models::atom::Atom;
use biotree::core::models::hierarchy::Hierarchy;
use biotree::core::models::identity::{EntityId, ResidueId};
use biotree::core::models::ids::NodeKey;
use biotree::core::models::level::Level;
use biotree::core::models::view::NodeRef;
use nalgebra::Point3;
use tracing::{debug, info};

/// A hierarchy together with the key of its structure root.
pub struct LoadedStructure {
    pub hierarchy: Hierarchy,
    pub root: NodeKey,
}

impl LoadedStructure {
    pub fn root(&self) -> Result<NodeRef<'_>> {
        Ok(self.hierarchy.node(self.root)?)
    }
}

/// Builds a hierarchy from a description.
///
/// Residue entries sharing a residue id become one disordered residue keyed
/// by residue name. Atom entries sharing a name, or carrying an alternate
/// location code, become one disordered atom keyed by that code. Groups are
/// left unselected; see [`apply_disorder_policy`].
pub fn build_structure(description: &StructureDescription) -> Result<LoadedStructure> {
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.create_structure(&description.id);
    hierarchy
        .extra_mut(root)?
        .extend(description.extra.clone());

    for model_description in &description.models {
        let model = hierarchy.create_model_with_serial(
            model_description.id,
            model_description.serial_num.unwrap_or(model_description.id),
        );
        for chain_description in &model_description.chains {
            let chain = hierarchy.create_chain(chain_description.id);
            for entries in group_by(&chain_description.residues, residue_id) {
                let residue = build_residue_slot(&mut hierarchy, &entries)?;
                hierarchy.add(chain, residue)?;
            }
            hierarchy.add(model, chain)?;
        }
        hierarchy.add(root, model)?;
    }
    info!(
        "Built structure '{}' with {} nodes",
        description.id,
        hierarchy.node_count()
    );
    Ok(LoadedStructure { hierarchy, root })
}

fn residue_id(residue: &ResidueDescription) -> ResidueId {
    ResidueId::new(residue.hetero.clone(), residue.number, residue.insertion)
}

/// Groups items by key, keeping the order in which each key first appears.
fn group_by<'a, T, K: PartialEq>(items: &'a [T], key: impl Fn(&T) -> K) -> Vec<Vec<&'a T>> {
    let mut groups: Vec<(K, Vec<&'a T>)> = Vec::new();
    for item in items {
        let k = key(item);
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, members)) => members.push(item),
            None => groups.push((k, vec![item])),
        }
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

fn build_residue_slot(
    hierarchy: &mut Hierarchy,
    entries: &[&ResidueDescription],
) -> Result<NodeKey> {
    match entries {
        [single] => build_residue(hierarchy, single),
        [first, ..] => {
            let id = residue_id(first);
            let group = hierarchy.create_disordered_residue(id.clone());
            for entry in entries {
                let alternative = build_residue(hierarchy, entry)?;
                hierarchy.disordered_add(group, alternative)?;
            }
            debug!("Grouped {} point mutations of residue {}", entries.len(), id);
            Ok(group)
        }
        [] => Err(CliError::Description("empty residue slot".to_string())),
    }
}

fn build_residue(hierarchy: &mut Hierarchy, description: &ResidueDescription) -> Result<NodeKey> {
    let residue = hierarchy.create_residue(
        residue_id(description),
        &description.name,
        &description.segid,
    );
    for entries in group_by(&description.atoms, |atom| atom.name.trim().to_string()) {
        let slot = match entries.as_slice() {
            [single] if single.altloc.is_none() => hierarchy.create_atom(to_atom(single)),
            [first, ..] => {
                let group = hierarchy.create_disordered_atom(&first.name);
                for entry in &entries {
                    let alternative = hierarchy.create_atom(to_atom(entry));
                    hierarchy.disordered_add(group, alternative)?;
                }
                group
            }
            [] => continue,
        };
        hierarchy.add(residue, slot)?;
    }
    Ok(residue)
}

fn to_atom(description: &AtomDescription) -> Atom {
    let [x, y, z] = description.coord;
    let mut atom = Atom::new(&description.name, Point3::new(x, y, z), &description.element)
        .with_altloc(description.altloc.unwrap_or(' '), description.occupancy)
        .with_bfactor(description.bfactor);
    if let Some(serial) = description.serial {
        atom = atom.with_serial_number(serial);
    }
    if let Some(mass) = description.mass {
        atom = atom.with_mass(mass);
    }
    atom
}

/// Collects the key of every disordered residue and atom below `root`.
pub fn disordered_groups(root: NodeRef<'_>) -> Result<Vec<NodeKey>> {
    let mut groups = Vec::new();
    let mut residues = Vec::new();
    for chain in root.descendants(Level::Chain)? {
        for residue in chain.children()? {
            if residue.is_disordered() {
                groups.push(residue.key());
            }
        }
        residues.extend(chain.unpacked_children()?);
    }
    for residue in residues {
        for atom in residue.children()? {
            if atom.is_disordered() {
                groups.push(atom.key());
            }
        }
    }
    Ok(groups)
}

/// Selects an alternative in every disordered group according to `policy`.
///
/// Returns the number of groups that received a selection.
pub fn apply_disorder_policy(
    loaded: &mut LoadedStructure,
    policy: DisorderPolicy,
) -> Result<usize> {
    if policy == DisorderPolicy::None {
        return Ok(0);
    }
    let groups = disordered_groups(loaded.root()?)?;
    for &group in &groups {
        let node = loaded.hierarchy.node(group)?;
        let by_occupancy =
            policy == DisorderPolicy::HighestOccupancy && node.level() == Level::Atom;
        if by_occupancy {
            loaded.hierarchy.select_highest_occupancy(group)?;
            continue;
        }
        let first = node
            .disordered_keys()?
            .into_iter()
            .next()
            .ok_or_else(|| {
                CliError::Description(format!("Disordered {} has no alternatives", node.id()))
            })?;
        loaded.hierarchy.disordered_select(group, &first)?;
    }
    debug!("Applied {:?} to {} disordered groups", policy, groups.len());
    Ok(groups.len())
}

/// Finds a child by id, reporting ids that do not exist as argument errors.
pub fn child_key(parent: NodeRef<'_>, id: EntityId) -> Result<NodeKey> {
    match parent.get(&id) {
        Ok(child) => Ok(child.key()),
        Err(_) => Err(CliError::Argument(format!(
            "{} {} has no child {}",
            parent.level(),
            parent.id(),
            id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biotree::core::error::HierarchyError;
    use biotree::core::models::identity::AltKey;

    const DISORDERED: &str = r#"
id = "1dis"

[[models]]
id = 0

[[models.chains]]
id = "A"

[[models.chains.residues]]
name = "GLY"
number = 1

[[models.chains.residues.atoms]]
name = "CA"
element = "C"
coord = [0.0, 0.0, 0.0]

[[models.chains.residues]]
name = "SER"
number = 2

[[models.chains.residues.atoms]]
name = "OG"
element = "O"
coord = [2.0, 0.0, 0.0]
altloc = "A"
occupancy = 0.3

[[models.chains.residues.atoms]]
name = "OG"
element = "O"
coord = [4.0, 0.0, 0.0]
altloc = "B"
occupancy = 0.7

[[models.chains.residues]]
name = "THR"
number = 2

[[models.chains.residues.atoms]]
name = "OG1"
element = "O"
coord = [-2.0, 0.0, 0.0]
"#;

    fn load(text: &str) -> LoadedStructure {
        let description: StructureDescription = toml::from_str(text).unwrap();
        build_structure(&description).unwrap()
    }

    mod building {
        use super::*;

        #[test]
        fn point_mutations_become_one_disordered_residue() {
            let loaded = load(DISORDERED);
            let chain = loaded.root().unwrap().descendants(Level::Chain).unwrap()[0];
            let residues = chain.children().unwrap();
            assert_eq!(residues.len(), 2);
            assert!(!residues[0].is_disordered());
            assert!(residues[1].is_disordered());
            assert_eq!(
                residues[1].disordered_keys().unwrap(),
                vec![
                    AltKey::Residue("SER".to_string()),
                    AltKey::Residue("THR".to_string())
                ]
            );
        }

        #[test]
        fn alternate_locations_become_one_disordered_atom() {
            let loaded = load(DISORDERED);
            let groups = disordered_groups(loaded.root().unwrap()).unwrap();
            assert_eq!(groups.len(), 2);
            let atom_group = loaded.hierarchy.node(groups[1]).unwrap();
            assert_eq!(atom_group.level(), Level::Atom);
            assert_eq!(
                atom_group.disordered_keys().unwrap(),
                vec![AltKey::Location('A'), AltKey::Location('B')]
            );
        }

        #[test]
        fn groups_start_unselected() {
            let loaded = load(DISORDERED);
            let chain = loaded.root().unwrap().descendants(Level::Chain).unwrap()[0];
            assert!(matches!(
                chain.center_of_mass(true),
                Err(HierarchyError::Unselected { .. })
            ));
        }

        #[test]
        fn duplicate_plain_atoms_are_rejected() {
            let text = r#"
id = "dup"
[[models]]
id = 0
[[models.chains]]
id = "A"
[[models.chains.residues]]
name = "GLY"
number = 1
[[models.chains.residues.atoms]]
name = "CA"
element = "C"
coord = [0.0, 0.0, 0.0]
[[models.chains.residues.atoms]]
name = "CA"
element = "C"
coord = [1.0, 0.0, 0.0]
"#;
            let description: StructureDescription = toml::from_str(text).unwrap();
            assert!(matches!(
                build_structure(&description),
                Err(CliError::Hierarchy(HierarchyError::DuplicateAlternative { .. }))
            ));
        }

        #[test]
        fn explicit_mass_and_serial_are_kept() {
            let text = r#"
id = "m"
[[models]]
id = 1
serial-num = 7
[[models.chains]]
id = "B"
[[models.chains.residues]]
name = "LIG"
number = 1
hetero = "H_LIG"
[[models.chains.residues.atoms]]
name = "X1"
element = "Xx"
coord = [1.0, 2.0, 3.0]
mass = 5.0
serial = 42
"#;
            let loaded = load(text);
            let root = loaded.root().unwrap();
            let model = root.children().unwrap()[0];
            assert_eq!(model.serial_num().unwrap(), 7);
            let atom = root.descendants(Level::Atom).unwrap()[0].atom().unwrap();
            assert_eq!(atom.mass, 5.0);
            assert_eq!(atom.serial_number, Some(42));
        }
    }

    mod policies {
        use super::*;

        #[test]
        fn highest_occupancy_picks_heavier_location_and_first_residue() {
            let mut loaded = load(DISORDERED);
            let selected = apply_disorder_policy(&mut loaded, DisorderPolicy::HighestOccupancy)
                .unwrap();
            assert_eq!(selected, 2);

            let groups = disordered_groups(loaded.root().unwrap()).unwrap();
            let residue = loaded.hierarchy.node(groups[0]).unwrap();
            assert_eq!(residue.resname().unwrap(), "SER");
            let atom = loaded.hierarchy.node(groups[1]).unwrap();
            assert_eq!(atom.selected_key().unwrap(), Some(&AltKey::Location('B')));
        }

        #[test]
        fn first_key_picks_smallest_location() {
            let mut loaded = load(DISORDERED);
            apply_disorder_policy(&mut loaded, DisorderPolicy::FirstKey).unwrap();
            let groups = disordered_groups(loaded.root().unwrap()).unwrap();
            let atom = loaded.hierarchy.node(groups[1]).unwrap();
            assert_eq!(atom.selected_key().unwrap(), Some(&AltKey::Location('A')));
        }

        #[test]
        fn none_leaves_groups_unselected() {
            let mut loaded = load(DISORDERED);
            assert_eq!(
                apply_disorder_policy(&mut loaded, DisorderPolicy::None).unwrap(),
                0
            );
            let groups = disordered_groups(loaded.root().unwrap()).unwrap();
            for group in groups {
                assert_eq!(
                    loaded.hierarchy.node(group).unwrap().selected_key().unwrap(),
                    None
                );
            }
        }
    }

    #[test]
    fn child_key_reports_missing_ids_as_argument_errors() {
        let loaded = load(DISORDERED);
        let root = loaded.root().unwrap();
        assert!(child_key(root, EntityId::Model(0)).is_ok());
        assert!(matches!(
            child_key(root, EntityId::Model(3)),
            Err(CliError::Argument(_))
        ));
    }
}
