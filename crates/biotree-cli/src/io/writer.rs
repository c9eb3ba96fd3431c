use super::description::{
    AtomDescription, ChainDescription, ModelDescription, ResidueDescription, StructureDescription,
};
use crate::error::{CliError, Result};
use biotree::core::models::identity::EntityId;
use biotree::core::models::view::NodeRef;

/// Flattens a structure back into its on-disk description.
///
/// Every alternative of every disordered group is written, ordered by key.
pub fn describe(root: NodeRef<'_>) -> Result<StructureDescription> {
    let EntityId::Structure(id) = root.id() else {
        return Err(CliError::Argument(format!(
            "Expected a structure root, found {} {}",
            root.level(),
            root.id()
        )));
    };
    let mut models = Vec::new();
    for model in root.children()? {
        let EntityId::Model(model_id) = model.id() else {
            continue;
        };
        let mut chains = Vec::new();
        for chain in model.children()? {
            let EntityId::Chain(chain_id) = chain.id() else {
                continue;
            };
            let residues = chain
                .unpacked_children()?
                .into_iter()
                .map(describe_residue)
                .collect::<Result<Vec<_>>>()?;
            chains.push(ChainDescription {
                id: *chain_id,
                residues,
            });
        }
        let serial_num = model.serial_num()?;
        models.push(ModelDescription {
            id: *model_id,
            serial_num: (serial_num != *model_id).then_some(serial_num),
            chains,
        });
    }
    Ok(StructureDescription {
        id: id.clone(),
        extra: root.extra().clone(),
        models,
    })
}

fn describe_residue(residue: NodeRef<'_>) -> Result<ResidueDescription> {
    let EntityId::Residue(residue_id) = residue.id() else {
        return Err(CliError::Argument(format!(
            "Expected a residue, found {} {}",
            residue.level(),
            residue.id()
        )));
    };
    let atoms = residue
        .unpacked_children()?
        .into_iter()
        .map(|atom| -> Result<AtomDescription> {
            let atom = atom.atom()?;
            Ok(AtomDescription {
                name: atom.fullname.clone(),
                element: atom.element.clone(),
                coord: [atom.coord.x, atom.coord.y, atom.coord.z],
                occupancy: atom.occupancy,
                bfactor: atom.bfactor,
                altloc: atom.altloc,
                serial: atom.serial_number,
                mass: (!atom.mass.is_nan()).then_some(atom.mass),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ResidueDescription {
        name: residue.resname()?.to_string(),
        number: residue_id.number,
        hetero: residue_id.hetero.clone(),
        insertion: residue_id.insertion,
        segid: residue.segid()?.to_string(),
        atoms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::loader::build_structure;

    const TWO_CONFORMERS: &str = r#"
id = "1two"

[extra]
source = "test"

[[models]]
id = 0

[[models.chains]]
id = "A"

[[models.chains.residues]]
name = "SER"
number = 5

[[models.chains.residues.atoms]]
name = "OG"
element = "O"
coord = [1.0, 0.0, 0.0]
altloc = "A"
occupancy = 0.6

[[models.chains.residues.atoms]]
name = "OG"
element = "O"
coord = [1.5, 0.0, 0.0]
altloc = "B"
occupancy = 0.4

[[models.chains.residues]]
name = "CYS"
number = 5

[[models.chains.residues.atoms]]
name = "SG"
element = "S"
coord = [2.0, 1.0, 0.0]
"#;

    #[test]
    fn every_alternative_is_written_back() {
        let description: StructureDescription = toml::from_str(TWO_CONFORMERS).unwrap();
        let loaded = build_structure(&description).unwrap();
        let written = describe(loaded.root().unwrap()).unwrap();

        let residues = &written.models[0].chains[0].residues;
        let names: Vec<&str> = residues.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["CYS", "SER"]);
        assert_eq!(residues[1].atoms.len(), 2);
        assert_eq!(residues[1].atoms[1].altloc, Some('B'));
        assert_eq!(written.extra, description.extra);
    }

    #[test]
    fn rebuilt_structure_is_strictly_equal() {
        let description: StructureDescription = toml::from_str(TWO_CONFORMERS).unwrap();
        let first = build_structure(&description).unwrap();
        let written = describe(first.root().unwrap()).unwrap();
        let second = build_structure(&written).unwrap();
        assert!(
            first
                .root()
                .unwrap()
                .strictly_equals(&second.root().unwrap(), true)
        );
    }

    #[test]
    fn non_structure_roots_are_rejected() {
        let description: StructureDescription = toml::from_str(TWO_CONFORMERS).unwrap();
        let loaded = build_structure(&description).unwrap();
        let model = loaded.root().unwrap().children().unwrap()[0];
        assert!(matches!(describe(model), Err(CliError::Argument(_))));
    }
}
