pub mod center;
pub mod inspect;
pub mod transform;

use crate::cli::{InputArgs, TargetArgs};
use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::io::description::StructureDescription;
use crate::io::loader::{self, LoadedStructure};
use biotree::core::models::identity::EntityId;
use biotree::core::models::ids::NodeKey;
use tracing::info;

/// Reads the input description, builds the hierarchy and resolves disorder.
pub fn load_input(args: &InputArgs, settings: &Settings) -> Result<LoadedStructure> {
    info!("Loading input structure from {:?}", &args.input);
    let description = StructureDescription::from_file(&args.input)?;
    let mut loaded = loader::build_structure(&description)?;
    let selected = loader::apply_disorder_policy(&mut loaded, settings.disorder_policy)?;
    info!(
        "Resolved {} disordered groups with policy {:?}",
        selected, settings.disorder_policy
    );
    Ok(loaded)
}

/// The node a command acts on: the structure, one model, or one chain.
pub fn resolve_target(loaded: &LoadedStructure, target: &TargetArgs) -> Result<NodeKey> {
    let root = loaded.root()?;
    let model = match (target.model, target.chain) {
        (None, None) => return Ok(loaded.root),
        (Some(model_id), _) => loader::child_key(root, EntityId::Model(model_id))?,
        (None, Some(_)) => root
            .children()?
            .first()
            .map(|model| model.key())
            .ok_or_else(|| CliError::Argument(format!("Structure {} has no models", root.id())))?,
    };
    match target.chain {
        None => Ok(model),
        Some(chain_id) => {
            loader::child_key(loaded.hierarchy.node(model)?, EntityId::Chain(chain_id))
        }
    }
}
