use super::{load_input, resolve_target};
use crate::cli::CenterArgs;
use crate::config::build_settings;
use crate::error::Result;
use tracing::info;

pub fn run(args: CenterArgs) -> Result<()> {
    let settings = build_settings(&args.input, Some(args.weighting))?;
    let loaded = load_input(&args.input, &settings)?;
    let target = loaded.hierarchy.node(resolve_target(&loaded, &args.target)?)?;

    info!(
        "Computing {} center of {} {}",
        if settings.geometric {
            "geometric"
        } else {
            "mass-weighted"
        },
        target.level(),
        target.id()
    );
    let center = target.center_of_mass(settings.geometric)?;
    println!("{:.3} {:.3} {:.3}", center.x, center.y, center.z);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::{load_input, resolve_target};
    use crate::cli::{DisorderPolicy, InputArgs, TargetArgs};
    use crate::config::Settings;
    use biotree::core::error::HierarchyError;
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn center_of(
        policy: DisorderPolicy,
        chain: Option<char>,
    ) -> Result<Point3<f64>, HierarchyError> {
        let dir = tempdir().unwrap();
        let args = InputArgs {
            input: write_structure(dir.path(), TWO_CHAINS),
            config: None,
            disorder_policy: None,
            set_values: vec![],
        };
        let settings = Settings {
            geometric: true,
            disorder_policy: policy,
        };
        let loaded = load_input(&args, &settings).unwrap();
        let target = TargetArgs { model: None, chain };
        let key = resolve_target(&loaded, &target).unwrap();
        loaded.hierarchy.node(key).unwrap().center_of_mass(settings.geometric)
    }

    #[test]
    fn structure_center_uses_selected_locations() {
        assert_eq!(
            center_of(DisorderPolicy::HighestOccupancy, None),
            Ok(Point3::new(2.0, 0.0, 0.0))
        );
        assert_eq!(
            center_of(DisorderPolicy::FirstKey, None),
            Ok(Point3::new(1.0, 0.0, 0.0))
        );
    }

    #[test]
    fn chain_center_is_scoped_to_the_chain() {
        assert_eq!(
            center_of(DisorderPolicy::FirstKey, Some('A')),
            Ok(Point3::origin())
        );
    }

    #[test]
    fn unresolved_disorder_fails_the_center() {
        assert!(matches!(
            center_of(DisorderPolicy::None, Some('B')),
            Err(HierarchyError::Unselected { .. })
        ));
    }
}
