use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::Settings;
use crate::cli::{DisorderPolicy, InputArgs, Weighting};
use crate::error::{CliError, Result};
use tracing::debug;

/// Resolves the settings for one command run.
///
/// `weighting` carries the center flags of commands that have them.
pub fn build_settings(args: &InputArgs, weighting: Option<Weighting>) -> Result<Settings> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let center_file = file_config.center.take().unwrap_or_default();
    let geometric = match weighting.map(|w| (w.geometric, w.mass_weighted)) {
        Some((true, false)) => true,
        Some((false, true)) => false,
        _ => center_file.geometric.unwrap_or(defaults.geometric),
    };

    let disorder_file = file_config.disorder.take().unwrap_or_default();
    let disorder_policy = args
        .disorder_policy
        .or(disorder_file.policy)
        .unwrap_or(defaults.disorder_policy);

    let settings = Settings {
        geometric,
        disorder_policy,
    };
    debug!("Resolved settings: {:?}", settings);
    Ok(settings)
}

fn parse_policy(value: &str) -> Option<DisorderPolicy> {
    match value {
        "highest-occupancy" => Some(DisorderPolicy::HighestOccupancy),
        "first-key" => Some(DisorderPolicy::FirstKey),
        "none" => Some(DisorderPolicy::None),
        _ => None,
    }
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "center.geometric" => {
                config
                    .center
                    .get_or_insert_with(Default::default)
                    .geometric = Some(value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid boolean value for {}: {}", key, value_str))
                })?);
            }
            "disorder.policy" => {
                config
                    .disorder
                    .get_or_insert_with(Default::default)
                    .policy = Some(parse_policy(value_str).ok_or_else(|| {
                    CliError::Config(format!("Invalid policy value for {}: {}", key, value_str))
                })?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn base_input_args() -> InputArgs {
        InputArgs {
            input: PathBuf::from("in.toml"),
            config: None,
            disorder_policy: None,
            set_values: vec![],
        }
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let settings = build_settings(&base_input_args(), None).unwrap();
        assert_eq!(
            settings,
            Settings {
                geometric: false,
                disorder_policy: DisorderPolicy::HighestOccupancy,
            }
        );
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "[center]\ngeometric = true\n\n[disorder]\npolicy = \"first-key\"\n",
        )
        .unwrap();

        let mut args = base_input_args();
        args.config = Some(path);
        let settings = build_settings(&args, None).unwrap();
        assert!(settings.geometric);
        assert_eq!(settings.disorder_policy, DisorderPolicy::FirstKey);
    }

    #[test]
    fn flags_override_file_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[center]\ngeometric = true\n\n[disorder]\npolicy = \"none\"\n").unwrap();

        let mut args = base_input_args();
        args.config = Some(path);
        args.disorder_policy = Some(DisorderPolicy::HighestOccupancy);
        let weighting = Weighting {
            geometric: false,
            mass_weighted: true,
        };
        let settings = build_settings(&args, Some(weighting)).unwrap();
        assert!(!settings.geometric);
        assert_eq!(settings.disorder_policy, DisorderPolicy::HighestOccupancy);
    }

    #[test]
    fn set_values_override_file() {
        let mut args = base_input_args();
        args.set_values = vec![
            "center.geometric=true".to_string(),
            "disorder.policy=none".to_string(),
        ];
        let settings = build_settings(&args, None).unwrap();
        assert!(settings.geometric);
        assert_eq!(settings.disorder_policy, DisorderPolicy::None);
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["center.geometric", "center.geometric=maybe", "center.radius=1"] {
            let mut args = base_input_args();
            args.set_values = vec![bad.to_string()];
            assert!(matches!(
                build_settings(&args, None),
                Err(CliError::Config(_))
            ));
        }
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[center]\nweighted = true\n").unwrap();

        let mut args = base_input_args();
        args.config = Some(path);
        assert!(matches!(
            build_settings(&args, None),
            Err(CliError::FileParsing { .. })
        ));
    }
}
