//! Settings resolution for every subcommand: built-in defaults, then the
//! optional TOML settings file, then command-line flags.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;

pub use builder::build_settings;
pub use models::Settings;
