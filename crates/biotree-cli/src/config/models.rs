use crate::cli::DisorderPolicy;

/// Fully resolved settings handed to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub geometric: bool,
    pub disorder_policy: DisorderPolicy,
}
