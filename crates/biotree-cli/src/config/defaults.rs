use crate::cli::DisorderPolicy;

pub struct DefaultsConfig {
    pub geometric: bool,
    pub disorder_policy: DisorderPolicy,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            geometric: false,
            disorder_policy: DisorderPolicy::HighestOccupancy,
        }
    }
}
