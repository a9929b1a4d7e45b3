use serde::{Deserialize, Serialize};

/// Configuration for the garden_users module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GardenUsersConfig {
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    #[serde(default = "default_max_email_length")]
    pub max_email_length: usize,
    #[serde(default = "default_list_limit")]
    pub default_list_limit: u64,
    #[serde(default = "default_max_list_limit")]
    pub max_list_limit: u64,
}

impl Default for GardenUsersConfig {
    fn default() -> Self {
        Self {
            max_name_length: default_max_name_length(),
            max_email_length: default_max_email_length(),
            default_list_limit: default_list_limit(),
            max_list_limit: default_max_list_limit(),
        }
    }
}

fn default_max_name_length() -> usize {
    100
}

fn default_max_email_length() -> usize {
    254
}

fn default_list_limit() -> u64 {
    50
}

fn default_max_list_limit() -> u64 {
    1000
}
