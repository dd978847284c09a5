// lib/src/config/config_defaults.rs
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "neocare";
pub const ENV_PREFIX: &str = "NEOCARE";
pub const ENV_SEPARATOR: &str = "__";
pub const DEFAULT_DATA_DIRECTORY: &str = "./data/neocare";
pub const MIN_JWT_SECRET_LEN: usize = 32;

pub fn default_host() -> String {
    "127.0.0.1".to_string()
}
pub fn default_port() -> u16 { 8080 }
pub fn default_data_directory() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIRECTORY)
}
pub fn default_cache_capacity() -> u64 { 256 * 1024 * 1024 }
pub fn default_token_ttl_hours() -> u64 { 12 }
pub fn default_portal_token_ttl_minutes() -> u64 { 30 }
pub fn default_lookahead_days() -> u32 { 7 }
pub fn default_super_admin_username() -> String {
    "superadmin".to_string()
}
