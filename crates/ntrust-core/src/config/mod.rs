//! Configuration for different scopes
//!
//! `ntrust.toml` is read from two places:
//! - Global: `<config_dir>/ntrust/ntrust.toml`
//! - Project: `<dir>/ntrust.toml`, overriding global values

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_ntrust_toml, parse_ntrust_toml_str};
pub use paths::{CONFIG_FILE_NAME, config_path_for_scope, global_config_dir};
pub use schema::NtrustConfig;
pub use store::{ConfigStore, load_merged};

pub use crate::types::ConfigScope;
