//! Configuration for the pxpet command line
//!
//! Provides types and parsing for `pet.toml`.

pub mod loader;
pub mod schema;

pub use loader::{
    find_config, find_config_from, load_config, merge_cli_overrides, resolve_config, CliOverrides,
    ConfigError,
};
pub use schema::*;
