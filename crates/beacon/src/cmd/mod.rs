//! Command implementations for the beacon CLI

pub mod flush;
pub mod record;
pub mod run;
pub mod show;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use beacon_config::Config;

/// Load config from `path`, or from the first default location that exists.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::from_file(p).context("failed to load config"),
        None => {
            let default_paths = [
                PathBuf::from("beacon.toml"),
                beacon_reporter::identity::default_data_dir().join("config.toml"),
            ];

            for p in &default_paths {
                if p.exists() {
                    return Config::from_file(p).context("failed to load config");
                }
            }

            Ok(Config::default())
        }
    }
}
