// Copyright (c) 2020-present, UMD Database Group.
//
// This program is free software: you can use, redistribute, and/or modify
// it under the terms of the GNU Affero General Public License, version 3
// or later ("AGPL"), as published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! Configuration settings that affect all crates in current system.

use crate::error::{FlareError, Result};
use ini::Ini;
use lazy_static::lazy_static;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

lazy_static! {
    /// Global settings.
    pub static ref FLARE_CONF: Ini = Ini::load_from_str(include_str!("./config.toml")).unwrap();

    /// Default application name of a session.
    pub static ref FLARE_APP_NAME: String = FLARE_CONF["session"]["app_name"].to_string();
    /// Default number of partitions the engine plans with.
    pub static ref FLARE_TARGET_PARTITIONS: usize = FLARE_CONF["session"]["target_partitions"].parse::<usize>().unwrap();
    /// Default number of rows per record batch.
    pub static ref FLARE_BATCH_SIZE: usize = FLARE_CONF["session"]["batch_size"].parse::<usize>().unwrap();
    /// Default number of rows per INSERT statement written by the connector.
    pub static ref FLARE_JDBC_BATCH_SIZE: usize = FLARE_CONF["jdbc"]["batchsize"].parse::<usize>().unwrap();
}

/// Settings of one run: a user file layered over the built-in
/// [`FLARE_CONF`].
#[derive(Clone, Default)]
pub struct FlareConfig {
    overrides: Option<Ini>,
}

impl FlareConfig {
    /// Only the built-in settings.
    pub fn builtin() -> Self {
        Self { overrides: None }
    }

    /// Loads a user INI file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path)
            .map_err(|e| FlareError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            overrides: Some(ini),
        })
    }

    /// Parses settings from an INI string.
    pub fn parse(content: &str) -> Result<Self> {
        let ini = Ini::load_from_str(content).map_err(|e| FlareError::Config(e.to_string()))?;
        Ok(Self {
            overrides: Some(ini),
        })
    }

    /// Returns the value of `key` in `section`, if either the user file or
    /// the built-in settings define it.
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.overrides
            .as_ref()
            .and_then(|ini| ini.get_from(Some(section), key))
            .or_else(|| FLARE_CONF.get_from(Some(section), key))
            .map(|v| v.trim().to_owned())
    }

    /// Same as [`FlareConfig::get`], but a missing key is an error.
    pub fn get_str(&self, section: &str, key: &str) -> Result<String> {
        self.get(section, key)
            .ok_or_else(|| FlareError::Config(format!("missing setting [{}] {}", section, key)))
    }

    /// Parses the value of `key` in `section`.
    pub fn get_parsed<T>(&self, section: &str, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.get_str(section, key)?;
        value.parse::<T>().map_err(|e| {
            FlareError::Config(format!(
                "invalid value {:?} for [{}] {}: {}",
                value, section, key, e
            ))
        })
    }

    /// Parses a human readable duration such as `1s` or `250ms`.
    pub fn get_duration(&self, section: &str, key: &str) -> Result<Duration> {
        let value = self.get_str(section, key)?;
        humantime::parse_duration(&value).map_err(|e| {
            FlareError::Config(format!(
                "invalid duration {:?} for [{}] {}: {}",
                value, section, key, e
            ))
        })
    }

    /// Path of a sample dataset from the `[datasets]` section.
    pub fn dataset(&self, name: &str) -> Result<PathBuf> {
        self.get_str("datasets", name).map(PathBuf::from)
    }
}
