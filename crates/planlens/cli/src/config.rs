// PlanLens
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use anyhow::Result;
use planlens_common::ConnectionConfig;
use planlens_core::ExplainOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanLensConfig {
    pub connection: ConnectionConfig,
    pub explain: ExplainOptions,
}

impl PlanLensConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// `<config dir>/planlens/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("planlens").join("config.toml"))
    }

    pub fn resolve_config(cli_config: Option<PathBuf>, cli_database: Option<String>) -> Result<Self> {
        let mut config = if let Some(config_path) = cli_config {
            Self::load_from_file(config_path)?
        } else if let Ok(env_config) = std::env::var("PLANLENS_CONFIG") {
            Self::load_from_file(env_config)?
        } else if let Some(path) = Self::default_path().filter(|path| path.exists()) {
            debug!("Loading configuration from {}", path.display());
            Self::load_from_file(path)?
        } else {
            Self::default()
        };

        // CLI database overrides environment settings
        if let Some(database) = cli_database {
            config.connection.dbname = database;
        } else if let Ok(env_database) = std::env::var("PLANLENS_DATABASE") {
            config.connection.dbname = env_database;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[connection]\nhost = \"db.internal\"\ndbname = \"tpch_sf1\"\n\n[explain]\nanalyze = false").unwrap();

        let config = PlanLensConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.connection.host, "db.internal");
        assert_eq!(config.connection.dbname, "tpch_sf1");
        assert_eq!(config.connection.port, 5432);
        assert!(!config.explain.analyze);
    }

    #[test]
    fn test_cli_database_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[connection]\ndbname = \"from_file\"").unwrap();

        let config = PlanLensConfig::resolve_config(Some(file.path().to_path_buf()), Some("from_cli".to_string())).unwrap();
        assert_eq!(config.connection.dbname, "from_cli");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PlanLensConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[connection]"));
        assert_eq!(toml::from_str::<PlanLensConfig>(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PlanLensConfig::load_from_file(dir.path().join("absent.toml")).is_err());
    }
}
