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

//! Connection settings shared by the executor and the CLI.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "TPC-H".to_string(),
            user: "postgres".to_string(),
            password: "password".to_string(),
        }
    }
}

impl ConnectionConfig {
    pub fn with_dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = dbname.into();
        self
    }

    /// Connection target without credentials, for log lines.
    pub fn describe(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "TPC-H");
        assert_eq!(config.describe(), "postgres@localhost:5432/TPC-H");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ConnectionConfig = toml::from_str("dbname = \"tpch\"\nport = 6543\n").unwrap();
        assert_eq!(config.dbname, "tpch");
        assert_eq!(config.port, 6543);
        assert_eq!(config.host, "localhost");
    }
}
