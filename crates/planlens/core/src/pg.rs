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

//! PostgreSQL-backed executor.

use parking_lot::Mutex;
use planlens_common::{ConnectionConfig, ExecutionError, Row};
use postgres::{Client, Config, NoTls, SimpleQueryMessage};
use tracing::{debug, info, warn};

use crate::executor::QueryExecutor;

/// Runs statements over one session with the simple query protocol, so every
/// value comes back as text and `SET` statements persist between calls.
pub struct PgExecutor {
    client: Mutex<Client>,
}

impl PgExecutor {
    pub fn connect(config: &ConnectionConfig) -> Result<Self, ExecutionError> {
        let client = Config::new()
            .host(&config.host)
            .port(config.port)
            .dbname(&config.dbname)
            .user(&config.user)
            .password(&config.password)
            .connect(NoTls)
            .map_err(|e| {
                warn!("Connection to {} failed: {}", config.describe(), e);
                ExecutionError::unavailable(e.to_string())
            })?;
        info!("Connected to {}", config.describe());
        Ok(Self { client: Mutex::new(client) })
    }
}

impl QueryExecutor for PgExecutor {
    fn execute(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        let mut client = self.client.lock();
        debug!("Executing: {}", sql);
        match client.simple_query(sql) {
            Ok(messages) => Ok(messages
                .iter()
                .filter_map(|message| match message {
                    SimpleQueryMessage::Row(row) => Some((0..row.len()).map(|i| row.get(i)).collect::<Row>()),
                    _ => None,
                })
                .collect()),
            Err(e) => match e.as_db_error() {
                Some(db) => {
                    let message = db.message().to_string();
                    // leave an aborted transaction block so the session stays usable
                    if let Err(rollback) = client.batch_execute("ROLLBACK") {
                        warn!("Rollback after failed statement failed: {}", rollback);
                    }
                    Err(ExecutionError::invalid_query(message))
                }
                None => Err(ExecutionError::unavailable(e.to_string())),
            },
        }
    }
}
