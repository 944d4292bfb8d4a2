//! Store readiness and table bootstrap.
//!
//! Readiness moves forward only, `FileNotFound -> TablesNotCreated -> Ok`.
//! `ConfigNotFound` and `Unknown` are informational side states that only
//! a caller can impose through [`Readiness::assume`]. The only writer of the
//! state is [`Readiness::bootstrap`], which creates every missing catalog
//! table and then marks the store `Ok`.

use std::collections::HashSet;
use std::fmt;
use std::sync::RwLock;

use record_store_core::{Catalog, FieldValue, RecordShape};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::connection::ConnectionContext;
use crate::error::Result;
use crate::query::Statement;
use crate::schema::{LIST_TABLES_SQL, create_table_sql};

/// Readiness of the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbStatus {
    /// The store file does not exist.
    FileNotFound,
    /// No configuration was found; informational.
    ConfigNotFound,
    /// The file exists but at least one catalog table is missing.
    TablesNotCreated,
    /// Every catalog table exists.
    Ok,
    /// No determination was made.
    Unknown,
}

impl DbStatus {
    /// Returns the status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DbStatus::FileNotFound => "FileNotFound",
            DbStatus::ConfigNotFound => "ConfigNotFound",
            DbStatus::TablesNotCreated => "TablesNotCreated",
            DbStatus::Ok => "Ok",
            DbStatus::Unknown => "Unknown",
        }
    }

    fn can_advance_to(self, next: DbStatus) -> bool {
        matches!(
            (self, next),
            (DbStatus::FileNotFound, DbStatus::TablesNotCreated)
                | (DbStatus::FileNotFound, DbStatus::Ok)
                | (DbStatus::TablesNotCreated, DbStatus::Ok)
        )
    }
}

impl fmt::Display for DbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    /// Tables created by this run.
    pub created: Vec<String>,
    /// Tables that were already present.
    pub existing: Vec<String>,
    /// Tables whose creation failed.
    pub failed: Vec<String>,
}

impl BootstrapReport {
    /// Returns `true` if no table failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Process-scoped readiness state of one store.
#[derive(Debug)]
pub struct Readiness {
    status: RwLock<DbStatus>,
}

impl Readiness {
    /// Starts from an externally determined status.
    pub fn assume(status: DbStatus) -> Self {
        Self {
            status: RwLock::new(status),
        }
    }

    /// Determines readiness without changing anything on disk.
    pub fn inspect(connection: &ConnectionContext, catalog: &Catalog) -> Self {
        Self::assume(inspect_status(connection, catalog))
    }

    /// Determines readiness at startup, creating an empty store file if
    /// none exists.
    ///
    /// A freshly created file is `TablesNotCreated`. If the file cannot be
    /// created the status stays `FileNotFound`.
    pub fn probe(connection: &ConnectionContext, catalog: &Catalog) -> Self {
        let path = connection.path();
        if path.exists() {
            return Self::inspect(connection, catalog);
        }
        let created = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
            _ => Ok(()),
        }
        .and_then(|()| std::fs::File::create(path).map(drop));
        match created {
            Ok(()) => {
                info!(path = %path.display(), "created store file");
                Self::assume(DbStatus::TablesNotCreated)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not create store file");
                Self::assume(DbStatus::FileNotFound)
            }
        }
    }

    /// Current status.
    pub fn status(&self) -> DbStatus {
        match self.status.read() {
            Ok(status) => *status,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Creates every catalog table missing from the store, then marks the
    /// store `Ok`.
    ///
    /// Individual failures are logged and reported but do not stop the run
    /// or prevent the transition.
    pub(crate) fn bootstrap(
        &self,
        connection: &ConnectionContext,
        catalog: &Catalog,
    ) -> BootstrapReport {
        let present = existing_tables(connection).unwrap_or_else(|err| {
            warn!(error = %err, "could not list existing tables");
            HashSet::new()
        });

        let mut report = BootstrapReport::default();
        for shape in catalog.shapes() {
            let name = shape.name().to_string();
            if present.contains(&name.to_ascii_lowercase()) {
                debug!(model = %name, "table already exists");
                report.existing.push(name);
                continue;
            }
            match create_table(connection, shape) {
                Ok(()) => {
                    info!(model = %name, "created table");
                    report.created.push(name);
                }
                Err(err) => {
                    error!(model = %name, error = %err, "failed to create table");
                    report.failed.push(name);
                }
            }
        }

        self.advance(DbStatus::Ok);
        info!(
            created = report.created.len(),
            existing = report.existing.len(),
            failed = report.failed.len(),
            "store bootstrap finished"
        );
        report
    }

    fn advance(&self, next: DbStatus) {
        let mut status = match self.status.write() {
            Ok(status) => status,
            Err(poisoned) => poisoned.into_inner(),
        };
        if status.can_advance_to(next) {
            debug!(from = status.as_str(), to = next.as_str(), "readiness advanced");
            *status = next;
        }
    }
}

/// Creates the table for `shape`. Fails if the table already exists.
pub(crate) fn create_table(connection: &ConnectionContext, shape: &RecordShape) -> Result<()> {
    let sql = create_table_sql(shape)?;
    connection.non_query(&Statement::new(sql))?;
    Ok(())
}

fn inspect_status(connection: &ConnectionContext, catalog: &Catalog) -> DbStatus {
    if !connection.path().exists() {
        return DbStatus::FileNotFound;
    }
    match existing_tables(connection) {
        Ok(present) => {
            let complete = catalog
                .shapes()
                .iter()
                .all(|shape| present.contains(&shape.name().to_ascii_lowercase()));
            if complete {
                DbStatus::Ok
            } else {
                DbStatus::TablesNotCreated
            }
        }
        Err(err) => {
            warn!(path = %connection.path().display(), error = %err, "could not inspect store");
            DbStatus::Unknown
        }
    }
}

/// Lowercased names of the user tables in the store.
fn existing_tables(connection: &ConnectionContext) -> Result<HashSet<String>> {
    let rows = connection.query(&Statement::new(LIST_TABLES_SQL))?;
    Ok(rows
        .iter()
        .filter_map(|row| match row.get("name") {
            Some(FieldValue::Text(name)) => Some(name.to_ascii_lowercase()),
            _ => None,
        })
        .collect())
}
