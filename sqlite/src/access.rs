//! The CRUD engine.
//!
//! [`RecordAccess`] composes statement building, the connection context,
//! and row decoding into the public record operations. Failures are logged
//! and degrade to an empty result or `false`; only a missing store file at
//! construction is fatal. [`RecordAccess::try_get`] is the one operation
//! that surfaces storage errors to the caller.

use record_store_core::{Catalog, Model, RecordShape};
use record_store_db::StoreConfig;
use tracing::{debug, error, info, warn};

use crate::connection::{ConnectionContext, run_non_query, run_query};
use crate::convert::{decode, encode_for_insert, encode_for_select, encode_for_update};
use crate::error::{Result, StoreError};
use crate::readiness::{BootstrapReport, DbStatus, Readiness, create_table};

/// Typed record operations over one store.
///
/// Construct once per process and share by reference; every method takes
/// `&self` and executions are serialized internally.
///
/// # Examples
///
/// ```no_run
/// use record_store_core::{Catalog, define_model};
/// use record_store_db::StoreConfig;
/// use record_store_sqlite::RecordAccess;
///
/// define_model! {
///     #[derive(Debug, Clone, PartialEq, Default)]
///     pub struct Item {
///         action: Integer => "Action",
///     }
/// }
///
/// let catalog = Catalog::new().register::<Item>();
/// let access = RecordAccess::open(&StoreConfig::default(), catalog).unwrap();
///
/// assert!(access.insert(&Item { id: Some(44), action: Some(5) }));
/// let found = access.get(&Item { action: Some(5), ..Default::default() });
/// assert_eq!(found, vec![Item { id: Some(44), action: Some(5) }]);
/// ```
#[derive(Debug)]
pub struct RecordAccess {
    connection: ConnectionContext,
    readiness: Readiness,
    catalog: Catalog,
    bootstrap: Option<BootstrapReport>,
}

impl RecordAccess {
    /// Opens the store named by `config`, creating the file and any
    /// missing catalog tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StoreFileMissing`] if the store file neither
    /// exists nor can be created.
    pub fn open(config: &StoreConfig, catalog: Catalog) -> Result<Self> {
        let connection = ConnectionContext::from_config(config);
        let readiness = Readiness::probe(&connection, &catalog);
        Self::with_readiness(connection, readiness, catalog)
    }

    /// Builds the engine from an existing context and readiness state.
    ///
    /// `TablesNotCreated` triggers a bootstrap. `Ok`, `ConfigNotFound`, and
    /// `Unknown` proceed without touching the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StoreFileMissing`] for `FileNotFound`.
    pub fn with_readiness(
        connection: ConnectionContext,
        readiness: Readiness,
        catalog: Catalog,
    ) -> Result<Self> {
        let status = readiness.status();
        let bootstrap = match status {
            DbStatus::TablesNotCreated => Some(readiness.bootstrap(&connection, &catalog)),
            DbStatus::FileNotFound => {
                error!(path = %connection.path().display(), "store file not found");
                return Err(StoreError::StoreFileMissing(connection.path().to_path_buf()));
            }
            DbStatus::Ok => {
                debug!(path = %connection.path().display(), "store ready");
                None
            }
            DbStatus::ConfigNotFound | DbStatus::Unknown => {
                warn!(status = status.as_str(), "store readiness undetermined, skipping table creation");
                None
            }
        };
        Ok(Self {
            connection,
            readiness,
            catalog,
            bootstrap,
        })
    }

    /// Current readiness of the store.
    pub fn status(&self) -> DbStatus {
        self.readiness.status()
    }

    /// The shapes this engine was opened with.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The connection context, for diagnostics.
    pub fn connection(&self) -> &ConnectionContext {
        &self.connection
    }

    /// Outcome of the bootstrap run at construction, if one happened.
    pub fn bootstrap_report(&self) -> Option<&BootstrapReport> {
        self.bootstrap.as_ref()
    }

    /// Returns every stored record matching the non-null fields of
    /// `example`. An all-null example lists the table.
    ///
    /// Storage and decoding failures are logged and yield an empty list.
    pub fn get<M: Model>(&self, example: &M) -> Vec<M> {
        self.try_get(example).unwrap_or_else(|err| {
            error!(model = M::table_name(), error = %err, "get failed, returning no records");
            Vec::new()
        })
    }

    /// Like [`get`](Self::get), but reports failures.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the query fails,
    /// [`StoreError::Decode`] if a row does not fit the shape, and
    /// [`StoreError::InvalidShape`] if the model's names are unusable.
    pub fn try_get<M: Model>(&self, example: &M) -> Result<Vec<M>> {
        let rows = self.connection.query(&encode_for_select(example)?)?;
        rows.iter().map(decode::<M>).collect()
    }

    /// Returns the first record matching `example`, if any.
    pub fn get_single<M: Model>(&self, example: &M) -> Option<M> {
        self.get(example).into_iter().next()
    }

    /// Inserts `record`. Returns `true` if a row was written.
    ///
    /// A record without a primary key is rejected without touching the
    /// store.
    pub fn insert<M: Model>(&self, record: &M) -> bool {
        if let Err(err) = require_key(record, "insert") {
            warn!(model = M::table_name(), error = %err, "insert rejected");
            return false;
        }
        let result = encode_for_insert(record)
            .and_then(|statement| self.connection.non_query(&statement));
        match result {
            Ok(affected) if affected > 0 => {
                info!(model = M::table_name(), id = record.id(), "inserted record");
                true
            }
            Ok(_) => false,
            Err(err) => {
                error!(model = M::table_name(), id = record.id(), error = %err, "insert failed");
                false
            }
        }
    }

    /// Assigns the non-null fields of `record` to the stored record with the
    /// same `Id`. Returns `true` if a row was changed.
    ///
    /// Null fields keep their stored values. An unknown `Id`, or a record
    /// with nothing but its key set, changes nothing.
    pub fn update<M: Model>(&self, record: &M) -> bool {
        if let Err(err) = require_key(record, "update") {
            warn!(model = M::table_name(), error = %err, "update rejected");
            return false;
        }
        let result = encode_for_update(record)
            .and_then(|statement| self.connection.non_query(&statement));
        match result {
            Ok(affected) => {
                debug!(model = M::table_name(), id = record.id(), affected, "updated record");
                affected > 0
            }
            Err(err @ StoreError::NothingToUpdate(_)) => {
                warn!(model = M::table_name(), id = record.id(), error = %err, "update rejected");
                false
            }
            Err(err) => {
                error!(model = M::table_name(), id = record.id(), error = %err, "update failed");
                false
            }
        }
    }

    /// Inserts `record` unless a stored record already matches it.
    ///
    /// The lookup uses `record` as a query-by-example filter. Lookup and
    /// insert run in one transaction while other callers wait, and the
    /// primary-key constraint rejects a second row with the same `Id`.
    pub fn insert_if_not_exists<M: Model>(&self, record: &M) -> bool {
        if let Err(err) = require_key(record, "insert") {
            warn!(model = M::table_name(), error = %err, "insert rejected");
            return false;
        }
        match self.insert_unless_matched(record) {
            Ok(true) => {
                info!(model = M::table_name(), id = record.id(), "inserted record");
                true
            }
            Ok(false) => {
                debug!(model = M::table_name(), id = record.id(), "record already exists");
                false
            }
            Err(err) => {
                error!(model = M::table_name(), id = record.id(), error = %err, "insert failed");
                false
            }
        }
    }

    /// Creates the table for `shape`. Returns `false` if it already exists
    /// or cannot be created.
    pub fn create_table(&self, shape: &RecordShape) -> bool {
        match create_table(&self.connection, shape) {
            Ok(()) => {
                info!(model = shape.name(), "created table");
                true
            }
            Err(err) => {
                error!(model = shape.name(), error = %err, "create table failed");
                false
            }
        }
    }

    fn insert_unless_matched<M: Model>(&self, record: &M) -> Result<bool> {
        let select = encode_for_select(record)?;
        let insert = encode_for_insert(record)?;
        self.connection.with_transaction(|tx| {
            if !run_query(tx, &select)?.is_empty() {
                return Ok(false);
            }
            Ok(run_non_query(tx, &insert)? > 0)
        })
    }
}

fn require_key<M: Model>(record: &M, operation: &'static str) -> Result<i64> {
    record.id().ok_or_else(|| StoreError::PreconditionViolation {
        operation,
        shape: M::table_name().to_string(),
    })
}
