//! SQLite mapping engine for record-store.
//!
//! Maps any [`Model`](record_store_core::Model) to a table and back without
//! per-type SQL. Everything is derived from the model's
//! [`RecordShape`](record_store_core::RecordShape).
//!
//! # Architecture
//!
//! - **`schema`**: column definitions and `CREATE TABLE` from a shape
//! - **`query`**: select / insert / update statements with bound parameters
//! - **`convert`**: values to driver values, result rows back to records
//! - **`connection`**: the single connection slot, opened per statement
//! - **`readiness`**: store status and bootstrap of missing tables
//! - **`access`**: the CRUD engine built on the above
//!
//! # Quick start
//!
//! ```no_run
//! use record_store_core::{Catalog, define_model};
//! use record_store_db::StoreConfig;
//! use record_store_sqlite::{DbStatus, RecordAccess};
//!
//! define_model! {
//!     #[derive(Debug, Clone, PartialEq, Default)]
//!     pub struct Item {
//!         action: Integer => "Action",
//!     }
//! }
//!
//! let access = RecordAccess::open(
//!     &StoreConfig::default(),
//!     Catalog::new().register::<Item>(),
//! )
//! .unwrap();
//! assert_eq!(access.status(), DbStatus::Ok);
//!
//! access.insert_if_not_exists(&Item { id: Some(44), action: Some(5) });
//! for item in access.get(&Item::default()) {
//!     println!("{item:?}");
//! }
//! ```
//!
//! # Statement shapes
//!
//! Values are always bound, never interpolated:
//!
//! ```text
//! SELECT * FROM Item WHERE 1=1 AND Action = ?1
//! INSERT INTO Item VALUES (?1,?2)
//! UPDATE Item SET Action=?1 WHERE Id = ?2
//! CREATE TABLE Item ( Id integer PRIMARY KEY, Action integer )
//! ```

mod access;
mod connection;
mod convert;
mod error;
mod query;
mod readiness;
mod schema;

pub use access::RecordAccess;
pub use connection::{ConnectionContext, ExecMode, Execution};
pub use convert::ResultRow;
pub use error::{Result, StoreError};
pub use query::{Statement, build_insert, build_select, build_update, render_literal};
pub use readiness::{BootstrapReport, DbStatus, Readiness};
pub use schema::{affinity, columns_for, create_table_sql};
