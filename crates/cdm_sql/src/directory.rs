//! External metadata collaborators.
//!
//! The translator never stores encrypted table/column metadata itself — an
//! embedding application keeps the directory (typically behind an HTTP API)
//! and exposes it through these traits. Suspension happens only at these
//! call boundaries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory record for one `(table, column)` pair: the hash and ciphertext
/// under which the encrypted schema knows each identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub table_name: String,
    pub column_name: String,
    pub table_hash: String,
    pub column_hash: String,
    pub table_ciphertext: String,
    pub column_ciphertext: String,
}

/// One decrypted row value from the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRecord {
    pub column_name: String,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Column metadata lookup failed: {0}")]
    Lookup(String),

    #[error("Row fetch failed: {0}")]
    Fetch(String),
}

/// Lookup of pre-existing encrypted column/table identifiers.
#[async_trait]
pub trait ColumnDirectory {
    async fn lookup_column_metadata(
        &self,
        table: &str,
        columns: &[String],
    ) -> Result<Vec<ColumnMetadata>, DirectoryError>;
}

/// Read path: decrypted row values for a SELECT. Never produces a CDM.
#[async_trait]
pub trait RowSource {
    async fn fetch_row_values(
        &self,
        table: &str,
        predicate: &str,
    ) -> Result<Vec<RowRecord>, DirectoryError>;
}
