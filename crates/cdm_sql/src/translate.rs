//! The Statement Translator.
//!
//! Statements in, CDMs out. CREATE and INSERT emit operator-signed
//! envelopes for the Dispatch Sequencer; SELECT is a pure read that returns
//! rows to the caller and never reaches the sequencer.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

use cdm_crypto::{fresh_random_seed, SeedKeyPair};
use cdm_proto::envelope::{
    Cdm, ColumnSpec, CreateCdm, CreateOp, InsertCdm, InsertOp, NamedRef, RecipientRole,
    RecipientSignature, RowEntry, Sender,
};

use crate::directory::{ColumnDirectory, DirectoryError, RowRecord, RowSource};
use crate::parse::{parse, Statement};

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// What one statement translated into.
#[derive(Debug)]
pub enum Translation {
    /// Structured CDMs ready for the Dispatch Sequencer.
    Submission(Vec<Cdm>),
    /// Read-path result; bypasses CDM emission entirely.
    Rows(Vec<RowRecord>),
    /// No shape matched; the statement is silently ignored.
    Ignored,
}

/// Per-session translator. Database envelopes are signed by the operator
/// (root) identity, with the operator as the only recipient.
pub struct Translator<D, R> {
    operator_seed: String,
    directory: D,
    rows: R,
}

impl<D: ColumnDirectory, R: RowSource> Translator<D, R> {
    pub fn new(operator_seed: impl Into<String>, directory: D, rows: R) -> Self {
        Self {
            operator_seed: operator_seed.into(),
            directory,
            rows,
        }
    }

    /// Translate one raw statement.
    pub async fn translate(&self, raw: &str) -> Result<Translation, TranslateError> {
        match parse(raw) {
            Statement::Create { table, columns } => {
                Ok(Translation::Submission(vec![self.emit_create(table, columns)]))
            }
            Statement::Insert { table, columns, values } => {
                let cdm = self.emit_insert(table, columns, values).await?;
                Ok(Translation::Submission(vec![cdm]))
            }
            Statement::Select { source } => {
                let (table, predicate) = split_source(&source);
                let rows = self.rows.fetch_row_values(table, predicate).await?;
                Ok(Translation::Rows(rows))
            }
            Statement::Unrecognized => {
                tracing::debug!(
                    target: "cdm_sql",
                    event = "statement_ignored",
                    statement_len = raw.len(),
                );
                Ok(Translation::Ignored)
            }
        }
    }

    /// CREATE TABLE: one schema-definition CDM with a fresh concealment
    /// seed per column.
    fn emit_create(&self, table: String, columns: Vec<String>) -> Cdm {
        let columns = columns
            .into_iter()
            .map(|name| ColumnSpec { name, seed: fresh_random_seed() })
            .collect();
        let create = CreateOp { table, columns };
        let signing_digest = create.signing_digest();
        let (recipients, from) = self.operator_signature(&signing_digest);

        Cdm::Create(CreateCdm { create, recipients, from })
    }

    /// INSERT INTO: resolve each statement column against the directory and
    /// aggregate the matches into one row-insertion CDM.
    ///
    /// Columns the directory does not know are dropped, not rejected — the
    /// emitted CDM simply carries fewer entries. Kept as documented
    /// behaviour; the warning makes the gap observable.
    async fn emit_insert(
        &self,
        table: String,
        columns: Vec<String>,
        values: Vec<String>,
    ) -> Result<Cdm, TranslateError> {
        let metadata = self
            .directory
            .lookup_column_metadata(&table, &columns)
            .await?;

        let mut data = Vec::with_capacity(columns.len());
        let mut matched = vec![false; columns.len()];
        for meta in &metadata {
            if meta.table_name != table {
                continue;
            }
            let Some(position) = columns.iter().position(|c| *c == meta.column_name) else {
                continue;
            };
            let Some(value) = values.get(position) else {
                continue;
            };
            matched[position] = true;
            data.push(RowEntry {
                column: NamedRef {
                    name: meta.column_name.clone(),
                    hash: meta.column_hash.clone(),
                    ciphertext: meta.column_ciphertext.clone(),
                },
                table: NamedRef {
                    name: meta.table_name.clone(),
                    hash: meta.table_hash.clone(),
                    ciphertext: meta.table_ciphertext.clone(),
                },
                value: value.clone(),
            });
        }

        let dropped: Vec<&str> = columns
            .iter()
            .zip(&matched)
            .filter(|(_, hit)| !**hit)
            .map(|(name, _)| name.as_str())
            .collect();
        if !dropped.is_empty() {
            tracing::warn!(
                target: "cdm_sql",
                event = "insert_columns_dropped",
                table = %table,
                dropped = ?dropped,
            );
        }

        let insert = InsertOp { table: table.clone(), data };
        let signing_digest = insert.signing_digest();
        let (recipients, from) = self.operator_signature(&signing_digest);

        Ok(Cdm::Insert(InsertCdm { table, insert, recipients, from }))
    }

    fn operator_signature(&self, signing_digest: &[u8; 32]) -> (Vec<RecipientSignature>, Sender) {
        let keys = SeedKeyPair::from_seed(&self.operator_seed);
        let recipients = vec![RecipientSignature {
            recipient: keys.public_b64(),
            role: RecipientRole::To,
            signature: URL_SAFE_NO_PAD.encode(keys.sign(signing_digest)),
        }];
        let from = Sender { sender_public_key: keys.public_b64() };
        (recipients, from)
    }
}

/// Split the post-FROM remainder into table name and predicate.
fn split_source(source: &str) -> (&str, &str) {
    match source.split_once(char::is_whitespace) {
        Some((table, predicate)) => (table, predicate.trim()),
        None => (source, ""),
    }
}
