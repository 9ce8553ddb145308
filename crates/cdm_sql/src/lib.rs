//! cdm_sql — Statement translation for CDM Channel
//!
//! Accepts one raw SQL-like statement and turns it into structured CDMs
//! (schema definition, row insertion) or a read-only row fetch. This is NOT
//! a SQL engine: exactly three statement shapes are recognised, everything
//! else is ignored.
//!
//! # Modules
//! - `parse`     — shape classification into tagged statement variants
//! - `directory` — external column-metadata and row-value collaborators
//! - `translate` — the Statement Translator: statements in, CDMs out

pub mod directory;
pub mod parse;
pub mod translate;

pub use directory::{ColumnDirectory, ColumnMetadata, DirectoryError, RowRecord, RowSource};
pub use parse::{parse, Statement};
pub use translate::{TranslateError, Translation, Translator};
