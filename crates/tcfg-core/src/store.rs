//! Collaborator seams the synthesizer reads through.
//!
//! Absent data is never an error: a tenant without a document yields
//! `Ok(None)`, a table without matching rows yields an empty vector.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tcfg_model::{SourceScope, TenantId};

use crate::error::StoreError;

/// One table row, keyed by column name.
pub type Row = Map<String, Value>;

pub trait RecordStore: Send + Sync {
    /// The tenant's configuration document, if one exists.
    fn fetch_document(&self, tenant: &TenantId) -> Result<Option<Value>, StoreError>;

    /// Rows of `table` visible under `scope`.
    ///
    /// [`SourceScope::Tenant`] returns the tenant's own rows.
    /// [`SourceScope::Global`] returns the table-wide reference rows.
    fn fetch_rows(
        &self,
        table: &str,
        scope: SourceScope,
        tenant: &TenantId,
    ) -> Result<Vec<Row>, StoreError>;
}

/// A feature flag row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRow {
    pub name: String,
    pub enabled: bool,
}

impl FlagRow {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

pub trait FlagStore: Send + Sync {
    fn fetch_flags(&self, tenant: &TenantId) -> Result<Vec<FlagRow>, StoreError>;
}
