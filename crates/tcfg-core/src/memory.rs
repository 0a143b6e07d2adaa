//! In-memory record and flag store backed by a JSON fixture dump.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tcfg_model::{SourceScope, TenantId};
use tracing::{debug, warn};

use crate::error::{FixtureError, StoreError};
use crate::store::{FlagRow, FlagStore, RecordStore, Row};

/// Column naming the owning tenant when none is configured.
pub const DEFAULT_TENANT_COLUMN: &str = "tenant_id";

/// Serialized shape of a store dump.
///
/// ```json
/// {
///   "documents": { "alpha-fcu": { "tenant": { "name": "Alpha FCU" } } },
///   "tables": { "cu_branding": [ { "tenant_id": "alpha-fcu", "primary_color": "#112233" } ] },
///   "flags": { "alpha-fcu": { "bill_pay": true } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreFixture {
    #[serde(default)]
    pub documents: BTreeMap<String, Value>,
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<Row>>,
    #[serde(default)]
    pub flags: BTreeMap<String, BTreeMap<String, bool>>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    fixture: StoreFixture,
    tenant_column: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::from_fixture(StoreFixture::default())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: StoreFixture) -> Self {
        Self {
            fixture,
            tenant_column: DEFAULT_TENANT_COLUMN.to_string(),
        }
    }

    /// Loads a fixture dump from disk.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let contents = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fixture: StoreFixture =
            serde_json::from_str(&contents).map_err(|source| FixtureError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            path = %path.display(),
            documents = fixture.documents.len(),
            tables = fixture.tables.len(),
            "loaded store fixture"
        );
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_tenant_column(mut self, column: impl Into<String>) -> Self {
        self.tenant_column = column.into();
        self
    }

    pub fn with_document(mut self, tenant: &str, document: Value) -> Self {
        self.fixture.documents.insert(tenant.to_string(), document);
        self
    }

    /// Appends a row to `table`. Rows that are not JSON objects are dropped.
    pub fn with_row(mut self, table: &str, row: Value) -> Self {
        match row {
            Value::Object(row) => self
                .fixture
                .tables
                .entry(table.to_string())
                .or_default()
                .push(row),
            other => warn!(table, row = %other, "ignoring non-object row"),
        }
        self
    }

    pub fn with_flag(mut self, tenant: &str, name: &str, enabled: bool) -> Self {
        self.fixture
            .flags
            .entry(tenant.to_string())
            .or_default()
            .insert(name.to_string(), enabled);
        self
    }

    pub fn fixture(&self) -> &StoreFixture {
        &self.fixture
    }

    pub fn tenant_column(&self) -> &str {
        &self.tenant_column
    }

    fn owned_by(&self, row: &Row, tenant: &TenantId) -> bool {
        row.get(&self.tenant_column)
            .and_then(Value::as_str)
            .is_some_and(|owner| owner == tenant.as_str())
    }
}

impl RecordStore for MemoryStore {
    fn fetch_document(&self, tenant: &TenantId) -> Result<Option<Value>, StoreError> {
        Ok(self
            .fixture
            .documents
            .get(tenant.as_str())
            .filter(|document| !document.is_null())
            .cloned())
    }

    fn fetch_rows(
        &self,
        table: &str,
        scope: SourceScope,
        tenant: &TenantId,
    ) -> Result<Vec<Row>, StoreError> {
        let Some(rows) = self.fixture.tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(match scope {
            SourceScope::Tenant => rows
                .iter()
                .filter(|row| self.owned_by(row, tenant))
                .cloned()
                .collect(),
            SourceScope::Global => rows.clone(),
        })
    }
}

impl FlagStore for MemoryStore {
    fn fetch_flags(&self, tenant: &TenantId) -> Result<Vec<FlagRow>, StoreError> {
        Ok(self
            .fixture
            .flags
            .get(tenant.as_str())
            .map(|flags| {
                flags
                    .iter()
                    .map(|(name, enabled)| FlagRow::new(name.as_str(), *enabled))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    #[test]
    fn tenant_scope_filters_by_owner() {
        let store = MemoryStore::new()
            .with_row("cu_branding", json!({"tenant_id": "a", "primary_color": "#111"}))
            .with_row("cu_branding", json!({"tenant_id": "b", "primary_color": "#222"}));
        let rows = store
            .fetch_rows("cu_branding", SourceScope::Tenant, &tenant("b"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["primary_color"], json!("#222"));

        let all = store
            .fetch_rows("cu_branding", SourceScope::Global, &tenant("b"))
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(
            store
                .fetch_rows("missing", SourceScope::Tenant, &tenant("a"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn custom_tenant_column() {
        let store = MemoryStore::new()
            .with_tenant_column("cu_id")
            .with_row("cu_profiles", json!({"cu_id": "a", "display_name": "A"}));
        let rows = store
            .fetch_rows("cu_profiles", SourceScope::Tenant, &tenant("a"))
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn fixture_parses_from_json() {
        let fixture: StoreFixture = serde_json::from_value(json!({
            "documents": {"a": {"tenant": {"name": "A"}}, "b": null},
            "flags": {"a": {"bill_pay": true, "p2p": false}}
        }))
        .unwrap();
        let store = MemoryStore::from_fixture(fixture);
        assert!(store.fetch_document(&tenant("a")).unwrap().is_some());
        assert!(store.fetch_document(&tenant("b")).unwrap().is_none());
        let flags = store.fetch_flags(&tenant("a")).unwrap();
        assert_eq!(
            flags,
            vec![FlagRow::new("bill_pay", true), FlagRow::new("p2p", false)]
        );
        assert!(store.fetch_flags(&tenant("c")).unwrap().is_empty());
    }
}
