#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tcfg_core::{FlagRow, FlagStore, MemoryStore, RecordStore, Row, StoreError};
use tcfg_model::{
    Confidence, ConfigMapping, ConfigPath, ConfigType, SourceCandidate, SourceScope, StructureKind,
    TenantId,
};

pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id).unwrap()
}

pub fn direct(path: &str, candidates: Vec<SourceCandidate>) -> ConfigMapping {
    ConfigMapping {
        config_path: ConfigPath::parse(path).unwrap(),
        config_type: ConfigType::String,
        source_candidates: candidates,
        structure: StructureKind::Direct,
        confidence: Confidence::High,
        note: None,
    }
}

/// Wraps a [`MemoryStore`], recording calls and injecting failures.
#[derive(Default)]
pub struct ScriptedStore {
    pub inner: MemoryStore,
    pub document_error: Option<StoreError>,
    pub flag_error: Option<StoreError>,
    pub table_errors: HashMap<String, StoreError>,
    pub every_table_error: Option<StoreError>,
    document_calls: AtomicUsize,
    row_calls: Mutex<Vec<String>>,
}

impl ScriptedStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn fail_table(mut self, table: &str, error: StoreError) -> Self {
        self.table_errors.insert(table.to_string(), error);
        self
    }

    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }

    pub fn row_calls(&self) -> Vec<String> {
        self.row_calls.lock().unwrap().clone()
    }

    pub fn queried(&self, table: &str) -> usize {
        self.row_calls().iter().filter(|t| *t == table).count()
    }
}

impl RecordStore for ScriptedStore {
    fn fetch_document(&self, tenant: &TenantId) -> Result<Option<Value>, StoreError> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.document_error {
            return Err(error.clone());
        }
        self.inner.fetch_document(tenant)
    }

    fn fetch_rows(
        &self,
        table: &str,
        scope: SourceScope,
        tenant: &TenantId,
    ) -> Result<Vec<Row>, StoreError> {
        self.row_calls.lock().unwrap().push(table.to_string());
        if let Some(error) = &self.every_table_error {
            return Err(error.clone());
        }
        if let Some(error) = self.table_errors.get(table) {
            return Err(error.clone());
        }
        self.inner.fetch_rows(table, scope, tenant)
    }
}

impl FlagStore for ScriptedStore {
    fn fetch_flags(&self, tenant: &TenantId) -> Result<Vec<FlagRow>, StoreError> {
        if let Some(error) = &self.flag_error {
            return Err(error.clone());
        }
        self.inner.fetch_flags(tenant)
    }
}
