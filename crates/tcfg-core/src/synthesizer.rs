//! Builds one tenant's configuration tree from the document and table rows.
//!
//! Resolution runs in three ordered layers:
//!
//! 1. the tenant's configuration document, deep-merged into an empty tree;
//! 2. every knowledge base rule, in rule order, overlaid from the first
//!    candidate that yields a value;
//! 3. feature flag rows, written as booleans under `features`.
//!
//! Each layer only overwrites what it actually finds, so a rule with no hit
//! leaves the document value in place.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tcfg_map::KnowledgeBase;
use tcfg_model::{
    ColumnRef, ConfigMapping, ConfigPath, ConfigTree, SectionKind, SourceCandidate, SourceScope,
    StructureKind, TenantId,
};
use tracing::{debug, info, info_span, warn};

use crate::error::{ResolveError, StoreError};
use crate::store::{FlagStore, RecordStore, Row};

/// Counters gathered during one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisStats {
    pub document_found: bool,
    /// Distinct (table, scope) pairs fetched.
    pub tables_queried: usize,
    /// Tenant-scoped rows returned across all fetches.
    pub tenant_rows: usize,
    /// Rules that found a value.
    pub candidate_hits: usize,
    /// Fetches that failed and were treated as empty.
    pub fetch_failures: usize,
    pub flags_applied: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub tree: ConfigTree,
    pub stats: SynthesisStats,
}

/// Rows fetched during one resolution, keyed by table and scope.
#[derive(Default)]
struct RowCache {
    rows: HashMap<(String, SourceScope), Vec<Row>>,
    attempted: usize,
    unavailable: usize,
    last_unavailable: Option<String>,
    failures: usize,
    tenant_rows: usize,
}

impl RowCache {
    fn fetch(
        &mut self,
        store: &dyn RecordStore,
        candidate: &SourceCandidate,
        tenant: &TenantId,
    ) -> &[Row] {
        let key = (candidate.table.clone(), candidate.scope);
        match self.rows.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.attempted += 1;
                let rows = match store.fetch_rows(&candidate.table, candidate.scope, tenant) {
                    Ok(rows) => rows,
                    Err(error) => {
                        warn!(
                            table = %candidate.table,
                            %error,
                            "table fetch failed, treating as empty"
                        );
                        self.failures += 1;
                        if let StoreError::Unavailable { message } = error {
                            self.unavailable += 1;
                            self.last_unavailable = Some(message);
                        }
                        Vec::new()
                    }
                };
                if candidate.scope == SourceScope::Tenant {
                    self.tenant_rows += rows.len();
                }
                entry.insert(rows)
            }
        }
    }

    /// Every attempted fetch reported the store unreachable.
    fn store_unreachable(&self) -> Option<String> {
        if self.attempted > 0 && self.unavailable == self.attempted {
            self.last_unavailable.clone()
        } else {
            None
        }
    }
}

/// Resolves tenant configuration trees. Holds no per-tenant state.
#[derive(Clone)]
pub struct ConfigSynthesizer {
    records: Arc<dyn RecordStore>,
    flags: Arc<dyn FlagStore>,
    knowledge_base: KnowledgeBase,
}

impl ConfigSynthesizer {
    pub fn new(records: Arc<dyn RecordStore>, flags: Arc<dyn FlagStore>) -> Self {
        Self {
            records,
            flags,
            knowledge_base: KnowledgeBase::builtin(),
        }
    }

    pub fn with_knowledge_base(mut self, knowledge_base: KnowledgeBase) -> Self {
        self.knowledge_base = knowledge_base;
        self
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn resolve(&self, tenant: &TenantId) -> Result<ConfigTree, ResolveError> {
        self.resolve_with_stats(tenant).map(|synthesis| synthesis.tree)
    }

    pub fn resolve_with_stats(&self, tenant: &TenantId) -> Result<Synthesis, ResolveError> {
        let span = info_span!("resolve", tenant = %tenant);
        let _guard = span.enter();

        let mut tree = ConfigTree::new();
        let mut stats = SynthesisStats::default();

        let document = match self.records.fetch_document(tenant) {
            Ok(document) => document,
            Err(StoreError::Unavailable { message }) => {
                return Err(ResolveError::StoreUnavailable { message });
            }
            Err(error) => {
                warn!(%error, "document fetch failed, resolving from tables only");
                stats.fetch_failures += 1;
                None
            }
        };
        match &document {
            Some(Value::Object(map)) => {
                tree.merge_document(map.clone());
                stats.document_found = true;
            }
            Some(Value::Null) | None => {}
            Some(other) => warn!(kind = json_kind(other), "ignoring non-object document"),
        }

        let mut rows = RowCache::default();
        for mapping in self.knowledge_base.all_mappings() {
            let Some(value) = self.first_hit(mapping, tenant, document.as_ref(), &mut rows)
            else {
                continue;
            };
            stats.candidate_hits += 1;
            if let Err(error) = tree.merge(&mapping.config_path, value) {
                warn!(path = %mapping.config_path, %error, "discarding rule value");
            }
        }
        stats.tables_queried = rows.attempted;
        stats.tenant_rows = rows.tenant_rows;
        stats.fetch_failures += rows.failures;
        // A document read proves the store answered; table outages then
        // only make the tree sparser.
        if document.is_none()
            && let Some(message) = rows.store_unreachable()
        {
            return Err(ResolveError::StoreUnavailable { message });
        }

        let mut flag_rows = 0usize;
        match self.flags.fetch_flags(tenant) {
            Ok(flags) => {
                flag_rows = flags.len();
                let features = ConfigPath::from_segments([SectionKind::Features.key()])?;
                for flag in flags {
                    let path = match features.child(&flag.name) {
                        Ok(path) => path,
                        Err(error) => {
                            warn!(flag = %flag.name, %error, "skipping flag with unusable name");
                            continue;
                        }
                    };
                    tree.set(&path, Value::Bool(flag.enabled))?;
                    stats.flags_applied += 1;
                }
            }
            Err(error) => {
                warn!(%error, "flag fetch failed, keeping resolved features");
                stats.fetch_failures += 1;
            }
        }

        if !stats.document_found && stats.tenant_rows == 0 && flag_rows == 0 {
            return Err(ResolveError::TenantNotFound {
                tenant: tenant.clone(),
            });
        }

        info!(
            tables = stats.tables_queried,
            hits = stats.candidate_hits,
            failures = stats.fetch_failures,
            flags = stats.flags_applied,
            "resolved tenant configuration"
        );
        Ok(Synthesis { tree, stats })
    }

    /// Value of the first candidate yielding one. Later candidates are not
    /// consulted once a value is found.
    fn first_hit(
        &self,
        mapping: &ConfigMapping,
        tenant: &TenantId,
        document: Option<&Value>,
        rows: &mut RowCache,
    ) -> Option<Value> {
        for candidate in &mapping.source_candidates {
            let value = if mapping.structure == StructureKind::DocumentField {
                document.and_then(|document| document_field(document, &candidate.column))
            } else {
                let fetched = rows.fetch(self.records.as_ref(), candidate, tenant);
                extract(mapping.structure, &candidate.column, fetched)
            };
            if let Some(value) = value {
                debug!(path = %mapping.config_path, source = %candidate, "candidate hit");
                return Some(value);
            }
        }
        None
    }
}

fn extract(structure: StructureKind, column: &ColumnRef, rows: &[Row]) -> Option<Value> {
    match structure {
        StructureKind::Array => {
            let values: Vec<Value> = rows.iter().filter_map(|row| cell(row, column)).collect();
            (!values.is_empty()).then_some(Value::Array(values))
        }
        StructureKind::Computed => rows
            .iter()
            .find_map(|row| cell(row, column))
            .map(|_| Value::Bool(true)),
        StructureKind::Direct | StructureKind::Nested | StructureKind::DocumentField => {
            rows.iter().find_map(|row| cell(row, column))
        }
    }
}

/// The non-null value a column reference selects from one row.
fn cell(row: &Row, column: &ColumnRef) -> Option<Value> {
    match column {
        ColumnRef::Wildcard => Some(Value::Object(row.clone())),
        ColumnRef::Named(name) => row.get(name).filter(|value| !value.is_null()).cloned(),
    }
}

fn document_field(document: &Value, column: &ColumnRef) -> Option<Value> {
    let ColumnRef::Named(field) = column else {
        return Some(document.clone());
    };
    field
        .split('.')
        .try_fold(document, |node, key| node.get(key))
        .filter(|value| !value.is_null())
        .cloned()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
