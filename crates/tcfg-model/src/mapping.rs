//! Mapping rules from source tables to canonical configuration paths.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::ConfigPath;

/// Confidence tier of a table-to-path mapping.
///
/// Used for administrative triage only; resolution treats every rule alike.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub const ALL: [Confidence; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Returns a human-readable description of the confidence tier.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::High => "high confidence - curated mapping",
            Self::Medium => "medium confidence - should review",
            Self::Low => "low confidence - needs verification",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic type expected at a configuration path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    /// Declared column type the heuristics do not recognize.
    Unknown,
}

impl ConfigType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule's source value is shaped into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureKind {
    /// One column of one row becomes one leaf.
    Direct,
    /// A column holding an object, merged into the object at the path.
    Nested,
    /// The column (or whole row) of every matching row, as an array.
    Array,
    /// A derived boolean: `true` once any candidate yields a value.
    Computed,
    /// A field read from the tenant document rather than from table rows.
    /// The candidate column is a dot path inside the document.
    DocumentField,
}

impl StructureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Nested => "nested",
            Self::Array => "array",
            Self::Computed => "computed",
            Self::DocumentField => "document-field",
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column reference; `*` selects the entire row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnRef {
    Wildcard,
    Named(String),
}

impl ColumnRef {
    pub const WILDCARD: &'static str = "*";

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Wildcard => Self::WILDCARD,
            Self::Named(name) => name,
        }
    }
}

impl From<String> for ColumnRef {
    fn from(value: String) -> Self {
        if value == Self::WILDCARD {
            Self::Wildcard
        } else {
            Self::Named(value)
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ColumnRef> for String {
    fn from(value: ColumnRef) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rows of a table a candidate reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceScope {
    /// Rows belonging to the tenant being resolved.
    #[default]
    Tenant,
    /// Table-wide reference rows shared by every tenant.
    Global,
}

impl SourceScope {
    fn is_tenant(&self) -> bool {
        matches!(self, Self::Tenant)
    }
}

/// One place a mapping may read its value from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceCandidate {
    pub table: String,
    pub column: ColumnRef,
    #[serde(default, skip_serializing_if = "SourceScope::is_tenant")]
    pub scope: SourceScope,
}

impl SourceCandidate {
    pub fn new(table: impl Into<String>, column: impl Into<ColumnRef>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            scope: SourceScope::Tenant,
        }
    }

    pub fn global(table: impl Into<String>, column: impl Into<ColumnRef>) -> Self {
        Self {
            scope: SourceScope::Global,
            ..Self::new(table, column)
        }
    }
}

impl fmt::Display for SourceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)?;
        if self.scope == SourceScope::Global {
            f.write_str(" (global)")?;
        }
        Ok(())
    }
}

/// A declarative rule: where a canonical configuration value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMapping {
    pub config_path: ConfigPath,
    pub config_type: ConfigType,
    /// Tried in order; the first candidate yielding a value wins.
    pub source_candidates: Vec<SourceCandidate>,
    pub structure: StructureKind,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ConfigMapping {
    /// Tables this rule may read, in candidate order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.source_candidates.iter().map(|c| c.table.as_str())
    }
}

/// One column as it exists in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    #[serde(default)]
    pub table_name: String,
    pub column_name: String,
    #[serde(default)]
    pub declared_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl TableColumn {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        declared_type: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            declared_type: declared_type.into(),
            nullable: true,
            default: None,
        }
    }
}

/// A table and its columns, as supplied to the report generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCatalogueEntry {
    /// Missing or blank marks the entry as malformed.
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub columns: Vec<TableColumn>,
}

impl TableCatalogueEntry {
    pub fn new(table_name: impl Into<String>, columns: Vec<TableColumn>) -> Self {
        Self {
            table_name: Some(table_name.into()),
            columns,
        }
    }

    /// The trimmed table name, if present and non-blank.
    pub fn name(&self) -> Option<&str> {
        self.table_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Classification of every known column by mapping confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingReport {
    pub high_confidence: Vec<ConfigMapping>,
    pub medium_confidence: Vec<ConfigMapping>,
    pub low_confidence: Vec<ConfigMapping>,
    /// Tables neither the knowledge base nor the heuristics could place.
    pub unmapped: Vec<String>,
    /// Catalogue entries skipped because they had no table name.
    #[serde(default)]
    pub skipped_entries: usize,
}

impl MappingReport {
    pub fn bucket(&self, confidence: Confidence) -> &[ConfigMapping] {
        match confidence {
            Confidence::High => &self.high_confidence,
            Confidence::Medium => &self.medium_confidence,
            Confidence::Low => &self.low_confidence,
        }
    }

    pub fn push(&mut self, mapping: ConfigMapping) {
        match mapping.confidence {
            Confidence::High => self.high_confidence.push(mapping),
            Confidence::Medium => self.medium_confidence.push(mapping),
            Confidence::Low => self.low_confidence.push(mapping),
        }
    }

    pub fn mapping_count(&self) -> usize {
        self.high_confidence.len() + self.medium_confidence.len() + self.low_confidence.len()
    }

    pub fn is_unmapped(&self, table: &str) -> bool {
        self.unmapped.iter().any(|name| name == table)
    }

    /// Mappings in any bucket that read from `table`.
    pub fn mappings_for_table<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a ConfigMapping> + 'a {
        Confidence::ALL
            .into_iter()
            .flat_map(move |level| self.bucket(level).iter())
            .filter(move |mapping| mapping.tables().any(|t| t == table))
    }
}
