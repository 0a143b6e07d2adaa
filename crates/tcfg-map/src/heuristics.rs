//! Name-based mapping suggestions for tables the knowledge base does not know.
//!
//! Patterns are tried in a fixed priority order and the first match decides
//! the base path for every column of the table. A table matching several
//! patterns (e.g. `cu_feature_config`) is only classified under the first.

use std::fmt;

use tcfg_model::{
    Confidence, ConfigMapping, ConfigPath, ConfigType, SourceCandidate, StructureKind, TableColumn,
};
use tracing::warn;

/// Conventional prefix of tenant-owned tables.
pub const DEFAULT_TENANT_PREFIX: &str = "cu_";

/// Test applied to a lowercased table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePredicate {
    /// Name begins with the fragment. An empty prefix matches nothing.
    Prefix(String),
    /// Name contains the fragment anywhere.
    Contains(&'static str),
}

impl NamePredicate {
    pub fn matches(&self, table: &str) -> bool {
        match self {
            Self::Prefix(prefix) => !prefix.is_empty() && table.starts_with(prefix.as_str()),
            Self::Contains(fragment) => table.contains(fragment),
        }
    }
}

impl fmt::Display for NamePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
            Self::Contains(fragment) => write!(f, "*{fragment}*"),
        }
    }
}

/// One entry of the priority list.
#[derive(Debug, Clone)]
pub struct TablePattern {
    pub predicate: NamePredicate,
    pub base_path: ConfigPath,
    pub confidence: Confidence,
}

/// Infers low/medium-confidence mappings from table names.
#[derive(Debug, Clone)]
pub struct HeuristicAnalyzer {
    patterns: Vec<TablePattern>,
}

impl Default for HeuristicAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_TENANT_PREFIX)
    }
}

impl HeuristicAnalyzer {
    /// Builds the standard priority list with the given tenant table prefix.
    pub fn new(tenant_prefix: &str) -> Self {
        use NamePredicate::{Contains, Prefix};

        let table = [
            (Prefix(tenant_prefix.to_ascii_lowercase()), "tenant", Confidence::Medium),
            (Contains("_logo"), "design.logo", Confidence::Medium),
            (Contains("_color"), "design.color", Confidence::Medium),
            (Contains("feature"), "features", Confidence::Medium),
            (Contains("ivr"), "channels.ivr", Confidence::Medium),
            (Contains("product"), "products", Confidence::Medium),
            (Contains("limit"), "rules", Confidence::Medium),
            (Contains("fraud"), "fraud", Confidence::Low),
            (Contains("compliance"), "compliance", Confidence::Low),
        ];
        let mut patterns = Vec::with_capacity(table.len());
        for (predicate, base, confidence) in table {
            match ConfigPath::parse(base) {
                Ok(base_path) => patterns.push(TablePattern {
                    predicate,
                    base_path,
                    confidence,
                }),
                Err(error) => warn!(base, %error, "skipping heuristic pattern"),
            }
        }
        Self { patterns }
    }

    /// The priority list, highest priority first.
    pub fn patterns(&self) -> &[TablePattern] {
        &self.patterns
    }

    /// First pattern matching `table`, if any.
    pub fn match_table(&self, table: &str) -> Option<&TablePattern> {
        let normalized = normalize_table_name(table);
        self.patterns
            .iter()
            .find(|pattern| pattern.predicate.matches(&normalized))
    }

    /// Suggests one mapping per column under the first matching pattern.
    pub fn analyze(&self, table: &str, columns: &[TableColumn]) -> Vec<ConfigMapping> {
        let Some(pattern) = self.match_table(table) else {
            return Vec::new();
        };
        let mut suggestions = Vec::with_capacity(columns.len());
        for column in columns {
            let config_path = match pattern.base_path.child(&column.column_name) {
                Ok(path) => path,
                Err(error) => {
                    warn!(table, column = %column.column_name, %error, "skipping column");
                    continue;
                }
            };
            suggestions.push(ConfigMapping {
                config_path,
                config_type: semantic_type(&column.declared_type),
                source_candidates: vec![SourceCandidate::new(table, column.column_name.as_str())],
                structure: StructureKind::Direct,
                confidence: pattern.confidence,
                note: Some(format!("inferred from table name pattern {}", pattern.predicate)),
            });
        }
        suggestions
    }
}

/// Lowercases and trims a table name for pattern matching.
pub fn normalize_table_name(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Maps a declared store column type onto a semantic configuration type.
///
/// Size and precision suffixes such as `varchar(255)` are ignored. Types
/// outside the lookup map to [`ConfigType::Unknown`].
pub fn semantic_type(declared: &str) -> ConfigType {
    let lowered = declared.trim().to_ascii_lowercase();
    let base = lowered
        .split('(')
        .next()
        .unwrap_or_default()
        .trim();
    if base.ends_with("[]") || base == "array" || (base.starts_with('_') && base.len() > 1) {
        return ConfigType::Array;
    }
    match base {
        "text" | "varchar" | "character varying" | "char" | "character" | "citext" | "uuid"
        | "date" | "time" | "timestamp" | "timestamptz" | "timestamp with time zone"
        | "timestamp without time zone" | "inet" => ConfigType::String,
        "integer" | "int" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "serial"
        | "bigserial" | "numeric" | "decimal" | "real" | "float4" | "float8"
        | "double precision" | "money" => ConfigType::Number,
        "boolean" | "bool" => ConfigType::Boolean,
        "json" | "jsonb" => ConfigType::Object,
        _ => ConfigType::Unknown,
    }
}
