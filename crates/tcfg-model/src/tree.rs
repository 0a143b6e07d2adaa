//! The canonical per-tenant configuration tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InvalidPathError;
use crate::path::{self, ConfigPath, LEGACY_ROOT, TOKENS_ROOT};

/// `extra` key holding document scalars found under a known section name.
///
/// Sections only hold objects, and a section name kept directly in `extra`
/// would serialize as a second copy of that key.
pub const SHADOWED_KEY: &str = "_shadowed";

/// Known top-level domains of a configuration tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKind {
    /// Identity: names, charter and routing numbers, contact details.
    Tenant,
    /// Branding: colors, logos, typography (legacy name `design`).
    Tokens,
    Features,
    Products,
    /// Limits and thresholds.
    Rules,
    Fraud,
    Compliance,
    Integrations,
    Channels,
}

impl SectionKind {
    pub const ALL: [SectionKind; 9] = [
        Self::Tenant,
        Self::Tokens,
        Self::Features,
        Self::Products,
        Self::Rules,
        Self::Fraud,
        Self::Compliance,
        Self::Integrations,
        Self::Channels,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Tokens => TOKENS_ROOT,
            Self::Features => "features",
            Self::Products => "products",
            Self::Rules => "rules",
            Self::Fraud => "fraud",
            Self::Compliance => "compliance",
            Self::Integrations => "integrations",
            Self::Channels => "channels",
        }
    }

    /// Looks up a section by top-level key, accepting the legacy `design` alias.
    pub fn from_key(key: &str) -> Option<Self> {
        if key == LEGACY_ROOT {
            return Some(Self::Tokens);
        }
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One top-level domain of the tree. Always holds a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Section(Value);

impl Default for Section {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl Section {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        match &self.0 {
            Value::Object(map) => map,
            _ => unreachable!("sections always hold objects"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_map().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().get(key)
    }
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Self::default()),
            value @ Value::Object(_) => Ok(Self(value)),
            other => Err(serde::de::Error::custom(format!(
                "configuration section must be an object, found {other}"
            ))),
        }
    }
}

/// Connection state of one integration, as seen by status probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    Enabled,
    Disabled,
    NotConfigured,
}

#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Replace,
    Merge,
}

impl WriteMode {
    fn apply(self, slot: &mut Value, value: Value) {
        match self {
            Self::Replace => *slot = value,
            Self::Merge => path::deep_merge(slot, value),
        }
    }
}

/// Resolved configuration for one tenant.
///
/// Each known domain is a typed field; top-level keys the engine does not
/// recognize are preserved in `extra` rather than dropped. Reads and writes
/// go through [`ConfigPath`], so the legacy `design` root resolves to
/// `tokens` everywhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigTree {
    #[serde(default, skip_serializing_if = "Section::is_empty")]
    pub tenant: Section,
    #[serde(default, skip_serializing_if = "Section::is_empty")]
    pub tokens: Section,
    #[serde(default, skip_serializing_if = "Section::is_empty")]
    pub features: Section,
    #[serde(default, skip_serializing_if = "Section::is_empty")]
    pub products: Section,
    #[serde(default, skip_serializing_if = "Section::is_empty")]
    pub rules: Section,
    #[serde(default, skip_serializing_if = "Section::is_empty")]
    pub fraud: Section,
    #[serde(default, skip_serializing_if = "Section::is_empty")]
    pub compliance: Section,
    #[serde(default, skip_serializing_if = "Section::is_empty")]
    pub integrations: Section,
    #[serde(default, skip_serializing_if = "Section::is_empty")]
    pub channels: Section,
    /// Top-level document keys outside the known sections.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, kind: SectionKind) -> &Section {
        match kind {
            SectionKind::Tenant => &self.tenant,
            SectionKind::Tokens => &self.tokens,
            SectionKind::Features => &self.features,
            SectionKind::Products => &self.products,
            SectionKind::Rules => &self.rules,
            SectionKind::Fraud => &self.fraud,
            SectionKind::Compliance => &self.compliance,
            SectionKind::Integrations => &self.integrations,
            SectionKind::Channels => &self.channels,
        }
    }

    fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        match kind {
            SectionKind::Tenant => &mut self.tenant,
            SectionKind::Tokens => &mut self.tokens,
            SectionKind::Features => &mut self.features,
            SectionKind::Products => &mut self.products,
            SectionKind::Rules => &mut self.rules,
            SectionKind::Fraud => &mut self.fraud,
            SectionKind::Compliance => &mut self.compliance,
            SectionKind::Integrations => &mut self.integrations,
            SectionKind::Channels => &mut self.channels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extra.is_empty() && SectionKind::ALL.iter().all(|kind| self.section(*kind).is_empty())
    }

    /// Reads the value at `path`. An empty section reads as absent.
    pub fn get(&self, path: &ConfigPath) -> Option<&Value> {
        match SectionKind::from_key(path.root()) {
            Some(kind) => {
                let section = self.section(kind);
                if section.is_empty() {
                    return None;
                }
                path::get_segments(section.as_value(), path.rest())
            }
            None => {
                let (head, tail) = path.segments().split_first()?;
                path::get_segments(self.extra.get(head)?, tail)
            }
        }
    }

    /// Parses `raw` and reads the value there.
    pub fn lookup(&self, raw: &str) -> Result<Option<&Value>, InvalidPathError> {
        let path = ConfigPath::parse(raw)?;
        Ok(self.get(&path))
    }

    /// Writes `value` at `path`, replacing any existing value.
    ///
    /// A known section root only accepts an object.
    pub fn set(&mut self, path: &ConfigPath, value: Value) -> Result<(), InvalidPathError> {
        self.write(path, value, WriteMode::Replace)
    }

    /// Writes `value` at `path`, merging objects into existing objects.
    pub fn merge(&mut self, path: &ConfigPath, value: Value) -> Result<(), InvalidPathError> {
        self.write(path, value, WriteMode::Merge)
    }

    fn write(
        &mut self,
        path: &ConfigPath,
        value: Value,
        mode: WriteMode,
    ) -> Result<(), InvalidPathError> {
        let Some(kind) = SectionKind::from_key(path.root()) else {
            let (head, tail) = path.segments().split_at(1);
            let entry = self.extra.entry(head[0].clone()).or_insert(Value::Null);
            mode.apply(path::slot(entry, tail), value);
            return Ok(());
        };
        if path.rest().is_empty() && !value.is_object() {
            return Err(InvalidPathError::SectionRoot {
                section: kind.key().to_string(),
            });
        }
        let section = self.section_mut(kind);
        mode.apply(path::slot(&mut section.0, path.rest()), value);
        Ok(())
    }

    /// Deep-merges a loosely-typed document into the tree.
    ///
    /// Keys naming a known section (including `design`) merge into that
    /// section when the value is an object. Any other value under a section
    /// key is kept in `extra` under [`SHADOWED_KEY`], keyed by the original
    /// name. Everything else lands in `extra`.
    pub fn merge_document(&mut self, document: Map<String, Value>) {
        for (key, value) in document {
            match SectionKind::from_key(&key) {
                Some(kind) if value.is_object() => {
                    path::deep_merge(&mut self.section_mut(kind).0, value);
                }
                Some(_) => {
                    let shadowed = self
                        .extra
                        .entry(SHADOWED_KEY.to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    path::deep_merge(shadowed, Value::Object(Map::from_iter([(key, value)])));
                }
                None => match self.extra.get_mut(&key) {
                    Some(existing) => path::deep_merge(existing, value),
                    None => {
                        self.extra.insert(key, value);
                    }
                },
            }
        }
    }

    /// Whether `features.<name>` is set to `true`. Absent or non-boolean is off.
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Reports `integrations.<name>.enabled`.
    ///
    /// An integration object without an `enabled` flag counts as enabled,
    /// since its presence means it was configured.
    pub fn integration_status(&self, name: &str) -> IntegrationStatus {
        match self.integrations.get(name) {
            Some(Value::Object(entry)) => match entry.get("enabled").and_then(Value::as_bool) {
                Some(false) => IntegrationStatus::Disabled,
                _ => IntegrationStatus::Enabled,
            },
            Some(Value::Bool(true)) => IntegrationStatus::Enabled,
            Some(Value::Bool(false)) => IntegrationStatus::Disabled,
            _ => IntegrationStatus::NotConfigured,
        }
    }

    /// Renders the tree as one JSON object.
    pub fn to_value(&self) -> Value {
        let mut out = self.extra.clone();
        for kind in SectionKind::ALL {
            let section = self.section(kind);
            if !section.is_empty() {
                out.insert(kind.key().to_string(), section.as_value().clone());
            }
        }
        Value::Object(out)
    }
}
