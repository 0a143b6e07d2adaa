//! Curated table-to-path mapping rules.
//!
//! The rule set is a flat ordered list grouped by tier (identity, branding,
//! features, channels, products, rules, risk, compliance, integrations).
//! Candidate order inside a rule is its precedence order. Rules change only
//! by editing this file.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use tcfg_model::{
    ColumnRef, Confidence, ConfigMapping, ConfigPath, ConfigType, SourceCandidate, SourceScope,
    StructureKind,
};

use Confidence::{High, Low, Medium};
use ConfigType::{Array, Boolean, Number, Object};
use StructureKind::{Computed, Direct, DocumentField, Nested};

/// Table holding the per-tenant configuration document.
///
/// `document-field` rules name it as their candidate table; their column is
/// a dot path inside the document.
pub const DOCUMENT_TABLE: &str = "cu_configurations";

struct Rule {
    path: &'static str,
    config_type: ConfigType,
    candidates: &'static [Source],
    structure: StructureKind,
    confidence: Confidence,
    note: Option<&'static str>,
}

struct Source {
    table: &'static str,
    column: &'static str,
    scope: SourceScope,
}

const fn tenant(table: &'static str, column: &'static str) -> Source {
    Source {
        table,
        column,
        scope: SourceScope::Tenant,
    }
}

const fn global(table: &'static str, column: &'static str) -> Source {
    Source {
        table,
        column,
        scope: SourceScope::Global,
    }
}

const fn rule(
    path: &'static str,
    config_type: ConfigType,
    candidates: &'static [Source],
    structure: StructureKind,
    confidence: Confidence,
) -> Rule {
    Rule {
        path,
        config_type,
        candidates,
        structure,
        confidence,
        note: None,
    }
}

const fn noted(base: Rule, note: &'static str) -> Rule {
    Rule {
        note: Some(note),
        ..base
    }
}

static RULES: &[Rule] = &[
    // Identity
    rule(
        "tenant.name",
        ConfigType::String,
        &[tenant("cu_profiles", "display_name"), tenant("cu_profiles", "legal_name")],
        Direct,
        High,
    ),
    rule(
        "tenant.legal_name",
        ConfigType::String,
        &[tenant("cu_profiles", "legal_name")],
        Direct,
        High,
    ),
    rule(
        "tenant.charter_number",
        ConfigType::String,
        &[tenant("cu_profiles", "charter_number")],
        Direct,
        High,
    ),
    rule(
        "tenant.routing_number",
        ConfigType::String,
        &[tenant("cu_profiles", "routing_number"), tenant("cu_contact_info", "routing_number")],
        Direct,
        High,
    ),
    rule(
        "tenant.website",
        ConfigType::String,
        &[tenant("cu_profiles", "website_url")],
        Direct,
        High,
    ),
    rule(
        "tenant.support.phone",
        ConfigType::String,
        &[tenant("cu_contact_info", "phone"), tenant("cu_profiles", "support_phone")],
        Direct,
        Medium,
    ),
    rule(
        "tenant.support.email",
        ConfigType::String,
        &[tenant("cu_contact_info", "email")],
        Direct,
        Medium,
    ),
    rule(
        "tenant.timezone",
        ConfigType::String,
        &[tenant("cu_profiles", "timezone")],
        Direct,
        Medium,
    ),
    noted(
        rule(
            "tenant.slug",
            ConfigType::String,
            &[tenant(DOCUMENT_TABLE, "settings.slug")],
            DocumentField,
            Medium,
        ),
        "older documents keep the slug under settings",
    ),
    // Branding
    rule(
        "design.color.primary",
        ConfigType::String,
        &[tenant("cu_branding", "primary_color"), tenant("cu_design_tokens", "color_primary")],
        Direct,
        High,
    ),
    rule(
        "design.color.secondary",
        ConfigType::String,
        &[tenant("cu_branding", "secondary_color"), tenant("cu_design_tokens", "color_secondary")],
        Direct,
        High,
    ),
    rule(
        "design.color.accent",
        ConfigType::String,
        &[tenant("cu_branding", "accent_color")],
        Direct,
        Medium,
    ),
    rule(
        "design.logo.primary",
        ConfigType::String,
        &[tenant("cu_logos", "primary_url"), tenant("cu_branding", "logo_url")],
        Direct,
        High,
    ),
    rule(
        "design.logo.dark",
        ConfigType::String,
        &[tenant("cu_logos", "dark_url")],
        Direct,
        Medium,
    ),
    rule(
        "design.app_icon",
        ConfigType::String,
        &[tenant("cu_branding", "app_icon_url")],
        Direct,
        Medium,
    ),
    rule(
        "design.typography",
        Object,
        &[tenant("cu_design_tokens", "typography")],
        Nested,
        Medium,
    ),
    // Features
    rule(
        "features.mobile_deposit",
        Boolean,
        &[tenant("cu_feature_settings", "mobile_deposit")],
        Direct,
        High,
    ),
    rule(
        "features.bill_pay",
        Boolean,
        &[tenant("cu_feature_settings", "bill_pay")],
        Direct,
        High,
    ),
    rule(
        "features.p2p",
        Boolean,
        &[tenant("cu_feature_settings", "p2p_enabled")],
        Direct,
        Medium,
    ),
    rule(
        "features.card_controls",
        Boolean,
        &[tenant("cu_feature_settings", "card_controls")],
        Direct,
        Medium,
    ),
    // Channels
    rule(
        "channels.ivr.enabled",
        Boolean,
        &[tenant("cu_ivr_settings", "enabled")],
        Direct,
        High,
    ),
    rule(
        "channels.ivr.phone_number",
        ConfigType::String,
        &[tenant("cu_ivr_settings", "phone_number")],
        Direct,
        High,
    ),
    rule(
        "channels.ivr.language",
        ConfigType::String,
        &[tenant("cu_ivr_settings", "language"), global("ivr_defaults", "language")],
        Direct,
        Medium,
    ),
    rule(
        "channels.online_banking.url",
        ConfigType::String,
        &[tenant("cu_channels", "online_banking_url")],
        Direct,
        Medium,
    ),
    // Products
    rule(
        "products.accounts",
        Array,
        &[tenant("cu_products", "*")],
        StructureKind::Array,
        High,
    ),
    rule(
        "products.loan_rates",
        Array,
        &[tenant("cu_loan_rates", "*")],
        StructureKind::Array,
        Medium,
    ),
    // Rules
    rule(
        "rules.transfer.daily_limit",
        Number,
        &[
            tenant("cu_transaction_limits", "daily_transfer_limit"),
            global("transaction_limit_defaults", "daily_transfer_limit"),
        ],
        Direct,
        High,
    ),
    rule(
        "rules.deposit.mobile_limit",
        Number,
        &[tenant("cu_transaction_limits", "mobile_deposit_limit")],
        Direct,
        High,
    ),
    rule(
        "rules.session_timeout_minutes",
        Number,
        &[tenant("cu_security_settings", "session_timeout")],
        Direct,
        Medium,
    ),
    // Risk
    rule(
        "fraud.thresholds",
        Object,
        &[tenant("cu_fraud_settings", "thresholds")],
        Nested,
        Medium,
    ),
    rule(
        "fraud.provider",
        ConfigType::String,
        &[tenant("cu_fraud_settings", "provider")],
        Direct,
        Low,
    ),
    rule(
        "fraud.velocity_checks",
        Boolean,
        &[tenant("cu_fraud_settings", "velocity_checks")],
        Direct,
        Low,
    ),
    // Compliance
    rule(
        "compliance.fdx.enabled",
        Boolean,
        &[tenant("cu_compliance", "fdx_enabled")],
        Direct,
        High,
    ),
    rule(
        "compliance.fdx.version",
        ConfigType::String,
        &[tenant("cu_compliance", "fdx_version")],
        Direct,
        Medium,
    ),
    rule(
        "compliance.disclosures",
        Array,
        &[tenant("cu_disclosures", "*")],
        StructureKind::Array,
        Medium,
    ),
    rule(
        "compliance.regulator",
        ConfigType::String,
        &[tenant("cu_compliance", "regulator")],
        Direct,
        Low,
    ),
    // Integrations
    rule(
        "integrations.core_banking",
        Object,
        &[tenant("cu_integrations", "core_banking")],
        Nested,
        Medium,
    ),
    noted(
        rule(
            "integrations.core_banking.enabled",
            Boolean,
            &[tenant("cu_core_connections", "host")],
            Computed,
            Medium,
        ),
        "true once a core connection host is configured",
    ),
    noted(
        rule(
            "integrations.card_processor.enabled",
            Boolean,
            &[tenant("cu_card_processors", "processor_name")],
            Computed,
            Low,
        ),
        "true once a card processor is registered",
    ),
    rule(
        "integrations.analytics",
        Object,
        &[tenant("cu_integrations", "analytics")],
        Nested,
        Low,
    ),
];

static BUILTIN: LazyLock<Vec<ConfigMapping>> = LazyLock::new(|| {
    let mut mappings = Vec::with_capacity(RULES.len());
    for rule in RULES {
        match ConfigPath::parse(rule.path) {
            Ok(config_path) => mappings.push(ConfigMapping {
                config_path,
                config_type: rule.config_type,
                source_candidates: rule
                    .candidates
                    .iter()
                    .map(|source| SourceCandidate {
                        table: source.table.to_string(),
                        column: ColumnRef::from(source.column),
                        scope: source.scope,
                    })
                    .collect(),
                structure: rule.structure,
                confidence: rule.confidence,
                note: rule.note.map(str::to_string),
            }),
            Err(error) => {
                tracing::error!(path = rule.path, %error, "skipping knowledge base rule");
            }
        }
    }
    mappings
});

/// Which columns of one table the knowledge base reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    /// A wildcard rule reads whole rows.
    AllColumns,
    Columns(BTreeSet<String>),
}

impl Coverage {
    pub fn covers(&self, column: &str) -> bool {
        match self {
            Self::AllColumns => true,
            Self::Columns(columns) => columns.contains(column),
        }
    }
}

/// An ordered set of mapping rules.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    mappings: Cow<'static, [ConfigMapping]>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeBase {
    /// The curated rule set shipped with the engine.
    pub fn builtin() -> Self {
        Self {
            mappings: Cow::Borrowed(BUILTIN.as_slice()),
        }
    }

    /// A caller-supplied rule set, used in place of the curated one.
    pub fn from_mappings(mappings: Vec<ConfigMapping>) -> Self {
        Self {
            mappings: Cow::Owned(mappings),
        }
    }

    pub fn all_mappings(&self) -> &[ConfigMapping] {
        &self.mappings
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn mapping_for_path(&self, path: &ConfigPath) -> Option<&ConfigMapping> {
        self.mappings.iter().find(|m| &m.config_path == path)
    }

    /// Every table named by any candidate of any rule.
    pub fn referenced_tables(&self) -> BTreeSet<&str> {
        self.mappings.iter().flat_map(ConfigMapping::tables).collect()
    }

    /// Column coverage per referenced table.
    pub fn coverage(&self) -> BTreeMap<&str, Coverage> {
        let mut coverage: BTreeMap<&str, Coverage> = BTreeMap::new();
        for candidate in self.mappings.iter().flat_map(|m| &m.source_candidates) {
            let entry = coverage
                .entry(candidate.table.as_str())
                .or_insert_with(|| Coverage::Columns(BTreeSet::new()));
            match (&candidate.column, entry) {
                (ColumnRef::Wildcard, entry) => *entry = Coverage::AllColumns,
                (ColumnRef::Named(_), Coverage::AllColumns) => {}
                (ColumnRef::Named(column), Coverage::Columns(columns)) => {
                    columns.insert(column.clone());
                }
            }
        }
        coverage
    }

    /// Coverage of one table, `None` if no rule reads it.
    pub fn covered_columns(&self, table: &str) -> Option<Coverage> {
        self.coverage().remove(table)
    }
}

/// The curated rule set.
pub fn all_mappings() -> &'static [ConfigMapping] {
    BUILTIN.as_slice()
}
