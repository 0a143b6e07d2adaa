mod common;

use std::sync::Arc;

use serde_json::json;
use tcfg_core::{ConfigSynthesizer, MemoryStore, ResolveError, StoreError, StoreFixture};
use tcfg_map::KnowledgeBase;
use tcfg_model::{ConfigPath, IntegrationStatus, SourceCandidate};

use common::{ScriptedStore, direct, tenant};

fn synthesizer(store: &Arc<ScriptedStore>) -> ConfigSynthesizer {
    ConfigSynthesizer::new(store.clone(), store.clone())
}

fn scripted(inner: MemoryStore) -> Arc<ScriptedStore> {
    Arc::new(ScriptedStore::new(inner))
}

#[test]
fn alpha_fcu_scenario() {
    let fixture: StoreFixture = serde_json::from_value(json!({
        "documents": {"alpha-fcu": {"tenant": {"name": "Alpha FCU"}}},
        "tables": {
            "cu_branding": [{"tenant_id": "alpha-fcu", "primary_color": "#112233"}]
        },
        "flags": {"alpha-fcu": {"bill_pay": true}}
    }))
    .unwrap();
    let store = scripted(MemoryStore::from_fixture(fixture));
    let tree = synthesizer(&store).resolve(&tenant("alpha-fcu")).unwrap();

    assert_eq!(tree.lookup("tenant.name").unwrap(), Some(&json!("Alpha FCU")));
    assert_eq!(
        tree.lookup("tokens.color.primary").unwrap(),
        Some(&json!("#112233"))
    );
    assert_eq!(
        tree.lookup("design.color.primary").unwrap(),
        Some(&json!("#112233"))
    );
    assert_eq!(tree.lookup("features.bill_pay").unwrap(), Some(&json!(true)));
    assert!(tree.feature_enabled("bill_pay"));
}

#[test]
fn flags_beat_document_and_tables() {
    let inner = MemoryStore::new()
        .with_document("t1", json!({"features": {"bill_pay": false, "p2p": true}}))
        .with_row(
            "cu_feature_settings",
            json!({"tenant_id": "t1", "bill_pay": false}),
        )
        .with_flag("t1", "bill_pay", true);
    let store = scripted(inner);
    let tree = synthesizer(&store).resolve(&tenant("t1")).unwrap();

    assert_eq!(tree.features.get("bill_pay"), Some(&json!(true)));
    assert_eq!(tree.features.get("p2p"), Some(&json!(true)));
}

#[test]
fn candidates_fall_back_in_order_and_stop_at_first_hit() {
    let kb = KnowledgeBase::from_mappings(vec![direct(
        "tenant.name",
        vec![
            SourceCandidate::new("first", "name"),
            SourceCandidate::new("second", "name"),
            SourceCandidate::new("third", "name"),
        ],
    )]);
    let inner = MemoryStore::new()
        .with_row("first", json!({"tenant_id": "t1", "name": null}))
        .with_row("second", json!({"tenant_id": "t1", "name": "From Second"}))
        .with_row("third", json!({"tenant_id": "t1", "name": "From Third"}));
    let store = scripted(inner);
    let tree = synthesizer(&store)
        .with_knowledge_base(kb)
        .resolve(&tenant("t1"))
        .unwrap();

    assert_eq!(tree.lookup("tenant.name").unwrap(), Some(&json!("From Second")));
    assert_eq!(store.row_calls(), vec!["first", "second"]);
}

#[test]
fn unmatched_rules_leave_document_values() {
    let inner = MemoryStore::new()
        .with_document(
            "t1",
            json!({
                "tenant": {"name": "Doc Name", "region": "west"},
                "design": {"color": {"primary": "#000000", "surface": "#ffffff"}},
                "fraud": {"thresholds": {"wire": 1000, "ach": 500}},
                "custom_widget": {"size": 3}
            }),
        )
        .with_row(
            "cu_branding",
            json!({"tenant_id": "t1", "primary_color": "#abcdef"}),
        )
        .with_row(
            "cu_fraud_settings",
            json!({"tenant_id": "t1", "thresholds": {"ach": 750}}),
        );
    let store = scripted(inner);
    let tree = synthesizer(&store).resolve(&tenant("t1")).unwrap();

    assert_eq!(tree.lookup("tenant.name").unwrap(), Some(&json!("Doc Name")));
    assert_eq!(tree.lookup("tenant.region").unwrap(), Some(&json!("west")));
    assert_eq!(tree.lookup("tokens.color.primary").unwrap(), Some(&json!("#abcdef")));
    assert_eq!(tree.lookup("tokens.color.surface").unwrap(), Some(&json!("#ffffff")));
    assert_eq!(
        tree.lookup("fraud.thresholds").unwrap(),
        Some(&json!({"wire": 1000, "ach": 750}))
    );
    assert_eq!(tree.extra.get("custom_widget"), Some(&json!({"size": 3})));
}

#[test]
fn single_table_failure_is_not_fatal() {
    let inner = MemoryStore::new()
        .with_row("cu_profiles", json!({"tenant_id": "t1", "display_name": "T One"}))
        .with_row("cu_branding", json!({"tenant_id": "t1", "primary_color": "#111"}));
    let store = Arc::new(
        ScriptedStore::new(inner)
            .fail_table("cu_branding", StoreError::query("cu_branding", "timeout")),
    );
    let synthesis = synthesizer(&store)
        .resolve_with_stats(&tenant("t1"))
        .unwrap();

    assert_eq!(
        synthesis.tree.lookup("tenant.name").unwrap(),
        Some(&json!("T One"))
    );
    assert_eq!(synthesis.tree.lookup("tokens.color.primary").unwrap(), None);
    assert_eq!(synthesis.stats.fetch_failures, 1);
}

#[test]
fn unreachable_document_store_is_unavailable() {
    let mut store = ScriptedStore::new(
        MemoryStore::new().with_document("t1", json!({"tenant": {"name": "x"}})),
    );
    store.document_error = Some(StoreError::unavailable("connection refused"));
    let store = Arc::new(store);
    let err = synthesizer(&store).resolve(&tenant("t1")).unwrap_err();

    assert!(matches!(err, ResolveError::StoreUnavailable { .. }));
    assert!(store.row_calls().is_empty());
}

#[test]
fn document_survives_unreachable_tables() {
    let mut store = ScriptedStore::new(
        MemoryStore::new().with_document("t1", json!({"tenant": {"name": "x"}})),
    );
    store.every_table_error = Some(StoreError::unavailable("pool exhausted"));
    let store = Arc::new(store);
    let synthesis = synthesizer(&store)
        .resolve_with_stats(&tenant("t1"))
        .unwrap();

    assert_eq!(synthesis.tree.lookup("tenant.name").unwrap(), Some(&json!("x")));
    assert!(synthesis.stats.document_found);
    assert_eq!(synthesis.stats.candidate_hits, 0);
    assert_eq!(
        synthesis.stats.fetch_failures,
        synthesis.stats.tables_queried
    );
    assert!(synthesis.stats.tables_queried > 0);
}

#[test]
fn every_table_unreachable_without_document_is_unavailable() {
    let mut store = ScriptedStore::new(MemoryStore::new().with_flag("t1", "p2p", true));
    store.every_table_error = Some(StoreError::unavailable("pool exhausted"));
    let store = Arc::new(store);
    let err = synthesizer(&store).resolve(&tenant("t1")).unwrap_err();

    match err {
        ResolveError::StoreUnavailable { message } => assert_eq!(message, "pool exhausted"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_tenant_is_not_found() {
    let store = scripted(
        MemoryStore::new()
            .with_row("cu_profiles", json!({"tenant_id": "other", "display_name": "Other"})),
    );
    let err = synthesizer(&store).resolve(&tenant("ghost")).unwrap_err();
    assert!(matches!(err, ResolveError::TenantNotFound { tenant } if tenant.as_str() == "ghost"));
}

#[test]
fn global_rows_are_not_tenant_evidence() {
    let inner = MemoryStore::new().with_row("ivr_defaults", json!({"language": "en-US"}));
    let store = scripted(inner.clone());
    let err = synthesizer(&store).resolve(&tenant("t1")).unwrap_err();
    assert!(matches!(err, ResolveError::TenantNotFound { .. }));

    let store = scripted(inner.with_flag("t1", "p2p", false));
    let tree = synthesizer(&store).resolve(&tenant("t1")).unwrap();
    assert_eq!(tree.lookup("channels.ivr.language").unwrap(), Some(&json!("en-US")));
    assert!(!tree.feature_enabled("p2p"));
}

#[test]
fn structures_shape_values() {
    let inner = MemoryStore::new()
        .with_document("t1", json!({"settings": {"slug": "t-one"}}))
        .with_row("cu_products", json!({"tenant_id": "t1", "name": "Checking"}))
        .with_row("cu_products", json!({"tenant_id": "t1", "name": "Savings"}))
        .with_row("cu_products", json!({"tenant_id": "t2", "name": "Other"}))
        .with_row("cu_core_connections", json!({"tenant_id": "t1", "host": "core.local"}))
        .with_row(
            "cu_integrations",
            json!({"tenant_id": "t1", "analytics": {"enabled": false, "vendor": "acme"}}),
        );
    let store = scripted(inner);
    let tree = synthesizer(&store).resolve(&tenant("t1")).unwrap();

    let accounts = tree.lookup("products.accounts").unwrap().unwrap();
    assert_eq!(accounts.as_array().map(Vec::len), Some(2));
    assert_eq!(accounts[1]["name"], json!("Savings"));
    assert_eq!(tree.lookup("tenant.slug").unwrap(), Some(&json!("t-one")));
    assert_eq!(
        tree.integration_status("core_banking"),
        IntegrationStatus::Enabled
    );
    assert_eq!(tree.integration_status("analytics"), IntegrationStatus::Disabled);
    assert_eq!(
        tree.integration_status("card_processor"),
        IntegrationStatus::NotConfigured
    );
}

#[test]
fn each_table_is_fetched_once_per_resolve() {
    let inner = MemoryStore::new().with_row(
        "cu_profiles",
        json!({"tenant_id": "t1", "legal_name": "T One Credit Union"}),
    );
    let store = scripted(inner);
    let synthesis = synthesizer(&store)
        .resolve_with_stats(&tenant("t1"))
        .unwrap();

    assert_eq!(store.queried("cu_profiles"), 1);
    assert_eq!(
        synthesis.tree.lookup("tenant.name").unwrap(),
        Some(&json!("T One Credit Union"))
    );
    assert_eq!(synthesis.stats.tables_queried, store.row_calls().len());
}

#[test]
fn flag_failure_keeps_resolved_features() {
    let mut store = ScriptedStore::new(
        MemoryStore::new().with_document("t1", json!({"features": {"bill_pay": true}})),
    );
    store.flag_error = Some(StoreError::query("feature_flags", "denied"));
    let store = Arc::new(store);
    let tree = synthesizer(&store).resolve(&tenant("t1")).unwrap();
    assert!(tree.feature_enabled("bill_pay"));
}

#[test]
fn unusable_flag_names_are_skipped() {
    let inner = MemoryStore::new()
        .with_flag("t1", "ok_flag", true)
        .with_flag("t1", "bad.flag", true);
    let store = scripted(inner);
    let synthesis = synthesizer(&store)
        .resolve_with_stats(&tenant("t1"))
        .unwrap();
    assert_eq!(synthesis.stats.flags_applied, 1);
    let bad = ConfigPath::parse("features.bad.flag").unwrap();
    assert_eq!(synthesis.tree.get(&bad), None);
}
