use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tcfg_cli::summary::{mapping_table, print_report, stats_table};
use tcfg_core::{ConfigSynthesizer, EngineSettings, MemoryStore, Synthesis, load_settings};
use tcfg_map::{HeuristicAnalyzer, KnowledgeBase, ReportGenerator};
use tcfg_model::{Confidence, ConfigMapping, TableCatalogueEntry, TenantId};
use tracing::{debug, info, info_span};

use crate::cli::{MappingsArgs, OutputFormatArg, ReportArgs, ResolveArgs};

pub fn load_engine_settings(path: Option<&Path>) -> Result<EngineSettings> {
    match path {
        Some(path) => load_settings(path)
            .with_context(|| format!("load settings {}", path.display())),
        None => Ok(EngineSettings::default()),
    }
}

pub fn run_resolve(args: &ResolveArgs, settings: &EngineSettings) -> Result<()> {
    let tenant = TenantId::new(args.tenant.as_str()).context("invalid tenant id")?;
    let span = info_span!("resolve_command", tenant = %tenant);
    let _guard = span.enter();

    let store = MemoryStore::load(&args.fixture)
        .context("load store fixture")?
        .with_tenant_column(settings.tenant_column.as_str());
    let store = Arc::new(store);
    let synthesizer = ConfigSynthesizer::new(store.clone(), store);
    let Synthesis { tree, stats } = synthesizer
        .resolve_with_stats(&tenant)
        .with_context(|| format!("resolve tenant {tenant}"))?;

    let output = match &args.path {
        Some(raw) => match tree.lookup(raw).context("invalid --path")? {
            Some(value) => serde_json::to_string_pretty(value)?,
            None => bail!("no value at {raw} for tenant {tenant}"),
        },
        None => serde_json::to_string_pretty(&tree)?,
    };
    println!("{output}");
    if args.stats {
        eprintln!("{}", stats_table(&stats));
    }
    Ok(())
}

pub fn run_report(args: &ReportArgs, settings: &EngineSettings) -> Result<()> {
    let path = &args.catalogue;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read catalogue {}", path.display()))?;
    let catalogue: Vec<TableCatalogueEntry> = serde_json::from_str(&contents)
        .with_context(|| format!("parse catalogue {}", path.display()))?;
    debug!(entries = catalogue.len(), "loaded table catalogue");

    let generator = ReportGenerator::default()
        .with_analyzer(HeuristicAnalyzer::new(&settings.tenant_table_prefix));
    let report = generator.generate(&catalogue);
    info!(
        high = report.high_confidence.len(),
        medium = report.medium_confidence.len(),
        low = report.low_confidence.len(),
        unmapped = report.unmapped.len(),
        skipped = report.skipped_entries,
        "generated mapping report"
    );

    match args.format {
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormatArg::Table => print_report(&report),
    }
    Ok(())
}

pub fn run_mappings(args: &MappingsArgs) -> Result<()> {
    let knowledge_base = KnowledgeBase::builtin();
    let confidence = args.confidence.map(Confidence::from);
    let selected: Vec<&ConfigMapping> = knowledge_base
        .all_mappings()
        .iter()
        .filter(|mapping| confidence.is_none_or(|level| mapping.confidence == level))
        .filter(|mapping| {
            args.table
                .as_deref()
                .is_none_or(|table| mapping.tables().any(|t| t == table))
        })
        .collect();

    match args.format {
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&selected)?),
        OutputFormatArg::Table => {
            println!("{}", mapping_table(selected.iter().copied()));
            println!("{} of {} rules", selected.len(), knowledge_base.len());
        }
    }
    Ok(())
}
