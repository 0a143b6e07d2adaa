//! Confidence classification of a full table catalogue.

use tcfg_model::{MappingReport, TableCatalogueEntry, TableColumn};
use tracing::{debug, warn};

use crate::heuristics::HeuristicAnalyzer;
use crate::knowledge_base::KnowledgeBase;

/// Classifies every catalogued column as high/medium/low or unmapped.
///
/// Knowledge base rules are reported as declared. Columns the knowledge base
/// does not read go through the heuristic analyzer; a suggestion landing on a
/// path some rule already maps is dropped. A table is unmapped only
/// when no rule references it and the analyzer has nothing to say about it.
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    knowledge_base: KnowledgeBase,
    analyzer: HeuristicAnalyzer,
}

impl ReportGenerator {
    pub fn new(knowledge_base: KnowledgeBase, analyzer: HeuristicAnalyzer) -> Self {
        Self {
            knowledge_base,
            analyzer,
        }
    }

    pub fn with_analyzer(mut self, analyzer: HeuristicAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn generate(&self, tables: &[TableCatalogueEntry]) -> MappingReport {
        let mut report = MappingReport::default();
        for mapping in self.knowledge_base.all_mappings() {
            report.push(mapping.clone());
        }

        let coverage = self.knowledge_base.coverage();
        for entry in tables {
            let Some(table) = entry.name() else {
                warn!(
                    columns = entry.columns.len(),
                    "skipping catalogue entry without a table name"
                );
                report.skipped_entries += 1;
                continue;
            };

            let covered = coverage.get(table);
            let uncovered: Vec<TableColumn> = entry
                .columns
                .iter()
                .filter(|column| covered.is_none_or(|c| !c.covers(&column.column_name)))
                .cloned()
                .collect();
            if covered.is_some() && uncovered.is_empty() {
                continue;
            }

            let suggestions = self.analyzer.analyze(table, &uncovered);
            if suggestions.is_empty() {
                if covered.is_none() && !report.is_unmapped(table) {
                    report.unmapped.push(table.to_string());
                }
                continue;
            }
            debug!(table, count = suggestions.len(), "heuristic suggestions");
            for suggestion in suggestions {
                if let Some(rule) = self.knowledge_base.mapping_for_path(&suggestion.config_path) {
                    debug!(
                        path = %suggestion.config_path,
                        rule_confidence = %rule.confidence,
                        "dropping suggestion for a path the knowledge base already maps"
                    );
                    continue;
                }
                report.push(suggestion);
            }
        }
        report
    }
}

/// Builds a report with the curated knowledge base and default heuristics.
pub fn generate_report(tables: &[TableCatalogueEntry]) -> MappingReport {
    ReportGenerator::default().generate(tables)
}
