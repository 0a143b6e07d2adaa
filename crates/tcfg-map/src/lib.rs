#![deny(unsafe_code)]

pub mod heuristics;
pub mod knowledge_base;
pub mod report;

pub use heuristics::{
    DEFAULT_TENANT_PREFIX, HeuristicAnalyzer, NamePredicate, TablePattern, semantic_type,
};
pub use knowledge_base::{Coverage, DOCUMENT_TABLE, KnowledgeBase, all_mappings};
pub use report::{ReportGenerator, generate_report};
