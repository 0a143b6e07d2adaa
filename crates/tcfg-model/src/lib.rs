#![deny(unsafe_code)]

pub mod error;
pub mod ids;
pub mod mapping;
pub mod path;
pub mod tree;

pub use error::{InvalidPathError, ModelError};
pub use ids::TenantId;
pub use mapping::{
    ColumnRef, Confidence, ConfigMapping, ConfigType, MappingReport, SourceCandidate,
    SourceScope, StructureKind, TableCatalogueEntry, TableColumn,
};
pub use path::ConfigPath;
pub use tree::{ConfigTree, IntegrationStatus, SHADOWED_KEY, Section, SectionKind};
