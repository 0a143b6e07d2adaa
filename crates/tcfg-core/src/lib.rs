#![deny(unsafe_code)]

pub mod cache;
pub mod error;
pub mod memory;
pub mod resolver;
pub mod settings;
pub mod store;
pub mod synthesizer;

pub use cache::{CachedEntry, Clock, ManualClock, ResolutionCache, SystemClock};
pub use error::{FixtureError, ResolveError, SettingsError, StoreError};
pub use memory::{DEFAULT_TENANT_COLUMN, MemoryStore, StoreFixture};
pub use resolver::{ConfigResolver, ResolveOptions};
pub use settings::{DEFAULT_CACHE_TTL_SECS, EngineSettings, load_settings};
pub use store::{FlagRow, FlagStore, RecordStore, Row};
pub use synthesizer::{ConfigSynthesizer, Synthesis, SynthesisStats};
