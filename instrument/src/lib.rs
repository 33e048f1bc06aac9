//! Reference data for the Light Signature assessment.
//!
//! The instrument is fixed: nine rays in three phases, four subfacets per
//! ray, and a versioned question manifest that measures them.
//!
//! - **Reconnect**: Intention, Joy, Presence
//! - **Radiate**: Power, Purpose, Authenticity
//! - **Become**: Connection, Possibility, Be The Light
//!
//! # Key Components
//!
//! - [`QuestionManifest`]: Ordered, validated question list with a SHA-256 fingerprint
//! - [`Tool`]: The twelve practice tools, `T001` through `T012`
//! - [`ArchetypeTable`]: The 36 named ray-pair archetypes
//! - [`ReferenceSource`]: Async seam for loading tables once at startup
//! - [`ReferenceTables`]: Frozen tables shared by the scoring engine
//!
//! # Example
//!
//! ```ignore
//! use instrument::{load_tables, FileSource};
//!
//! let tables = load_tables(&FileSource::from_dir("data"), None).await?;
//! assert_eq!(tables.archetypes.len(), 36);
//! ```

pub mod archetypes;
pub mod manifest;
pub mod rays;
pub mod source;
pub mod tools;
pub mod types;

// Re-export main types
pub use archetypes::{Archetype, ArchetypePair, ArchetypeTable, PAIR_COUNT};
pub use manifest::{QuestionManifest, STANDARD_VERSION};
pub use rays::RayDefinition;
pub use source::{load_tables, BuiltinSource, FileSource, ReferenceSource, ReferenceTables};
pub use tools::Tool;
pub use types::*;
