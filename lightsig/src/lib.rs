//! Light Signature scoring engine.
//!
//! Turns one completed response packet into a deterministic
//! [`AssessmentOutputV1`]: ray scores, the eclipse picture, the light
//! signature archetype, recommendations and data-quality verdicts.
//!
//! - **Intake**: Strict validation against the question manifest
//! - **Eclipse**: Load dimensions, EER, BRI and gating
//! - **Signature**: Top-two archetype and Rise Path
//! - **Signals**: Acting-vs-capacity and data quality
//! - **Validity**: Social desirability, consistency, attention and coverage checks
//! - **Tools**: Usage, access and distortion per practice tool
//! - **Executive**: Twenty-four leadership signals banded from rays and tools
//! - **Trend**: Decline warnings across retakes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ScoringEngine                          │
//! │                                                              │
//! │  ┌────────┐  ┌─────────┐  ┌───────────┐  ┌──────────┐        │
//! │  │ Intake │──│ Eclipse │──│ Aggregate │──│ Analyze  │        │
//! │  └────────┘  └─────────┘  └───────────┘  └────┬─────┘        │
//! │                                               │              │
//! │  ┌──────────┐  ┌────────────┐  ┌───────────┐  │              │
//! │  │ Assemble │──│ Edge cases │──│ Signature │──┘ Signals      │
//! │  └──────────┘  └────────────┘  └───────────┘                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lightsig::{ResponsePacket, ScoringEngine, Tier};
//!
//! let engine = ScoringEngine::standard();
//! let output = engine.score(&ResponsePacket::new(Tier::Full, responses))?;
//! println!("{}", output.light_signature.archetype.name);
//! ```

pub mod aggregate;
pub mod config;
pub mod eclipse;
pub mod edge_cases;
pub mod error;
pub mod executive;
pub mod intake;
pub mod output;
pub mod pipeline;
pub mod recommend;
pub mod signals;
pub mod signature;
pub mod tools;
pub mod trend;
pub mod types;
pub mod validity;

// Re-export main types
pub use config::ScoringConfig;
pub use error::{ErrorKind, Result, ScoringError, ValidationReport};
pub use intake::{Response, ResponsePacket, ResponseSet, Tier};
pub use output::{AssessmentOutputV1, AssessmentRun};
pub use pipeline::ScoringEngine;
pub use trend::{analyze_trends, RunSnapshot, TrendReport};
pub use types::*;
