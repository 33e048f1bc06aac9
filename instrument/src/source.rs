//! Reference table loading.
//!
//! Tables are loaded once at process start through a [`ReferenceSource`],
//! fingerprinted, and then shared read-only behind an `Arc`.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archetypes::ArchetypeTable;
use crate::manifest::QuestionManifest;
use crate::types::{InstrumentError, Result};

/// Immutable reference data for one instrument version.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub manifest: QuestionManifest,
    pub archetypes: ArchetypeTable,
    /// SHA-256 over manifest and archetype table
    pub fingerprint: String,
}

impl ReferenceTables {
    pub fn new(manifest: QuestionManifest, archetypes: ArchetypeTable) -> Self {
        let fingerprint = compute_fingerprint(&manifest, &archetypes);
        Self {
            manifest,
            archetypes,
            fingerprint,
        }
    }

    /// Built-in v1 instrument.
    pub fn standard() -> Self {
        Self::new(QuestionManifest::standard(), ArchetypeTable::standard())
    }

    /// Fail unless the tables match a pinned fingerprint.
    pub fn verify_fingerprint(&self, expected: &str) -> Result<()> {
        if self.fingerprint == expected {
            Ok(())
        } else {
            Err(InstrumentError::FingerprintMismatch {
                expected: expected.to_string(),
                actual: self.fingerprint.clone(),
            })
        }
    }
}

fn compute_fingerprint(manifest: &QuestionManifest, archetypes: &ArchetypeTable) -> String {
    let mut hasher = Sha256::new();
    hasher.update(manifest.fingerprint().as_bytes());
    for archetype in archetypes.iter() {
        hasher.update(archetype.pair.code().as_bytes());
        hasher.update(archetype.name.as_bytes());
        hasher.update(archetype.essence.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Where reference tables come from.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Load and validate the tables.
    async fn load(&self) -> Result<ReferenceTables>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

/// Tables compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

#[async_trait]
impl ReferenceSource for BuiltinSource {
    async fn load(&self) -> Result<ReferenceTables> {
        Ok(ReferenceTables::standard())
    }

    fn describe(&self) -> String {
        "builtin".to_string()
    }
}

/// Tables read from a manifest file and a `ray_pairs.json` archetype file.
///
/// Manifests ending in `.yaml` or `.yml` are parsed as YAML, anything else
/// as JSON.
#[derive(Debug, Clone)]
pub struct FileSource {
    questions_path: PathBuf,
    ray_pairs_path: PathBuf,
}

impl FileSource {
    pub fn new(questions_path: impl Into<PathBuf>, ray_pairs_path: impl Into<PathBuf>) -> Self {
        Self {
            questions_path: questions_path.into(),
            ray_pairs_path: ray_pairs_path.into(),
        }
    }

    /// `questions.json` and `ray_pairs.json` inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("questions.json"), dir.join("ray_pairs.json"))
    }

    fn is_yaml(&self) -> bool {
        matches!(
            self.questions_path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        )
    }
}

#[async_trait]
impl ReferenceSource for FileSource {
    async fn load(&self) -> Result<ReferenceTables> {
        let questions = tokio::fs::read_to_string(&self.questions_path).await?;
        let manifest = if self.is_yaml() {
            QuestionManifest::from_yaml(&questions)?
        } else {
            QuestionManifest::from_json(&questions)?
        };

        let ray_pairs = tokio::fs::read_to_string(&self.ray_pairs_path).await?;
        let archetypes = ArchetypeTable::from_json(&ray_pairs)?;

        tracing::debug!(
            questions = manifest.len(),
            version = %manifest.version,
            "Loaded reference tables from files"
        );

        Ok(ReferenceTables::new(manifest, archetypes))
    }

    fn describe(&self) -> String {
        format!(
            "files({}, {})",
            self.questions_path.display(),
            self.ray_pairs_path.display()
        )
    }
}

/// Load tables once and freeze them, optionally pinning a fingerprint.
pub async fn load_tables(
    source: &dyn ReferenceSource,
    expected_fingerprint: Option<&str>,
) -> Result<Arc<ReferenceTables>> {
    let tables = source.load().await?;

    if let Some(expected) = expected_fingerprint {
        tables.verify_fingerprint(expected)?;
    }

    tracing::info!(
        source = %source.describe(),
        version = %tables.manifest.version,
        fingerprint = %tables.fingerprint,
        "Reference tables loaded"
    );

    Ok(Arc::new(tables))
}
