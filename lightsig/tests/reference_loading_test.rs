//! Reference tables loaded from disk drive the engine the same way as the
//! built-in instrument

use instrument::{load_tables, Archetype, ArchetypeTable, FileSource, QuestionManifest};
use lightsig::{ErrorKind, Response, ResponsePacket, ScoringConfig, ScoringEngine, ScoringError, Tier};
use std::path::Path;

fn write_tables(dir: &Path, rename: Option<(&str, &str)>) {
    let manifest = QuestionManifest::standard();
    std::fs::write(
        dir.join("questions.json"),
        serde_json::to_string(&manifest).expect("manifest serializes"),
    )
    .expect("write questions");

    let entries: Vec<Archetype> = ArchetypeTable::standard()
        .iter()
        .cloned()
        .map(|mut a| {
            if let Some((code, name)) = rename {
                if a.pair.code() == code {
                    a.name = name.to_string();
                }
            }
            a
        })
        .collect();
    std::fs::write(
        dir.join("ray_pairs.json"),
        serde_json::to_string(&entries).expect("archetypes serialize"),
    )
    .expect("write ray pairs");
}

fn full_packet(manifest: &QuestionManifest) -> ResponsePacket {
    let responses = manifest
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| Response::new(q.id.clone(), ((i * 7 + q.ray_id.number() as usize) % 5) as i32))
        .collect();
    ResponsePacket::new(Tier::Full, responses)
}

#[tokio::test]
async fn test_file_tables_match_builtin() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_tables(dir.path(), None);

    let tables = load_tables(&FileSource::from_dir(dir.path()), None)
        .await
        .expect("tables load");
    let builtin = ScoringEngine::standard();
    assert_eq!(tables.fingerprint, builtin.tables().fingerprint);

    let engine = ScoringEngine::new(tables.clone(), ScoringConfig::default()).expect("engine");
    let packet = full_packet(&tables.manifest);
    let from_files = engine.score(&packet).expect("scores");
    let from_builtin = builtin.score(&packet).expect("scores");

    assert_eq!(from_files.rays, from_builtin.rays);
    assert_eq!(from_files.light_signature, from_builtin.light_signature);
}

#[tokio::test]
async fn test_renamed_archetype_flows_through() {
    let dir = tempfile::tempdir().expect("temp dir");
    let engine = ScoringEngine::standard();
    let packet = full_packet(&engine.tables().manifest);
    let code = engine
        .score(&packet)
        .expect("scores")
        .light_signature
        .archetype
        .pair_code;

    write_tables(dir.path(), Some((code.as_str(), "Lantern Keeper")));
    let tables = load_tables(&FileSource::from_dir(dir.path()), None)
        .await
        .expect("tables load");

    let output = ScoringEngine::new(tables, ScoringConfig::default())
        .expect("engine")
        .score(&packet)
        .expect("scores");
    assert_eq!(output.light_signature.archetype.name, "Lantern Keeper");
}

#[test]
fn test_pinned_fingerprint_mismatch_is_configuration_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_tables(dir.path(), None);

    let result = tokio_test::block_on(load_tables(
        &FileSource::from_dir(dir.path()),
        Some("0000000000000000000000000000000000000000000000000000000000000000"),
    ));
    let err: ScoringError = result.unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_missing_files_are_configuration_errors() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = tokio_test::block_on(load_tables(&FileSource::from_dir(dir.path()), None));
    let err: ScoringError = result.unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
