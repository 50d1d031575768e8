//! MondoSource against a mock HTTP server

use gda_ingest::cache::{Memoizer, PayloadFormat, ResultStore};
use gda_ingest::config::IngestConfig;
use gda_ingest::mondo::MondoSource;
use gda_ingest::IngestError;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SAMPLE: &str = include_str!("fixtures/mondo_sample.obo");

async fn serve(status: u16, expected_requests: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mondo.obo"))
        .respond_with(ResponseTemplate::new(status).set_body_string(SAMPLE))
        .expect(expected_requests)
        .mount(&server)
        .await;
    server
}

fn setup(server: &MockServer) -> (IngestConfig, Memoizer, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = IngestConfig::builder()
        .cache_dir(dir.path())
        .mondo_obo_url(format!("{}/mondo.obo", server.uri()))
        .timeout_secs(5)
        .build();
    let memoizer = Memoizer::new(ResultStore::open(dir.path()).unwrap());
    (config, memoizer, dir)
}

#[tokio::test]
async fn test_rare_table_downloads_once() {
    let server = serve(200, 1).await;
    let (config, memoizer, _dir) = setup(&server);
    let source = MondoSource::new(&config).unwrap();

    let first = source.rare_disease_table(&memoizer).await.unwrap();
    let second = source.rare_disease_table(&memoizer).await.unwrap();
    let graph = source.term_graph(&memoizer).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(first.get(0, "mondo_id"), Some("MONDO:0008199"));
    assert_eq!(graph.len(), 8);

    let entries = memoizer.store().list().unwrap();
    let mut operations: Vec<_> = entries.iter().map(|e| e.operation.as_str()).collect();
    operations.sort_unstable();
    assert_eq!(operations, vec!["download_mondo_obo_file", "mondo_ontology"]);
    assert!(entries
        .iter()
        .any(|e| e.format == PayloadFormat::Tabular && e.operation == "mondo_ontology"));
}

#[tokio::test]
async fn test_rare_terms_carry_categories() {
    let server = serve(200, 1).await;
    let (config, memoizer, _dir) = setup(&server);
    let source = MondoSource::new(&config).unwrap();

    let terms = source.rare_disease_terms(&memoizer).await.unwrap();
    let pd = &terms["MONDO:0008199"];
    assert_eq!(pd.category_name, "nervous system disorder");
    assert_eq!(pd.name(), "late-onset Parkinson disease");
}

#[tokio::test]
async fn test_zero_freshness_refetches() {
    let server = serve(200, 2).await;
    let (config, memoizer, _dir) = setup(&server);
    let memoizer = memoizer.with_freshness(Duration::ZERO);
    let source = MondoSource::new(&config).unwrap();

    source.rare_disease_table(&memoizer).await.unwrap();
    source.rare_disease_table(&memoizer).await.unwrap();
}

#[tokio::test]
async fn test_server_error_writes_nothing() {
    let server = serve(500, 1).await;
    let (config, memoizer, _dir) = setup(&server);
    let source = MondoSource::new(&config).unwrap();

    let err = source.rare_disease_table(&memoizer).await.unwrap_err();
    assert!(matches!(err, IngestError::Fetch(_)));
    assert!(err.is_transient());
    assert!(memoizer.store().list().unwrap().is_empty());
}

#[tokio::test]
async fn test_checksum_mismatch_is_rejected() {
    let server = serve(200, 1).await;
    let (config, memoizer, _dir) = setup(&server);
    let config = IngestConfig {
        mondo_obo_sha256: Some("0".repeat(64)),
        ..config
    };
    let source = MondoSource::new(&config).unwrap();

    let err = source.term_graph(&memoizer).await.unwrap_err();
    assert!(matches!(
        err,
        IngestError::Common(gda_common::GdaError::ChecksumMismatch { .. })
    ));
    assert!(memoizer.store().list().unwrap().is_empty());
}

async fn serve_body(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mondo.obo"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn single_rare_term(id: &str) -> String {
    format!(
        "[Term]\nid: MONDO:1\nname: category\nis_a: {root}\n\n[Term]\nid: {id}\nname: rare term\nsubset: rare\nis_a: MONDO:1\n",
        root = gda_ingest::mondo::MONDO_ROOT_ID
    )
}

#[tokio::test]
async fn test_each_url_gets_its_own_table() {
    let mirror_a = serve_body(&single_rare_term("MONDO:2")).await;
    let mirror_b = serve_body(&single_rare_term("MONDO:3")).await;
    let dir = TempDir::new().unwrap();
    let memoizer = Memoizer::new(ResultStore::open(dir.path()).unwrap());

    let source_for = |server: &MockServer| {
        let config = IngestConfig::builder()
            .cache_dir(dir.path())
            .mondo_obo_url(format!("{}/mondo.obo", server.uri()))
            .timeout_secs(5)
            .build();
        MondoSource::new(&config).unwrap()
    };

    let table_a = source_for(&mirror_a).rare_disease_table(&memoizer).await.unwrap();
    let table_b = source_for(&mirror_b).rare_disease_table(&memoizer).await.unwrap();

    assert_eq!(table_a.get(0, "mondo_id"), Some("MONDO:2"));
    assert_eq!(table_b.get(0, "mondo_id"), Some("MONDO:3"));
    assert_eq!(table_b.get(0, "category"), Some("category"));
    assert_eq!(memoizer.store().list().unwrap().len(), 4);
}

#[tokio::test]
async fn test_pinned_checksum_accepts_matching_download() {
    let server = serve(200, 1).await;
    let (config, memoizer, _dir) = setup(&server);
    let config = IngestConfig {
        mondo_obo_sha256: Some(gda_common::checksum::sha256_hex(SAMPLE.as_bytes())),
        ..config
    };
    let source = MondoSource::new(&config).unwrap();

    let table = source.rare_disease_table(&memoizer).await.unwrap();
    assert_eq!(table.len(), 3);
}
