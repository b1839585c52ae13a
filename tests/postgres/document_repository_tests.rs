//! `PostgreSQL` integration tests for document lookups.

use super::helpers::{GRAPH, SeedDocument, TestDatabase, test_runtime};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use publication_mailer::{
    config::DEFAULT_CHANNEL,
    publication::{
        adapters::postgres::PostgresDocumentRepository,
        domain::{AttachmentUri, ContactPointKind, DocumentUri, GraphUri},
        ports::{DocumentRepository, LookupError},
    },
};
use rstest::rstest;
use serde_json::json;

const DOCUMENT: &str = "http://example.org/documents/release";

fn graph() -> GraphUri {
    GraphUri::new(GRAPH).expect("valid graph")
}

fn document() -> DocumentUri {
    DocumentUri::new(DOCUMENT).expect("valid document")
}

#[rstest]
fn document_sources_and_attachments_are_loaded(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "document_lookup");
    let repo = PostgresDocumentRepository::new(db.pool());
    let rt = test_runtime();
    db.seed_document(&SeedDocument {
        id: DOCUMENT,
        title: Some("Nieuwe maatregelen"),
        event: "http://example.org/events/release",
        sources: json!([{
            "full_name": "Jan Peeters",
            "role": "Woordvoerder",
            "contact_points": [
                { "kind": "mobile", "value": "+32 470 00 00 00", "channel": DEFAULT_CHANNEL }
            ]
        }]),
        attachments: json!(["http://example.org/files/annex.pdf"]),
    });

    let found = rt
        .block_on(repo.find_document(&graph(), &document()))
        .expect("lookup should succeed")
        .expect("document should exist");
    let sources = rt
        .block_on(repo.find_sources(&graph(), &document()))
        .expect("source lookup should succeed");
    let attachments = rt
        .block_on(repo.find_attachments(&graph(), &document()))
        .expect("attachment lookup should succeed");

    assert_eq!(found.title(), "Nieuwe maatregelen");
    assert_eq!(found.creator().name.as_deref(), Some("Kanselarij"));
    let [source] = sources.as_slice() else {
        panic!("expected one source, got {sources:?}");
    };
    assert_eq!(source.full_name(), "Jan Peeters");
    assert_eq!(source.role(), Some("Woordvoerder"));
    assert!(
        source
            .contact_points()
            .iter()
            .any(|point| point.kind == ContactPointKind::Mobile)
    );
    let stored: Vec<&str> = attachments.iter().map(AttachmentUri::as_str).collect();
    assert_eq!(stored, vec!["http://example.org/files/annex.pdf"]);
}

#[rstest]
fn documents_without_a_title_are_malformed(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "document_malformed");
    let repo = PostgresDocumentRepository::new(db.pool());
    let rt = test_runtime();
    db.seed_document(&SeedDocument {
        id: DOCUMENT,
        title: None,
        event: "http://example.org/events/release",
        sources: json!([]),
        attachments: json!([]),
    });

    let result = rt.block_on(repo.find_document(&graph(), &document()));

    assert!(matches!(result, Err(LookupError::Malformed(_))), "got {result:?}");
}

#[rstest]
fn unknown_documents_have_no_sources(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "document_missing");
    let repo = PostgresDocumentRepository::new(db.pool());
    let rt = test_runtime();

    let found = rt
        .block_on(repo.find_document(&graph(), &document()))
        .expect("lookup should succeed");
    let sources = rt
        .block_on(repo.find_sources(&graph(), &document()))
        .expect("source lookup should succeed");

    assert!(found.is_none());
    assert!(sources.is_empty());
}
