mod common;

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{import_json, memory_json, MockServer, Reply, ACCESS_KEY_ID, ACCESS_KEY_SECRET};
use lara_sdk::{LaraError, MemoryImport, RequestSigner, TranslationUnit};

#[tokio::test]
async fn test_missing_memory_is_none() {
    let server = MockServer::start(|request| match request.path.as_str() {
        "/memories/mem_1" => Reply::content(memory_json("mem_1", "Legal")),
        _ => Reply::not_found(),
    })
    .await;
    let translator = server.translator();

    let found = translator.memories.get("mem_1").await.unwrap();
    assert_eq!(found.map(|m| m.name), Some("Legal".to_string()));

    assert!(translator.memories.get("mem_404").await.unwrap().is_none());
    assert_eq!(
        server.request_to("/memories/mem_404").method_override(),
        Some("GET")
    );
}

#[tokio::test]
async fn test_not_found_outside_get_is_an_error() {
    let server = MockServer::start(|_| Reply::not_found()).await;
    let translator = server.translator();

    let err = translator.memories.delete("mem_404").await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_server_error_on_get_propagates() {
    let server = MockServer::start(|_| {
        Reply::json(500, json!({ "error": { "type": "InternalError", "message": "boom" } }))
    })
    .await;
    let translator = server.translator();

    let err = translator.glossaries.get("gls_1").await.unwrap_err();
    assert!(matches!(err, LaraError::ApiError { status_code: 500, .. }));
}

#[tokio::test]
async fn test_memory_crud_paths() {
    let server = MockServer::start(|request| match request.path.as_str() {
        "/memories" => match request.method_override() {
            Some("GET") => Reply::content(json!([memory_json("mem_1", "Legal")])),
            _ => Reply::content(memory_json("mem_2", "Marketing")),
        },
        "/memories/connect" => Reply::content(json!([memory_json("mem_9", "Shared")])),
        _ => Reply::content(memory_json("mem_2", "Renamed")),
    })
    .await;
    let translator = server.translator();

    let memories = translator.memories.list().await.unwrap();
    assert_eq!(memories.len(), 1);

    let created = translator.memories.create("Marketing", None).await.unwrap();
    assert_eq!(created.id, "mem_2");

    let updated = translator.memories.update("mem_2", "Renamed").await.unwrap();
    assert_eq!(updated.name, "Renamed");
    let update = server.request_to("/memories/mem_2");
    assert_eq!(update.method_override(), Some("PUT"));
    assert_eq!(update.json(), json!({ "name": "Renamed" }));

    let connected = translator.memories.connect(&["mem_9"]).await.unwrap();
    assert_eq!(connected[0].id, "mem_9");
}

#[tokio::test]
async fn test_connect_one_memory() {
    let server = MockServer::start(|request| match request.json()["ids"][0].as_str() {
        Some("mem_9") => Reply::content(json!([memory_json("mem_9", "Shared")])),
        _ => Reply::content(json!([])),
    })
    .await;
    let translator = server.translator();

    let connected = translator.memories.connect_one("mem_9").await.unwrap();
    assert_eq!(connected.map(|m| m.id), Some("mem_9".to_string()));

    let request = server.request_to("/memories/connect");
    assert_eq!(request.method_override(), Some("POST"));
    assert_eq!(request.json(), json!({ "ids": ["mem_9"] }));

    assert!(translator.memories.connect_one("mem_404").await.unwrap().is_none());
}

#[tokio::test]
async fn test_tmx_import_is_multipart_and_polled() {
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = polls.clone();
    let server = MockServer::start(move |request| match request.path.as_str() {
        "/memories/mem_1/import" => Reply::content(import_json("imp_1", 0.0)),
        "/memories/imports/imp_1" => {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let progress = [0.4, 0.8, 1.0][n.min(2)];
            Reply::content(import_json("imp_1", progress))
        }
        _ => Reply::not_found(),
    })
    .await;
    let translator = server.translator();

    let dir = tempfile::tempdir().unwrap();
    let tmx = dir.path().join("sample.tmx.gz");
    std::fs::write(&tmx, b"tmx-bytes").unwrap();

    let import = translator
        .memories
        .import_tmx("mem_1", &tmx, None)
        .await
        .unwrap();
    assert_eq!(import.progress, 0.0);

    let mut seen = Vec::new();
    let done = translator
        .memories
        .wait_for_import(
            import,
            Some(|job: &MemoryImport| seen.push(job.progress)),
            None,
        )
        .await
        .unwrap();

    assert_eq!(done.progress, 1.0);
    assert_eq!(seen, vec![0.4, 0.8, 1.0]);
    assert_eq!(polls.load(Ordering::SeqCst), 3);

    let request = server.request_to("/memories/mem_1/import");
    let content_type = request.header("content-type").unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert!(request.header("content-md5").is_none());

    let body = request.body_text();
    assert!(body.contains("name=\"tmx\"; filename=\"sample.tmx.gz\""));
    assert!(body.contains("tmx-bytes"));
    assert!(body.contains("name=\"compression\""));
    assert!(body.contains("gzip"));

    let date = request.header("date").unwrap();
    let signer = RequestSigner::new(ACCESS_KEY_ID, ACCESS_KEY_SECRET);
    let expected = signer.authorization(
        "POST",
        "/memories/mem_1/import",
        "",
        "multipart/form-data",
        date,
    );
    assert_eq!(request.header("authorization"), Some(expected.as_str()));
}

#[tokio::test]
async fn test_import_wait_times_out() {
    let server = MockServer::start(|_| Reply::content(import_json("imp_1", 0.5))).await;
    let translator = server.translator();

    let import = translator.memories.get_import_status("imp_1").await.unwrap();
    let err = translator
        .memories
        .wait_for_import(
            import,
            None::<fn(&MemoryImport)>,
            Some(std::time::Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LaraError::TimeoutError { .. }));
}

#[tokio::test]
async fn test_translation_unit_paths() {
    let server = MockServer::start(|_| Reply::content(import_json("imp_2", 0.0))).await;
    let translator = server.translator();
    let unit = TranslationUnit::new("en-US", "it-IT", "Hello", "Ciao").with_tuid("tu-1");

    translator
        .memories
        .add_translation(&["mem_1"], &unit, None)
        .await
        .unwrap();
    translator
        .memories
        .delete_translation(&["mem_1", "mem_2"], &unit)
        .await
        .unwrap();

    let single = server.request_to("/memories/mem_1/content");
    assert_eq!(single.method_override(), Some("PUT"));
    assert_eq!(single.json()["tuid"], json!("tu-1"));

    let multiple = server.request_to("/memories/content");
    assert_eq!(multiple.method_override(), Some("DELETE"));
    assert_eq!(multiple.json()["ids"], json!(["mem_1", "mem_2"]));
}

#[tokio::test]
async fn test_glossary_counts_and_empty_list() {
    let server = MockServer::start(|request| match request.path.as_str() {
        "/glossaries" => Reply::content(serde_json::Value::Null),
        _ => Reply::content(json!({
            "unidirectional": { "en-US": 12, "it-IT": 10 },
            "multidirectional": 4
        })),
    })
    .await;
    let translator = server.translator();

    assert!(translator.glossaries.list().await.unwrap().is_empty());

    let counts = translator.glossaries.counts("gls_1").await.unwrap();
    assert_eq!(counts.unidirectional.get("en-US"), Some(&12));
    assert_eq!(counts.multidirectional, 4);
}

#[tokio::test]
async fn test_glossary_csv_import_field() {
    let server = MockServer::start(|_| Reply::content(import_json("gimp_1", 1.0))).await;
    let translator = server.translator();

    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("terms.csv");
    std::fs::write(&csv, "en-US,it-IT\nhello,ciao\n").unwrap();

    let import = translator
        .glossaries
        .import_csv("gls_1", &csv, None)
        .await
        .unwrap();
    assert_eq!(import.id, "gimp_1");

    let body = server.request_to("/glossaries/gls_1/import").body_text();
    assert!(body.contains("name=\"csv\"; filename=\"terms.csv\""));
    assert!(!body.contains("name=\"compression\""));
}

#[tokio::test]
async fn test_glossary_export_returns_raw_bytes() {
    let csv = "term,translation\nhello,ciao\n";
    let server = MockServer::start(move |_| Reply::raw(200, "text/csv", csv)).await;
    let translator = server.translator();

    let bytes = translator
        .glossaries
        .export("gls_1", "csv/table-uni", Some("en-US"))
        .await
        .unwrap();

    assert_eq!(&bytes[..], csv.as_bytes());

    let request = server.request_to("/glossaries/gls_1/export");
    assert_eq!(request.method_override(), Some("GET"));
    assert_eq!(
        request.json(),
        json!({ "content_type": "csv/table-uni", "source": "en-US" })
    );
}
