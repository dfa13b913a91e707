//! Integration tests for sequential batch processing.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod support;

use std::sync::Arc;

use hostdl_core::auth::MemoryCredentialStore;
use hostdl_core::batch::{BatchObserver, UrlOutcome, process_urls};
use hostdl_core::download::DownloadStreamer;
use hostdl_core::driver::{Download, DriverRegistry, ErrorKind, HttpTimeouts, UnFichierDriver};
use support::pages;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    progress_calls: usize,
}

impl BatchObserver for Recorder {
    fn started(&mut self, index: usize, total: usize, url: &str) {
        let id = url.rsplit('?').next().unwrap_or_default();
        self.events.push(format!("started {index}/{total} {id}"));
    }

    fn resolved(&mut self, download: &Download) {
        self.events.push(format!("resolved {}", download.file_name()));
    }

    fn progress(&mut self, _received: u64, _total: Option<u64>) {
        self.progress_calls += 1;
    }

    fn finished(&mut self, outcome: &UrlOutcome) {
        self.events
            .push(format!("finished {} ok={}", outcome.index, outcome.is_success()));
    }
}

async fn mount_listing(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param(id, ""))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_file(server: &MockServer, file_path: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

fn registry_for(server: &MockServer) -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    registry
        .register(Box::new(
            UnFichierDriver::with_base_url(
                Arc::new(MemoryCredentialStore::new()),
                HttpTimeouts::new(5, 10),
                server.uri(),
            )
            .unwrap(),
        ))
        .unwrap();
    registry
}

#[tokio::test]
async fn test_failing_url_does_not_stop_the_batch() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let first_link = format!("{}/files/a", server.uri());
    let third_link = format!("{}/files/c", server.uri());
    mount_listing(&server, "a1", pages::listing("first.bin", "5 B", None, Some(&first_link))).await;
    mount_listing(&server, "b2", pages::warning_page("File has been removed")).await;
    mount_listing(&server, "c3", pages::listing("third.bin", "5 B", None, Some(&third_link))).await;
    mount_file(&server, "/files/a", b"first").await;
    mount_file(&server, "/files/c", b"third").await;

    let temp_dir = TempDir::new().unwrap();
    let urls: Vec<String> = ["a1", "b2", "c3"]
        .iter()
        .map(|id| format!("{}/?{id}", server.uri()))
        .collect();
    let registry = registry_for(&server);
    let streamer = DownloadStreamer::with_timeouts(HttpTimeouts::new(5, 30)).unwrap();
    let mut recorder = Recorder::default();

    let outcomes = process_urls(&registry, &streamer, &urls, temp_dir.path(), &mut recorder).await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        outcomes.iter().map(|o| o.index).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(outcomes[0].is_success());
    assert!(outcomes[2].is_success());

    let error = outcomes[1].result.as_ref().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Download);
    assert!(error.to_string().contains("File has been removed"));

    assert_eq!(std::fs::read(temp_dir.path().join("first.bin")).unwrap(), b"first");
    assert_eq!(std::fs::read(temp_dir.path().join("third.bin")).unwrap(), b"third");

    assert_eq!(
        recorder.events,
        vec![
            "started 1/3 a1",
            "resolved first.bin",
            "finished 1 ok=true",
            "started 2/3 b2",
            "finished 2 ok=false",
            "started 3/3 c3",
            "resolved third.bin",
            "finished 3 ok=true",
        ]
    );
    assert!(recorder.progress_calls >= 2);
}

#[tokio::test]
async fn test_unsupported_url_is_reported_as_no_matching_driver() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().unwrap();
    let registry = registry_for(&server);
    let streamer = DownloadStreamer::with_timeouts(HttpTimeouts::new(5, 30)).unwrap();
    let urls = vec!["https://example.com/file.zip".to_string()];
    let mut recorder = Recorder::default();

    let outcomes = process_urls(&registry, &streamer, &urls, temp_dir.path(), &mut recorder).await;

    assert_eq!(outcomes.len(), 1);
    let error = outcomes[0].result.as_ref().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NoMatchingDriver);
    assert_eq!(recorder.progress_calls, 0);
    assert!(std::fs::read_dir(temp_dir.path()).unwrap().next().is_none());
}
