//! End-to-end discovery and reconciliation over real HTTP.
//!
//! Serves fixtures from a local `wiremock` server, so no external network
//! access is needed.

#![allow(deprecated)] // cargo_bin deprecation, replacement not yet stable

use std::sync::Arc;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use streamtree::config::HttpConfig;
use streamtree::{DiscoveryEngine, HttpTransport, MemoryStore, Reconciler, Stream, StreamStore};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = "<html><body>here is a list: \
    link to some other page: <a href=\"http://example.org\">example.org</a>\
    link a pic: <a href=\"pic.png\">lolcats</a>\
    <ul>\
    <li><a href=\"/listOfStreams/example-stream.mp4\">stream me up!</a></li>\
    <li><a href=\"some-other-stream.mp3\">music baby</a></li>\
    <li><a href=\"http://cdn.example.org/some-external-stream.mp3\">even more music</a></li>\
    <li><a href=\"#some-other-content.mp3\">there is no real url dude</a></li>\
    </ul>\
    </body></html>";

const PLAYLIST: &str = "[playlist]\n\
    File1=http://127.0.0.1:9/stream\n\
    Title1=Fancy Radio Station\n\
    Length1=-1\n\
    File2=http://127.0.0.1:9/alt-stream\n\
    Title2=Fancy Other Radio Station\n\
    Length2=-1\n\
    NumberOfEntries=2\n\
    Version=2\n";

async fn fixture_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/listOfStreams/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(LISTING, "text/html;charset=utf8"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listen.pls"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(PLAYLIST, "audio/x-scpls"),
        )
        .mount(&server)
        .await;
    server
}

/// Serves an `audio/mpeg` body that never ends, like a live radio stream.
async fn endless_stream_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                if socket.read(&mut request).await.is_err() {
                    return;
                }
                let head = "HTTP/1.1 200 OK\r\n\
                            Content-Type: audio/mpeg\r\n\
                            Transfer-Encoding: chunked\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                let chunk = format!("400\r\n{}\r\n", "x".repeat(0x400));
                loop {
                    if socket.write_all(chunk.as_bytes()).await.is_err() {
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            });
        }
    });

    format!("http://{addr}/live")
}

fn engine() -> DiscoveryEngine {
    DiscoveryEngine::new(Arc::new(HttpTransport::new().unwrap()))
}

fn parent(url: String, mime: &str) -> Stream {
    let mut parent = Stream::new(url, "some stream", mime.parse().unwrap());
    parent.id = Some(9002);
    parent.base_id = Some(9000);
    parent.parent_id = Some(9001);
    parent
}

#[tokio::test]
async fn discovers_html_listing_over_http() {
    let server = fixture_server().await;
    let base = format!("{}/listOfStreams/", server.uri());

    let streams = engine().discover(&parent(base.clone(), "text/html")).await.unwrap();

    assert_eq!(streams.len(), 3);
    assert_eq!(streams[0].url, format!("{base}example-stream.mp4"));
    assert_eq!(streams[0].mime_type.to_string(), "video/mp4");
    assert_eq!(streams[1].url, format!("{base}some-other-stream.mp3"));
    assert_eq!(streams[2].url, "http://cdn.example.org/some-external-stream.mp3");
    assert!(streams.iter().all(|s| s.base_id == Some(9000) && s.parent_id == Some(9002)));
}

#[tokio::test]
async fn discovers_playlist_over_http() {
    let server = fixture_server().await;
    // Entries have no extension and nothing listens on port 9, so the
    // probes fail and the entries fall back to audio/*
    let streams = engine()
        .discover(&parent(format!("{}/listen.pls", server.uri()), "audio/x-scpls"))
        .await
        .unwrap();

    let got: Vec<_> = streams
        .iter()
        .map(|s| (s.title.as_str(), s.mime_type.to_string()))
        .collect();
    assert_eq!(
        got,
        [
            ("Fancy Radio Station", "audio/*".to_string()),
            ("Fancy Other Radio Station", "audio/*".to_string()),
        ]
    );
}

#[tokio::test]
async fn live_stream_parent_has_no_children() {
    let url = endless_stream_server().await;
    let config = HttpConfig {
        timeout_secs: 5,
        ..HttpConfig::default()
    };
    let engine = DiscoveryEngine::new(Arc::new(HttpTransport::with_config(&config).unwrap()));

    // Returns on the headers alone, well before the client timeout
    let streams = tokio::time::timeout(
        Duration::from_secs(3),
        engine.discover(&parent(url, "audio/mpeg")),
    )
    .await
    .expect("discovery should not read the stream body")
    .unwrap();

    assert!(streams.is_empty());
}

#[tokio::test]
async fn discovered_listing_reconciles_into_store() {
    let server = fixture_server().await;
    let store = Arc::new(MemoryStore::new());
    let root_id = store
        .insert(&Stream::new(
            format!("{}/listOfStreams/", server.uri()),
            "listing",
            "text/html".parse().unwrap(),
        ))
        .await
        .unwrap();
    let root = store.get(root_id).await.unwrap().unwrap();

    let reconciler = Reconciler::new(store.clone());
    let engine = engine();

    let first = reconciler
        .reconcile(&root, engine.discover(&root).await.unwrap())
        .await
        .unwrap();
    let second = reconciler
        .reconcile(&root, engine.discover(&root).await.unwrap())
        .await
        .unwrap();

    assert_eq!(first.inserted, 3);
    assert_eq!((second.inserted, second.updated, second.deleted), (0, 3, 0));
    assert_eq!(store.query_children(root_id).await.unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn cli_discover_prints_json() {
    let server = fixture_server().await;
    let url = format!("{}/listOfStreams/", server.uri());

    let assert = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("streamtree")
            .expect("binary 'streamtree' should be built")
            .args(["discover", "--json", &url])
            .timeout(Duration::from_secs(30))
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("\"mime_type\": \"video/mp4\""))
        .stdout(predicate::str::contains("some-external-stream.mp3"))
        .stdout(predicate::str::contains("pic.png").not());
}
