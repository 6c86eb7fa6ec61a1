//! Background worker: install, activate, fetch and sync relay

mod common;

use assert_matches::assert_matches;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use reqwest::{Method, Url};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{settle_tasks, workout, ScriptedApi};
use fitlog::client::storage::MemoryStorage;
use fitlog::client::{Environment, ManualNetworkSignal, SyncClient};
use fitlog::shared::{AppConfig, ClientMessage, WorkerCommand};
use fitlog::worker::cache::CacheStorage;
use fitlog::worker::clients::ClientHub;
use fitlog::worker::fetch::{FetchRequest, FetchResponse, Fetcher};
use fitlog::worker::{ServiceWorker, WorkerError, WorkerState};

const ORIGIN: &str = "https://fit.example.com";

/// Network double: answers from a path table while online
#[derive(Default)]
struct FakeNetwork {
    routes: Mutex<HashMap<String, FetchResponse>>,
    offline: AtomicBool,
    requests: AtomicUsize,
}

impl FakeNetwork {
    fn serving(paths: &[&str]) -> Arc<Self> {
        let network = Self::default();
        for path in paths {
            network.serve(path, FetchResponse::ok(format!("page {}", path)));
        }
        Arc::new(network)
    }

    fn serve(&self, path: &str, response: FetchResponse) {
        self.routes.lock().unwrap().insert(path.to_string(), response);
    }

    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, WorkerError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(WorkerError::Network("offline".to_string()));
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(request.url.path())
            .cloned()
            .unwrap_or_else(|| FetchResponse::ok("not found").with_status(404)))
    }
}

fn config(version: &str, routes: &[&str]) -> AppConfig {
    AppConfig {
        server_url: ORIGIN.to_string(),
        cache_version: version.to_string(),
        precache_routes: routes.iter().map(|r| r.to_string()).collect(),
        ..AppConfig::default()
    }
}

fn worker(
    version: &str,
    caches: &Arc<CacheStorage>,
    network: &Arc<FakeNetwork>,
    hub: &ClientHub,
) -> ServiceWorker {
    ServiceWorker::new(
        config(version, &["/", "/workouts", "/manifest.json"]),
        caches.clone(),
        network.clone(),
        hub.clone(),
    )
    .unwrap()
}

fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

#[tokio::test]
async fn test_install_precaches_every_route() {
    let caches = Arc::new(CacheStorage::new());
    let network = FakeNetwork::serving(&["/", "/workouts", "/manifest.json"]);
    let sw = worker("v1", &caches, &network, &ClientHub::new());

    assert_eq!(sw.state().await, WorkerState::Parsed);
    sw.install().await.unwrap();

    assert_eq!(sw.state().await, WorkerState::Waiting);
    assert_eq!(caches.len("fitlog-cache-v1").await, 3);
    assert!(caches.match_key("fitlog-cache-v1", "/workouts").await.is_some());
}

#[tokio::test]
async fn test_install_fails_as_a_whole() {
    let caches = Arc::new(CacheStorage::new());
    let network = FakeNetwork::serving(&["/", "/workouts"]);
    let sw = worker("v1", &caches, &network, &ClientHub::new());

    let error = sw.install().await.unwrap_err();
    assert_matches!(error, WorkerError::InstallFailed { ref route, .. } if route == "/manifest.json");
    assert!(!caches.has("fitlog-cache-v1").await);
    assert_eq!(sw.state().await, WorkerState::Parsed);
}

#[tokio::test]
async fn test_activate_deletes_older_versions() {
    let caches = Arc::new(CacheStorage::new());
    let network = FakeNetwork::serving(&["/", "/workouts", "/manifest.json"]);
    let hub = ClientHub::new();

    let old = worker("v1", &caches, &network, &hub);
    old.install().await.unwrap();
    old.activate().await;

    let new = worker("v2", &caches, &network, &hub);
    new.install().await.unwrap();
    let deleted = new.activate().await;

    assert_eq!(deleted, vec!["fitlog-cache-v1"]);
    assert_eq!(caches.keys().await, vec!["fitlog-cache-v2"]);
    assert_eq!(new.state().await, WorkerState::Activated);
}

#[tokio::test]
async fn test_fetch_serves_cache_first_and_caches_misses() {
    let caches = Arc::new(CacheStorage::new());
    let network = FakeNetwork::serving(&["/", "/workouts", "/manifest.json", "/journal"]);
    let sw = worker("v1", &caches, &network, &ClientHub::new());
    sw.install().await.unwrap();
    let after_install = network.request_count();

    // Cached at install: no network
    let cached = sw.fetch(&FetchRequest::get(url("/workouts"))).await.unwrap();
    assert_eq!(cached.body, "page /workouts");
    assert_eq!(network.request_count(), after_install);

    // Miss: fetched once, then served from cache
    sw.fetch(&FetchRequest::get(url("/journal"))).await.unwrap();
    sw.fetch(&FetchRequest::get(url("/journal"))).await.unwrap();
    assert_eq!(network.request_count(), after_install + 1);

    // Non-2xx answers are returned but not cached
    let missing = sw.fetch(&FetchRequest::get(url("/nowhere"))).await.unwrap();
    assert_eq!(missing.status, 404);
    assert!(caches.match_key("fitlog-cache-v1", "/nowhere").await.is_none());
}

#[tokio::test]
async fn test_api_requests_are_never_cached() {
    let caches = Arc::new(CacheStorage::new());
    let network = FakeNetwork::serving(&["/", "/workouts", "/manifest.json"]);
    network.serve("/api/workouts", FetchResponse::ok("[]"));
    let sw = worker("v1", &caches, &network, &ClientHub::new());
    sw.install().await.unwrap();

    sw.fetch(&FetchRequest::get(url("/api/workouts"))).await.unwrap();
    sw.fetch(&FetchRequest::get(url("/api/workouts"))).await.unwrap();
    assert!(caches.match_key("fitlog-cache-v1", "/api/workouts").await.is_none());

    network.serve("/proxy/api/workouts", FetchResponse::ok("[]"));
    sw.fetch(&FetchRequest::get(url("/proxy/api/workouts"))).await.unwrap();
    assert!(caches.match_key("fitlog-cache-v1", "/proxy/api/workouts").await.is_none());

    let post = FetchRequest::get(url("/journal")).with_method(Method::POST);
    sw.fetch(&post).await.unwrap();
    assert!(caches.match_key("fitlog-cache-v1", "/journal").await.is_none());

    network.serve("/lib.js", FetchResponse::ok("cdn"));
    let foreign = Url::parse("https://cdn.example.net/lib.js").unwrap();
    sw.fetch(&FetchRequest::get(foreign)).await.unwrap();
    assert!(caches.match_key("fitlog-cache-v1", "/lib.js").await.is_none());
}

#[tokio::test]
async fn test_offline_navigation_falls_back_to_root() {
    let caches = Arc::new(CacheStorage::new());
    let network = FakeNetwork::serving(&["/", "/workouts", "/manifest.json"]);
    let sw = worker("v1", &caches, &network, &ClientHub::new());
    sw.install().await.unwrap();
    network.go_offline();

    let page = sw.fetch(&FetchRequest::navigate(url("/nutrition"))).await.unwrap();
    assert_eq!(page.body, "page /");

    let asset = sw.fetch(&FetchRequest::get(url("/icon.png"))).await;
    assert_matches!(asset, Err(WorkerError::Offline { .. }));
}

#[tokio::test]
async fn test_sync_event_reaches_every_client() {
    let caches = Arc::new(CacheStorage::new());
    let network = FakeNetwork::serving(&[]);
    let hub = ClientHub::new();
    let sw = worker("v1", &caches, &network, &hub);
    let mut first = hub.subscribe();
    let mut second = hub.subscribe();

    assert_eq!(sw.sync("some-other-tag"), 0);
    assert_eq!(sw.sync("sync-workouts"), 2);
    assert_eq!(first.recv().await.unwrap(), ClientMessage::SyncWorkouts);
    assert_eq!(second.recv().await.unwrap(), ClientMessage::SyncWorkouts);

    sw.message(WorkerCommand::SyncWorkouts).await;
    assert_eq!(first.recv().await.unwrap(), ClientMessage::SyncWorkouts);
}

#[tokio::test]
async fn test_skip_waiting_activates() {
    let caches = Arc::new(CacheStorage::new());
    let network = FakeNetwork::serving(&["/", "/workouts", "/manifest.json"]);
    let sw = worker("v1", &caches, &network, &ClientHub::new());
    sw.install().await.unwrap();

    sw.message(WorkerCommand::SkipWaiting).await;
    assert_eq!(sw.state().await, WorkerState::Activated);
}

#[tokio::test(start_paused = true)]
async fn test_background_wake_round_trip() {
    let caches = Arc::new(CacheStorage::new());
    let hub = ClientHub::new();
    let sw = worker("v1", &caches, &FakeNetwork::serving(&[]), &hub);

    let network = Arc::new(ManualNetworkSignal::new(false));
    let api = Arc::new(ScriptedApi::accepting());
    let mut client = SyncClient::new(
        common::test_config(),
        Environment::interactive(network.clone()).with_background(sw.sync_registry()),
        Arc::new(MemoryStorage::new()),
        api.clone(),
    )
    .await;
    client.start(Some(hub.subscribe()));

    // Only the empty to non-empty edge registers
    client.submitter().submit(workout("a")).await.unwrap();
    client.submitter().submit(workout("b")).await.unwrap();
    assert_eq!(sw.sync_registry().pending_tags(), vec!["sync-workouts"]);

    network.set_online_silently(true);
    assert_eq!(sw.connectivity_restored(), 1);
    assert!(sw.sync_registry().pending_tags().is_empty());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    settle_tasks().await;
    assert_eq!(api.sent_notes(), vec!["a", "b"]);
    assert_eq!(client.status().await.pending, 0);
}
