//! Common test utilities and helpers
//!
//! - `ScriptedApi`: in-process `WorkoutApi` answering from a closure and
//!   recording every call
//! - Workout fixtures
//! - `TestClient`: a `SyncClient` wired over memory storage and a manual
//!   network signal

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fitlog::client::storage::{LocalStorage, MemoryStorage};
use fitlog::client::{
    ApiError, Config, CreateResponse, Environment, ManualNetworkSignal, SyncClient, WorkoutApi,
};
use fitlog::shared::{AppConfig, Exercise, ExerciseSet, Workout, WorkoutSubmission};

type Responder = dyn Fn(&WorkoutSubmission, usize) -> Result<CreateResponse, ApiError> + Send + Sync;

/// `WorkoutApi` answering from a closure `(submission, call index) -> result`
pub struct ScriptedApi {
    responder: Box<Responder>,
    calls: Mutex<Vec<WorkoutSubmission>>,
    counter: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedApi {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&WorkoutSubmission, usize) -> Result<CreateResponse, ApiError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Every call succeeds with a fresh `_id`
    pub fn accepting() -> Self {
        Self::new(|_, n| created(&format!("srv-{}", n)))
    }

    /// Every call fails at the transport level
    pub fn unreachable() -> Self {
        Self::new(|_, _| Err(ApiError::Network("connection refused".to_string())))
    }

    /// Answer every call after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<WorkoutSubmission> {
        self.calls.lock().unwrap().clone()
    }

    /// Notes of every sent workout, in call order
    pub fn sent_notes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|submission| submission.workout.notes)
            .collect()
    }
}

#[async_trait]
impl WorkoutApi for ScriptedApi {
    async fn create_workout(
        &self,
        submission: &WorkoutSubmission,
    ) -> Result<CreateResponse, ApiError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(submission.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(submission, index)
    }
}

/// 201 with the given `_id`
pub fn created(id: &str) -> Result<CreateResponse, ApiError> {
    Ok(CreateResponse {
        status: 201,
        body: json!({ "_id": id }),
    })
}

pub fn status(code: u16) -> Result<CreateResponse, ApiError> {
    Err(ApiError::Status {
        status: code,
        body: String::new(),
    })
}

/// Workout whose notes carry `label`, so calls can be told apart
pub fn workout(label: &str) -> Workout {
    Workout::new("2024-05-01", "push")
        .with_notes(label)
        .with_exercise(Exercise::new(
            "bench",
            vec![ExerciseSet::new("10", "90").with_weight("60")],
        ))
}

pub fn test_config() -> Config {
    Config::from_app(AppConfig {
        settle_delay_ms: 1000,
        poll_interval_secs: 30,
        ..AppConfig::default()
    })
}

/// A client over memory storage and a manual network signal
pub struct TestClient {
    pub client: SyncClient,
    pub network: Arc<ManualNetworkSignal>,
    pub storage: Arc<MemoryStorage>,
    pub api: Arc<ScriptedApi>,
}

impl TestClient {
    pub async fn new(api: ScriptedApi, online: bool) -> Self {
        Self::with_storage(api, online, Arc::new(MemoryStorage::new())).await
    }

    pub async fn with_storage(api: ScriptedApi, online: bool, storage: Arc<MemoryStorage>) -> Self {
        Self::with_config(api, online, storage, test_config()).await
    }

    pub async fn with_config(
        api: ScriptedApi,
        online: bool,
        storage: Arc<MemoryStorage>,
        config: Config,
    ) -> Self {
        let network = Arc::new(ManualNetworkSignal::new(online));
        let api = Arc::new(api);
        let client = SyncClient::new(
            config,
            Environment::interactive(network.clone()),
            storage.clone() as Arc<dyn LocalStorage>,
            api.clone() as Arc<dyn WorkoutApi>,
        )
        .await;
        Self {
            client,
            network,
            storage,
            api,
        }
    }

    /// Mark the client ready without starting the monitor
    pub fn ready(self) -> Self {
        self.client.engine().state().mark_ready();
        self
    }

    pub async fn pending_notes(&self) -> Vec<String> {
        self.client
            .submitter()
            .pending()
            .await
            .into_iter()
            .map(|record| record.payload.notes)
            .collect()
    }
}

/// Let spawned tasks run until they block
pub async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
