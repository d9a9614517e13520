//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires tempdir-backed storage, a
//! converter registry, the job engine, and a worker pool. The
//! [`with_server`] constructor additionally starts Axum on a random port
//! for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use markify::config::{AdvancedConfig, Config, ConvertersConfig};
use markify::convert::{
    ConversionMode, Converter, ConverterRegistry, Markdown, PlainTextConverter, SourceDocument,
};
use markify::error::MarkifyError;
use markify::jobs::{JobQueue, JobService, JobStatus, JobStore, WorkerPool};
use markify::server::{create_router, AppContext};
use markify::storage::DocumentStorage;

/// Converter that always fails, for failure-path tests.
pub struct FailingConverter;

#[async_trait]
impl Converter for FailingConverter {
    async fn convert(&self, _doc: SourceDocument) -> Result<Markdown, MarkifyError> {
        Err(MarkifyError::Conversion("simulated parser failure".into()))
    }
}

/// Converter that sleeps before delegating to the plain text converter,
/// keeping jobs observably in `processing`.
pub struct SlowConverter {
    pub delay: Duration,
}

#[async_trait]
impl Converter for SlowConverter {
    async fn convert(&self, doc: SourceDocument) -> Result<Markdown, MarkifyError> {
        tokio::time::sleep(self.delay).await;
        PlainTextConverter::new().convert(doc).await
    }
}

/// Converter that records how many times each file name was converted,
/// for at-most-once processing assertions.
#[derive(Default)]
pub struct CountingConverter {
    pub conversions: Mutex<HashMap<String, usize>>,
}

#[async_trait]
impl Converter for CountingConverter {
    async fn convert(&self, doc: SourceDocument) -> Result<Markdown, MarkifyError> {
        *self
            .conversions
            .lock()
            .entry(doc.filename.clone())
            .or_insert(0) += 1;
        // Yield so concurrent workers interleave.
        tokio::time::sleep(Duration::from_millis(5)).await;
        PlainTextConverter::new().convert(doc).await
    }
}

/// Test harness wrapping a fully-wired job engine backed by a tempdir.
pub struct TestHarness {
    pub service: Arc<JobService>,
    pub store: Arc<JobStore>,
    pub queue: Arc<JobQueue>,
    pub registry: Arc<ConverterRegistry>,
    pub storage: Arc<DocumentStorage>,
    pub pool: Option<WorkerPool>,
    _data_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Default registry: fast built-in, advanced backed by `cat` (echoes
    /// the staged file, standing in for a real parser), no cloud.
    fn default_registry() -> ConverterRegistry {
        ConverterRegistry::from_config(&ConvertersConfig {
            advanced: AdvancedConfig {
                command: "cat".into(),
                args: vec![],
                timeout_secs: 10,
            },
            ..ConvertersConfig::default()
        })
    }

    /// Create a harness with `workers` conversion workers and the default
    /// registry. Zero workers leaves submitted jobs queued forever, which
    /// is useful for not-ready assertions.
    pub fn new(workers: usize) -> Self {
        Self::with_registry(workers, Self::default_registry())
    }

    /// Create a harness with a custom converter registry.
    pub fn with_registry(workers: usize, registry: ConverterRegistry) -> Self {
        let data_dir = tempfile::tempdir().expect("failed to create temp data dir");
        let storage =
            Arc::new(DocumentStorage::new(data_dir.path()).expect("failed to init storage"));
        let registry = Arc::new(registry);
        let store = Arc::new(JobStore::new(1000));
        let queue = Arc::new(JobQueue::new(256));
        let service = Arc::new(JobService::new(
            store.clone(),
            queue.clone(),
            registry.clone(),
            storage.clone(),
        ));

        let pool = (workers > 0).then(|| {
            WorkerPool::spawn(
                workers,
                store.clone(),
                queue.clone(),
                registry.clone(),
                storage.clone(),
            )
        });

        Self {
            service,
            store,
            queue,
            registry,
            storage,
            pool,
            _data_dir: data_dir,
        }
    }

    /// Spawn additional workers against this harness's engine.
    pub fn spawn_workers(&self, count: usize) -> WorkerPool {
        WorkerPool::spawn(
            count,
            self.store.clone(),
            self.queue.clone(),
            self.registry.clone(),
            self.storage.clone(),
        )
    }

    /// Register a single converter under one mode; no other mode is
    /// supported by the resulting harness.
    pub fn with_single_converter(
        workers: usize,
        mode: ConversionMode,
        converter: Arc<dyn Converter>,
    ) -> Self {
        let mut registry = ConverterRegistry::new();
        registry.register(mode, converter);
        Self::with_registry(workers, registry)
    }

    /// Start an Axum server on a random port and return the harness
    /// together with the bound socket address.
    pub async fn with_server(workers: usize) -> (Self, SocketAddr) {
        let harness = Self::new(workers);
        let ctx = AppContext {
            service: harness.service.clone(),
            config: Arc::new(Config::default()),
        };
        let app = create_router(ctx);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Poll a job until it reaches `status` or the timeout elapses.
    pub async fn wait_for_status(&self, id: Uuid, status: JobStatus, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let job = self.service.get_status(id).expect("job disappeared");
            if job.status == status {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {id} stuck in {:?}, wanted {:?}",
                job.status,
                status
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Poll a job until it reaches any terminal state.
    pub async fn wait_for_terminal(&self, id: Uuid, timeout: Duration) -> JobStatus {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let job = self.service.get_status(id).expect("job disappeared");
            if job.status.is_terminal() {
                return job.status;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {id} never reached a terminal state (last: {:?})",
                job.status
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
