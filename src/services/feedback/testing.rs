//! Scripted stand-ins for the feedback seams, shared by unit tests.

use super::{Connection, ConnectionFactory, FeedbackCallback, FeedbackStore, TransportError};
use crate::domain::{App, Environment, Feedback};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use uuid::Uuid;

pub(crate) fn app(environment: Environment) -> App {
    App {
        id: Uuid::new_v4(),
        name: "my_app".to_string(),
        environment,
        certificate: String::new(),
        password: None,
    }
}

pub(crate) fn tuple(timestamp: u32, token_byte: u8) -> Vec<u8> {
    let mut bytes = timestamp.to_be_bytes().to_vec();
    bytes.extend_from_slice(&32u16.to_be_bytes());
    bytes.extend_from_slice(&[token_byte; 32]);
    bytes
}

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Bytes(Vec<u8>),
    Fail,
}

#[derive(Debug, Default)]
pub(crate) struct ConnectionLog {
    pub(crate) opened: AtomicUsize,
    pub(crate) connects: AtomicUsize,
    pub(crate) reads: AtomicUsize,
    pub(crate) closes: AtomicUsize,
    pub(crate) targets: Mutex<Vec<(String, u16)>>,
}

impl ConnectionLog {
    pub(crate) fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Hands out connections that replay the same script every cycle.
#[derive(Debug, Default)]
pub(crate) struct ScriptedFactory {
    pub(crate) steps: Vec<Step>,
    pub(crate) fail_connect: bool,
    pub(crate) log: Arc<ConnectionLog>,
}

impl ScriptedFactory {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self { steps, ..Self::default() }
    }

    pub(crate) fn failing_connect() -> Self {
        Self { fail_connect: true, ..Self::default() }
    }
}

impl ConnectionFactory for ScriptedFactory {
    fn connection(&self, _app: &App, host: &str, port: u16) -> Box<dyn Connection> {
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut targets) = self.log.targets.lock() {
            targets.push((host.to_string(), port));
        }
        Box::new(ScriptedConnection {
            steps: self.steps.iter().cloned().collect(),
            fail_connect: self.fail_connect,
            log: Arc::clone(&self.log),
        })
    }
}

#[derive(Debug)]
struct ScriptedConnection {
    steps: VecDeque<Step>,
    fail_connect: bool,
    log: Arc<ConnectionLog>,
}

fn bork() -> TransportError {
    TransportError::Io(std::io::Error::other("bork!"))
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn connect(&mut self) -> std::result::Result<(), TransportError> {
        self.log.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect { Err(bork()) } else { Ok(()) }
    }

    async fn read(&mut self, len: usize) -> std::result::Result<Vec<u8>, TransportError> {
        self.log.reads.fetch_add(1, Ordering::SeqCst);
        assert_eq!(len, 38);
        match self.steps.pop_front() {
            Some(Step::Bytes(bytes)) => Ok(bytes),
            Some(Step::Fail) => Err(bork()),
            None => Ok(Vec::new()),
        }
    }

    async fn close(&mut self) -> std::result::Result<(), TransportError> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Keeps saved feedback in memory; saves whose token is in `reject` fail.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub(crate) saved: Mutex<Vec<Feedback>>,
    pub(crate) reject: Vec<String>,
}

impl MemoryStore {
    pub(crate) fn saved(&self) -> Vec<Feedback> {
        self.saved.lock().map(|saved| saved.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn save(&self, failed_at: OffsetDateTime, device_token: &str, app: &App) -> Result<Feedback> {
        if self.reject.iter().any(|token| token == device_token) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let feedback = Feedback {
            id: Uuid::now_v7(),
            app_id: app.id,
            failed_at,
            device_token: device_token.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.saved.lock().map_err(|_| AppError::Internal)?.push(feedback.clone());
        Ok(feedback)
    }
}

/// Panics on every save.
#[derive(Debug, Default)]
pub(crate) struct PanickingStore {
    pub(crate) attempts: AtomicUsize,
}

#[async_trait]
impl FeedbackStore for PanickingStore {
    #[allow(clippy::panic)]
    async fn save(&self, _failed_at: OffsetDateTime, _device_token: &str, _app: &App) -> Result<Feedback> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        panic!("store exploded");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) enum Behavior {
    #[default]
    Succeed,
    Fail,
    Panic,
}

#[derive(Debug, Default)]
pub(crate) struct CountingCallback {
    pub(crate) calls: AtomicUsize,
    pub(crate) behavior: Behavior,
}

#[async_trait]
impl FeedbackCallback for CountingCallback {
    #[allow(clippy::panic)]
    async fn on_feedback(&self, _feedback: &Feedback) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(anyhow::anyhow!("bork!")),
            Behavior::Panic => panic!("bork!"),
        }
    }
}

/// Collects formatted log lines written while installed as the thread's default subscriber.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogCapture {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        let guard = self.bytes.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        String::from_utf8_lossy(&guard).lines().map(str::to_string).collect()
    }

    /// Lines logged at `level`, e.g. `"INFO"` or `"ERROR"`.
    pub(crate) fn at_level(&self, level: &str) -> Vec<String> {
        self.lines().into_iter().filter(|line| line.split_whitespace().next() == Some(level)).collect()
    }
}

#[derive(Debug)]
pub(crate) struct LogCaptureWriter {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap_or_else(std::sync::PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter { bytes: Arc::clone(&self.bytes) }
    }
}
