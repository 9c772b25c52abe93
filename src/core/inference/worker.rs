//! Worker-process binding of the OCR collaborator.
//!
//! The model lives in a separate long-running process that loads it once and
//! then serves parse commands. The server talks to it over stdin/stdout using
//! the JSON Lines protocol in [`super::protocol`]. Responses are correlated by
//! request id, so several requests can be in flight at once.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot, Mutex as TokioMutex};
use tracing::{debug, error, info, warn};

use super::protocol::{
    ResponseEnvelope, WorkerCommand, WorkerPayload, WorkerRequest, WorkerResponse,
};
use super::{DocumentParser, ModelRuntime, ParseError};
use crate::core::config::ModelConfig;
use crate::core::errors::StartupFailure;
use crate::domain::{InferenceOptions, InferenceResult};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Errors from the worker bridge.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker process exited")]
    Exited,

    #[error("worker did not become ready within {0:?}")]
    StartupTimeout(Duration),

    #[error("worker pipe unavailable: {0}")]
    MissingPipe(&'static str),

    #[error("unexpected worker payload: {0}")]
    UnexpectedPayload(&'static str),

    #[error("{0}")]
    Remote(String),

    #[error("worker io: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker protocol: {0}")]
    Protocol(#[from] serde_json::Error),
}

/// How to launch the worker.
///
/// The model parameters are appended to `args` as
/// `--model <path> --gpu-memory-utilization <f> --max-model-len <n>`.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub startup_timeout: Duration,
}

impl WorkerSettings {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            startup_timeout: Duration::from_secs(600),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }
}

/// [`ModelRuntime`] that starts a worker process per service.
#[derive(Debug, Clone)]
pub struct WorkerRuntime {
    settings: WorkerSettings,
}

impl WorkerRuntime {
    pub fn new(settings: WorkerSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ModelRuntime for WorkerRuntime {
    async fn load(&self, config: &ModelConfig) -> Result<Arc<dyn DocumentParser>, StartupFailure> {
        if !config.model_path.exists() {
            return Err(StartupFailure::ModelNotFound {
                path: config.model_path.clone(),
            });
        }

        let bridge = WorkerBridge::spawn(&self.settings, config)
            .await
            .map_err(|e| {
                StartupFailure::model_load(
                    config.model_path.clone(),
                    "worker failed to load the model",
                    e,
                )
            })?;
        Ok(Arc::new(bridge))
    }
}

type PendingMap = HashMap<u64, oneshot::Sender<WorkerPayload>>;

/// Server-side handle to a running worker.
pub struct WorkerBridge {
    cmd_tx: mpsc::UnboundedSender<String>,
    /// `None` once the worker's stdout has closed.
    pending: Arc<TokioMutex<Option<PendingMap>>>,
    /// Cleared by the reader task when the worker's stdout closes.
    alive: Arc<AtomicBool>,
    next_id: AtomicU64,
    child: TokioMutex<Option<Child>>,
}

impl WorkerBridge {
    /// Spawn the worker and wait until it reports the model as loaded.
    pub async fn spawn(settings: &WorkerSettings, config: &ModelConfig) -> Result<Self, WorkerError> {
        info!(
            program = %settings.program.display(),
            "Spawning OCR worker"
        );

        let mut child = Command::new(&settings.program)
            .args(&settings.args)
            .arg("--model")
            .arg(&config.model_path)
            .arg("--gpu-memory-utilization")
            .arg(config.gpu_memory_utilization.to_string())
            .arg("--max-model-len")
            .arg(config.max_model_len.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or(WorkerError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(WorkerError::MissingPipe("stdout"))?;
        let mut lines = BufReader::new(stdout).lines();

        match tokio::time::timeout(settings.startup_timeout, wait_ready(&mut lines)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = child.kill().await;
                return Err(e);
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(WorkerError::StartupTimeout(settings.startup_timeout));
            }
        }
        info!("OCR worker ready");

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<String>();
        let pending = Arc::new(TokioMutex::new(Some(PendingMap::new())));

        let alive = Arc::new(AtomicBool::new(true));

        tokio::spawn(stdin_writer_task(cmd_rx, stdin));
        tokio::spawn(stdout_reader_task(lines, pending.clone(), alive.clone()));

        Ok(Self {
            cmd_tx,
            pending,
            alive,
            next_id: AtomicU64::new(1),
            child: TokioMutex::new(Some(child)),
        })
    }

    /// Send a command and wait for the response.
    async fn send_and_wait(&self, command: WorkerCommand) -> Result<WorkerPayload, WorkerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let json = serde_json::to_string(&WorkerRequest { id, command })?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            let map = pending.as_mut().ok_or(WorkerError::Exited)?;
            map.insert(id, tx);
        }

        if self.cmd_tx.send(json).is_err() {
            if let Some(map) = self.pending.lock().await.as_mut() {
                map.remove(&id);
            }
            return Err(WorkerError::Exited);
        }

        rx.await.map_err(|_| WorkerError::Exited)
    }
}

#[async_trait]
impl DocumentParser for WorkerBridge {
    async fn parse(
        &self,
        path: &Path,
        options: &InferenceOptions,
    ) -> Result<Option<InferenceResult>, ParseError> {
        let payload = self
            .send_and_wait(WorkerCommand::Parse {
                path: path.to_path_buf(),
                skip_cross_page_merge: options.skip_cross_page_merge,
                max_page_retries: options.max_page_retries,
            })
            .await?;

        match payload {
            WorkerPayload::Parsed { result } => Ok(result),
            WorkerPayload::Error { message } => Err(WorkerError::Remote(message).into()),
            WorkerPayload::Ready => Err(WorkerError::UnexpectedPayload("ready").into()),
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) {
        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };

        if let Ok(json) = serde_json::to_string(&WorkerRequest {
            id: 0,
            command: WorkerCommand::Shutdown,
        }) {
            let _ = self.cmd_tx.send(json);
        }

        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => info!(%status, "OCR worker exited"),
            Ok(Err(e)) => warn!(error = %e, "Failed to wait for OCR worker"),
            Err(_) => {
                warn!("OCR worker did not exit in time, killing it");
                let _ = child.kill().await;
            }
        }
    }
}

/// Read lines until the worker reports ready or fails.
async fn wait_ready(lines: &mut Lines<BufReader<ChildStdout>>) -> Result<(), WorkerError> {
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WorkerResponse>(&line) {
            Ok(WorkerResponse {
                payload: WorkerPayload::Ready,
                ..
            }) => return Ok(()),
            Ok(WorkerResponse {
                payload: WorkerPayload::Error { message },
                ..
            }) => return Err(WorkerError::Remote(message)),
            Ok(other) => debug!(id = other.id, "Ignoring worker message before ready"),
            Err(_) => debug!(line = %line, "Ignoring non-protocol worker output"),
        }
    }
    Err(WorkerError::Exited)
}

/// Task that writes commands to the worker's stdin.
async fn stdin_writer_task(mut cmd_rx: mpsc::UnboundedReceiver<String>, mut stdin: ChildStdin) {
    while let Some(json_line) = cmd_rx.recv().await {
        let mut line = json_line.into_bytes();
        line.push(b'\n');
        if let Err(e) = stdin.write_all(&line).await {
            error!(error = %e, "Failed to write to worker stdin");
            break;
        }
        if let Err(e) = stdin.flush().await {
            error!(error = %e, "Failed to flush worker stdin");
            break;
        }
    }
    debug!("Worker stdin writer exiting");
}

/// Task that reads responses from the worker's stdout and dispatches them.
async fn stdout_reader_task(
    mut lines: Lines<BufReader<ChildStdout>>,
    pending: Arc<TokioMutex<Option<PendingMap>>>,
    alive: Arc<AtomicBool>,
) {
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Worker stdout read error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let envelope: ResponseEnvelope = match serde_json::from_str(&line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Ignoring uncorrelated worker output");
                continue;
            }
        };
        let id = envelope.id;
        let payload = envelope.into_payload().unwrap_or_else(|e| {
            warn!(id, error = %e, "Worker sent a malformed response");
            WorkerPayload::Error {
                message: format!("malformed worker response: {e}"),
            }
        });

        let mut guard = pending.lock().await;
        let Some(map) = guard.as_mut() else { break };
        match map.remove(&id) {
            Some(tx) => {
                let _ = tx.send(payload);
            }
            None if id == 0 => {
                if let WorkerPayload::Error { message } = payload {
                    error!(message = %message, "Worker reported an error");
                }
            }
            None => debug!(id, "No pending request for worker response"),
        }
    }

    alive.store(false, Ordering::SeqCst);

    // Dropping the senders fails every in-flight request.
    let orphaned = pending.lock().await.take().map(|map| map.len()).unwrap_or(0);
    if orphaned > 0 {
        error!(orphaned, "OCR worker exited with requests in flight");
    } else {
        info!("OCR worker stdout closed");
    }
}
