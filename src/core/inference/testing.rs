//! In-process stand-ins for the collaborator, used by unit tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{DocumentParser, ModelRuntime, ParseError};
use crate::core::config::ModelConfig;
use crate::core::errors::StartupFailure;
use crate::domain::{InferenceOptions, InferenceResult};

/// What the mock parser answers with.
#[derive(Clone)]
pub enum MockReply {
    Result(InferenceResult),
    Null,
    Error(String),
    /// Record the call, then never answer.
    Pending,
}

/// A call observed by [`MockParser`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: PathBuf,
    pub options: InferenceOptions,
    pub file_existed: bool,
    pub content: Vec<u8>,
}

pub struct MockParser {
    reply: MockReply,
    calls: Mutex<Vec<RecordedCall>>,
    shutdowns: AtomicUsize,
    alive: AtomicBool,
}

impl MockParser {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
            shutdowns: AtomicUsize::new(0),
            alive: AtomicBool::new(true),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// Make the parser report itself dead.
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentParser for MockParser {
    async fn parse(
        &self,
        path: &Path,
        options: &InferenceOptions,
    ) -> Result<Option<InferenceResult>, ParseError> {
        let content = std::fs::read(path).unwrap_or_default();
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_path_buf(),
            options: *options,
            file_existed: path.exists(),
            content,
        });

        match &self.reply {
            MockReply::Result(result) => Ok(Some(result.clone())),
            MockReply::Null => Ok(None),
            MockReply::Error(message) => Err(message.clone().into()),
            MockReply::Pending => std::future::pending().await,
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockRuntime {
    parser: Arc<MockParser>,
    loads: AtomicUsize,
    fail_with: Option<String>,
    delay: Duration,
}

impl MockRuntime {
    pub fn new(parser: Arc<MockParser>) -> Self {
        Self {
            parser,
            loads: AtomicUsize::new(0),
            fail_with: None,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(parser: Arc<MockParser>, reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::new(parser)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelRuntime for MockRuntime {
    async fn load(&self, config: &ModelConfig) -> Result<Arc<dyn DocumentParser>, StartupFailure> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(reason) = &self.fail_with {
            return Err(StartupFailure::model_load(
                config.model_path.clone(),
                reason.clone(),
                std::io::Error::new(std::io::ErrorKind::Other, reason.clone()),
            ));
        }
        Ok(self.parser.clone())
    }
}

/// The three-page document used across tests.
pub fn report_result() -> InferenceResult {
    InferenceResult {
        document_text: "p1\n\np2\n\np3".to_string(),
        page_texts: vec!["p1".into(), "p2".into(), "p3".into()],
        fallback_pages: vec![],
        num_pages: 3,
    }
}
