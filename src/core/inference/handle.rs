//! The shared, load-once handle to the OCR model.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{DocumentParser, ModelRuntime};
use crate::core::config::ModelConfig;
use crate::core::errors::{InferenceError, StartupFailure};
use crate::domain::{InferenceOptions, InferenceResult};

/// Owns the loaded model for the lifetime of the service.
///
/// The model is loaded by [`initialize`](Self::initialize); until that
/// completes every [`infer`](Self::infer) call is rejected with
/// [`InferenceError::NotReady`]. After loading the handle is read-only and
/// safe to share across concurrent requests.
pub struct InferenceHandle {
    config: ModelConfig,
    runtime: Arc<dyn ModelRuntime>,
    parser: OnceCell<Arc<dyn DocumentParser>>,
    released: AtomicBool,
}

impl InferenceHandle {
    /// Create an unloaded handle.
    pub fn new(config: ModelConfig, runtime: Arc<dyn ModelRuntime>) -> Self {
        Self {
            config,
            runtime,
            parser: OnceCell::new(),
            released: AtomicBool::new(false),
        }
    }

    /// The startup parameters of the model.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Load the model.
    ///
    /// Idempotent: once loaded, further calls return immediately. Concurrent
    /// callers wait on the same load instead of starting another.
    pub async fn initialize(&self) -> Result<(), StartupFailure> {
        self.parser
            .get_or_try_init(|| async {
                self.config.validate()?;
                info!(
                    model_path = %self.config.model_path.display(),
                    gpu_memory_utilization = self.config.gpu_memory_utilization,
                    max_model_len = self.config.max_model_len,
                    "Loading model"
                );
                let start = Instant::now();
                let parser = self.runtime.load(&self.config).await?;
                info!(
                    load_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Model loaded successfully"
                );
                Ok::<_, StartupFailure>(parser)
            })
            .await
            .map(|_| ())
    }

    /// Whether the model is loaded and able to serve requests.
    ///
    /// False before [`initialize`](Self::initialize), after
    /// [`shutdown`](Self::shutdown), and once the collaborator has died.
    pub fn is_loaded(&self) -> bool {
        self.live_parser().is_some()
    }

    fn live_parser(&self) -> Option<&Arc<dyn DocumentParser>> {
        if self.released.load(Ordering::SeqCst) {
            return None;
        }
        self.parser.get().filter(|parser| parser.is_alive())
    }

    /// Run the collaborator on the document at `path`.
    ///
    /// A null result, an empty result, a result whose page counts disagree and
    /// a collaborator error are all reported as failures.
    pub async fn infer(
        &self,
        path: &Path,
        options: &InferenceOptions,
    ) -> Result<InferenceResult, InferenceError> {
        let parser = self.live_parser().ok_or(InferenceError::NotReady)?;

        match parser.parse(path, options).await {
            Ok(Some(result)) if result.is_empty() => Err(InferenceError::EmptyResult),
            Ok(Some(result)) => {
                if let Err(reason) = result.validate() {
                    warn!(reason = %reason, "Collaborator returned an inconsistent result");
                    return Err(InferenceError::failure(reason));
                }
                Ok(result)
            }
            Ok(None) => Err(InferenceError::EmptyResult),
            Err(e) => Err(InferenceError::failure(e.to_string())),
        }
    }

    /// Release the model if it was loaded. Only the first call has an effect.
    pub async fn shutdown(&self) {
        let Some(parser) = self.parser.get() else {
            return;
        };
        if !self.released.swap(true, Ordering::SeqCst) {
            parser.shutdown().await;
        }
    }
}

impl std::fmt::Debug for InferenceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceHandle")
            .field("config", &self.config)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::testing::{report_result, MockParser, MockReply, MockRuntime};
    use std::time::Duration;

    fn handle_with(reply: MockReply) -> (InferenceHandle, Arc<MockParser>, Arc<MockRuntime>) {
        let parser = Arc::new(MockParser::new(reply));
        let runtime = Arc::new(MockRuntime::new(parser.clone()));
        let handle = InferenceHandle::new(ModelConfig::default(), runtime.clone());
        (handle, parser, runtime)
    }

    #[tokio::test]
    async fn test_infer_before_initialize_is_not_ready() {
        let (handle, parser, _) = handle_with(MockReply::Result(report_result()));
        assert!(!handle.is_loaded());

        let err = handle
            .infer(Path::new("/tmp/a.pdf"), &InferenceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::NotReady));
        assert!(parser.calls().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (handle, _, runtime) = handle_with(MockReply::Result(report_result()));

        handle.initialize().await.unwrap();
        handle.initialize().await.unwrap();

        assert!(handle.is_loaded());
        assert_eq!(runtime.loads(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_initialize_loads_once() {
        let parser = Arc::new(MockParser::new(MockReply::Null));
        let runtime =
            Arc::new(MockRuntime::new(parser).with_delay(Duration::from_millis(50)));
        let handle = Arc::new(InferenceHandle::new(ModelConfig::default(), runtime.clone()));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.initialize().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(runtime.loads(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_handle_unloaded() {
        let parser = Arc::new(MockParser::new(MockReply::Null));
        let runtime = Arc::new(MockRuntime::failing(parser, "insufficient accelerator memory"));
        let handle = InferenceHandle::new(ModelConfig::default(), runtime);

        let err = handle.initialize().await.unwrap_err();
        assert!(matches!(err, StartupFailure::ModelLoad { .. }));
        assert!(!handle.is_loaded());
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_load() {
        let parser = Arc::new(MockParser::new(MockReply::Null));
        let runtime = Arc::new(MockRuntime::new(parser));
        let config = ModelConfig::default().with_gpu_memory_utilization(2.0);
        let handle = InferenceHandle::new(config, runtime.clone());

        let err = handle.initialize().await.unwrap_err();
        assert!(matches!(err, StartupFailure::Config(_)));
        assert_eq!(runtime.loads(), 0);
    }

    #[tokio::test]
    async fn test_infer_passes_path_and_options() {
        let (handle, parser, _) = handle_with(MockReply::Result(report_result()));
        handle.initialize().await.unwrap();

        let options = InferenceOptions::new()
            .with_skip_cross_page_merge(true)
            .with_max_page_retries(4);
        let result = handle.infer(Path::new("/tmp/doc.pdf"), &options).await.unwrap();

        assert_eq!(result, report_result());
        let calls = parser.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, Path::new("/tmp/doc.pdf"));
        assert_eq!(calls[0].options, options);
    }

    #[tokio::test]
    async fn test_null_result_is_failure() {
        let (handle, _, _) = handle_with(MockReply::Null);
        handle.initialize().await.unwrap();

        let err = handle
            .infer(Path::new("/tmp/doc.pdf"), &InferenceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::EmptyResult));
    }

    #[tokio::test]
    async fn test_empty_result_is_failure() {
        let empty = InferenceResult {
            document_text: String::new(),
            page_texts: vec![],
            fallback_pages: vec![],
            num_pages: 0,
        };
        let (handle, _, _) = handle_with(MockReply::Result(empty));
        handle.initialize().await.unwrap();

        let err = handle
            .infer(Path::new("/tmp/doc.pdf"), &InferenceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::EmptyResult));
    }

    #[tokio::test]
    async fn test_collaborator_error_keeps_message() {
        let (handle, _, _) = handle_with(MockReply::Error("page 2 render failed".into()));
        handle.initialize().await.unwrap();

        let err = handle
            .infer(Path::new("/tmp/doc.pdf"), &InferenceOptions::default())
            .await
            .unwrap_err();
        match err {
            InferenceError::Failure { message } => assert_eq!(message, "page 2 render failed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_inconsistent_result_is_failure() {
        let mut broken = report_result();
        broken.num_pages = 5;
        let (handle, _, _) = handle_with(MockReply::Result(broken));
        handle.initialize().await.unwrap();

        let err = handle
            .infer(Path::new("/tmp/doc.pdf"), &InferenceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Failure { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_only_after_load() {
        let (handle, parser, _) = handle_with(MockReply::Null);
        handle.shutdown().await;
        assert_eq!(parser.shutdowns(), 0);

        handle.initialize().await.unwrap();
        handle.shutdown().await;
        handle.shutdown().await;
        assert_eq!(parser.shutdowns(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_clears_readiness() {
        let (handle, parser, _) = handle_with(MockReply::Result(report_result()));
        handle.initialize().await.unwrap();
        assert!(handle.is_loaded());

        handle.shutdown().await;
        assert!(!handle.is_loaded());

        let err = handle
            .infer(Path::new("/tmp/doc.pdf"), &InferenceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::NotReady));
        assert!(parser.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dead_collaborator_is_not_ready() {
        let (handle, parser, _) = handle_with(MockReply::Result(report_result()));
        handle.initialize().await.unwrap();

        parser.kill();
        assert!(!handle.is_loaded());
        let err = handle
            .infer(Path::new("/tmp/doc.pdf"), &InferenceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::NotReady));
    }
}
