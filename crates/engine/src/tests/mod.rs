//! Engine-level tests against a scripted generator.


use fsc_core::{AppError, AppResult};
use fsc_llm::{GroundedGenerator, GroundedRequest, GroundedResponse, StoreDescriptor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Generator that returns a canned result and records every call.
pub(crate) struct ScriptedGenerator {
    reply: Mutex<Option<AppResult<GroundedResponse>>>,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<GroundedRequest>>,
}

impl ScriptedGenerator {
    pub fn replying(response: GroundedResponse) -> Self {
        Self::with_reply(Ok(response))
    }

    pub fn failing(err: AppError) -> Self {
        Self::with_reply(Err(err))
    }

    fn with_reply(reply: AppResult<GroundedResponse>) -> Self {
        Self {
            reply: Mutex::new(Some(reply)),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GroundedGenerator for ScriptedGenerator {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GroundedRequest) -> AppResult<GroundedResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.reply
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(AppError::Service("script exhausted".to_string())))
    }

    async fn describe_store(&self, store_name: &str) -> AppResult<StoreDescriptor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(StoreDescriptor {
            name: store_name.to_string(),
            display_name: Some("fsc-penalty-cases".to_string()),
            active_documents_count: Some(490),
            create_time: None,
        })
    }
}
