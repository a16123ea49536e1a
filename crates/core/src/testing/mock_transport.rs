use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::protocol::{VerificationTransport, VerifyError, WireResponse};

enum ScriptedResponse {
    Response(WireResponse),
    Error(VerifyError),
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub url: String,
    pub mime_type: String,
    pub size: usize,
}

/// Scripted transport: responses are queued up front and popped per call,
/// every call is recorded for assertions.
///
/// An exhausted response queue is a transport error, so a test that makes
/// more calls than it scripted fails loudly instead of hanging on defaults.
/// Uploads default to HTTP 200 when nothing is queued.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    upload_results: Mutex<VecDeque<Result<u16, VerifyError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: Value) {
        self.lock(&self.responses)
            .push_back(ScriptedResponse::Response(WireResponse { status, body }));
    }

    pub fn push_transport_error(&self, message: &str) {
        self.lock(&self.responses)
            .push_back(ScriptedResponse::Error(VerifyError::Transport(
                message.to_string(),
            )));
    }

    pub fn push_upload_status(&self, status: u16) {
        self.lock(&self.upload_results).push_back(Ok(status));
    }

    pub fn push_upload_error(&self, message: &str) {
        self.lock(&self.upload_results)
            .push_back(Err(VerifyError::Transport(message.to_string())));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock(&self.requests).clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.lock(&self.uploads).clone()
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl VerificationTransport for MockTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<WireResponse, VerifyError> {
        self.lock(&self.requests).push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            body: body.cloned(),
        });

        match self.lock(&self.responses).pop_front() {
            Some(ScriptedResponse::Response(response)) => Ok(response),
            Some(ScriptedResponse::Error(e)) => Err(e),
            None => Err(VerifyError::Transport(format!(
                "no scripted response for {method} {url}"
            ))),
        }
    }

    async fn upload(
        &self,
        url: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<u16, VerifyError> {
        self.lock(&self.uploads).push(RecordedUpload {
            url: url.to_string(),
            mime_type: mime_type.to_string(),
            size: content.len(),
        });

        self.lock(&self.upload_results)
            .pop_front()
            .unwrap_or(Ok(200))
    }
}
