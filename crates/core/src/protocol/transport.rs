use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

use super::VerifyError;

/// A raw response from the remote: HTTP status plus best-effort JSON body.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: Value,
}

/// Transport seam for the verification workflow.
///
/// Step submissions and document uploads go through different code paths on
/// the remote (JSON API vs. pre-signed storage URLs), hence the two methods.
#[async_trait]
pub trait VerificationTransport: Send + Sync {
    /// Send a JSON request and return the status with the parsed body.
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<WireResponse, VerifyError>;

    /// PUT raw bytes to a pre-signed upload URL, returning the HTTP status.
    async fn upload(&self, url: &str, content: &[u8], mime_type: &str)
        -> Result<u16, VerifyError>;
}

/// Production transport over reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    upload_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64, upload_timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        // Uploads move megabytes to storage endpoints; give them more room.
        let upload_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(upload_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            upload_client,
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> VerifyError {
    if e.is_timeout() {
        VerifyError::Timeout
    } else {
        VerifyError::Transport(e.to_string())
    }
}

#[async_trait]
impl VerificationTransport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<WireResponse, VerifyError> {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_reqwest_error)?;
        // Some error responses come back as plain text; keep them readable.
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(WireResponse { status, body })
    }

    async fn upload(
        &self,
        url: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<u16, VerifyError> {
        let response = self
            .upload_client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(content.to_vec())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        Ok(response.status().as_u16())
    }
}
