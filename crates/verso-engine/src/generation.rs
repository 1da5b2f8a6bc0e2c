//! Client for the reply generation endpoint.
//!
//! The endpoint takes `POST /generar` with `{"mensaje": "..."}` and answers
//! `{"respuesta": "..."}`. Only `respuesta` is read; a non-success status
//! or any other body shape is a failure.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Path of the generation route, relative to the endpoint base URL.
pub const GENERATE_PATH: &str = "/generar";

/// Errors from a generation request.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request interrupted: {0}")]
    Interrupted(String),
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    mensaje: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    respuesta: String,
}

/// Something that turns a user message into a reply.
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        message: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// HTTP implementation of [`Generator`].
///
/// No request timeout is configured: a hung request stays pending.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: Client,
    url: String,
}

impl HttpGenerator {
    /// Create a generator for the endpoint at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .user_agent(concat!("verso/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let url = format!("{}{GENERATE_PATH}", base_url.trim_end_matches('/'));
        Ok(Self { client, url })
    }

    /// Full URL requests are sent to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Generator for HttpGenerator {
    async fn generate(&self, message: &str) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.url)
            .json(&GenerateRequest { mensaje: message })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "Generation response received");

        if !status.is_success() {
            return Err(GenerationError::InvalidResponse(format!("HTTP {status}")));
        }
        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            GenerationError::InvalidResponse(format!("missing respuesta: {e}"))
        })?;
        Ok(parsed.respuesta)
    }
}
