//! Cloud conversion: hand the document to a remote parsing endpoint.
//!
//! The document is POSTed as multipart form data; the endpoint responds
//! with JSON carrying the Markdown text. Only registered when an endpoint
//! is configured, so `mode=cloud` fails fast at submit time otherwise.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::CloudConfig;
use crate::convert::{Converter, Markdown, SourceDocument};
use crate::error::{MarkifyError, Result};

pub struct CloudConverter {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

/// Response shape of the remote parsing API.
#[derive(Deserialize)]
struct CloudResponse {
    #[serde(default)]
    title: Option<String>,
    markdown: String,
}

impl CloudConverter {
    pub fn new(config: &CloudConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl Converter for CloudConverter {
    async fn convert(&self, doc: SourceDocument) -> Result<Markdown> {
        let part = reqwest::multipart::Part::bytes(doc.content).file_name(doc.filename.clone());
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MarkifyError::Conversion(format!("cloud request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarkifyError::Conversion(format!(
                "cloud endpoint returned {status}: {}",
                body.trim()
            )));
        }

        let body: CloudResponse = response.json().await.map_err(|e| {
            MarkifyError::Conversion(format!("cloud endpoint returned invalid JSON: {e}"))
        })?;

        Ok(Markdown {
            title: body.title,
            text: body.markdown,
        })
    }
}
