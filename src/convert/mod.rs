//! Converter boundary.
//!
//! The job engine never parses documents itself. Each conversion mode maps
//! to one [`Converter`] implementation, and the [`ConverterRegistry`]
//! routes a job's configured mode to the backend that produces its
//! Markdown. Adding a mode means registering another converter; the
//! engine stays mode-agnostic.
//!
//! Built-in backends:
//!
//! - [`PlainTextConverter`] (fast): text-like formats pass through
//! - [`AdvancedConverter`]: external parsing tool for binary formats
//! - [`CloudConverter`]: remote parsing endpoint

mod advanced;
mod cloud;
mod plaintext;

pub use advanced::AdvancedConverter;
pub use cloud::CloudConverter;
pub use plaintext::PlainTextConverter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::ConvertersConfig;
use crate::error::{MarkifyError, Result};

/// The selected conversion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    Fast,
    Advanced,
    Cloud,
}

impl ConversionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMode::Fast => "fast",
            ConversionMode::Advanced => "advanced",
            ConversionMode::Cloud => "cloud",
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionMode {
    type Err = MarkifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fast" => Ok(ConversionMode::Fast),
            "advanced" => Ok(ConversionMode::Advanced),
            "cloud" => Ok(ConversionMode::Cloud),
            other => Err(MarkifyError::UnsupportedMode(other.to_string())),
        }
    }
}

/// A source document handed to a converter.
///
/// Ownership of the bytes is transferred in; converters must not retain
/// them after returning.
pub struct SourceDocument {
    pub filename: String,
    pub content: Vec<u8>,
}

impl SourceDocument {
    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// File name without its extension.
    pub fn stem(&self) -> Option<String> {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
    }
}

/// The produced Markdown artifact.
#[derive(Debug, Clone)]
pub struct Markdown {
    pub title: Option<String>,
    pub text: String,
}

/// A document parsing backend for one conversion mode.
///
/// Implementations are called concurrently from worker tasks and must not
/// block the executor; compute-heavy parsing belongs in `spawn_blocking`.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, doc: SourceDocument) -> Result<Markdown>;
}

/// Mode -> converter routing table.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: HashMap<ConversionMode, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, mode: ConversionMode, converter: Arc<dyn Converter>) {
        self.converters.insert(mode, converter);
    }

    /// Whether the mode has a registered backend. Checked at submit time
    /// so an unsupported mode fails fast instead of after queueing.
    pub fn supports(&self, mode: ConversionMode) -> bool {
        self.converters.contains_key(&mode)
    }

    pub fn get(&self, mode: ConversionMode) -> Option<Arc<dyn Converter>> {
        self.converters.get(&mode).cloned()
    }

    /// Build the registry from configuration.
    ///
    /// Fast is always available. Advanced is registered whenever a parsing
    /// command is configured (the default assumes one on PATH; if it turns
    /// out to be missing, jobs fail with a conversion error at run time).
    /// Cloud is registered only when an endpoint is configured; otherwise
    /// submitting `mode=cloud` is rejected as unsupported.
    pub fn from_config(config: &ConvertersConfig) -> Self {
        let mut registry = Self::new();
        registry.register(ConversionMode::Fast, Arc::new(PlainTextConverter::new()));

        if !config.advanced.command.is_empty() {
            registry.register(
                ConversionMode::Advanced,
                Arc::new(AdvancedConverter::new(&config.advanced)),
            );
        }

        if let Some(endpoint) = &config.cloud.endpoint {
            if !endpoint.is_empty() {
                registry.register(
                    ConversionMode::Cloud,
                    Arc::new(CloudConverter::new(&config.cloud)),
                );
            }
        }

        registry
    }
}
