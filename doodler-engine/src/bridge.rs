//! Generative image edits.
//!
//! An edit runs in two phases so the engine itself stays synchronous:
//! [`GenerativeBridge::begin`] captures the canvas and marks a request in
//! flight, the caller talks to an [`ImageGenerator`], and
//! [`GenerativeBridge::complete`] installs the result (or reports why it
//! could not).

use async_trait::async_trait;
use doodler_renderer::{
    composite_fitted, decode_data_url, downscale_to_max, encode_png_data_url, FitPolicy,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::canvas::CanvasModel;
use crate::config::DoodlerConfig;
use crate::error::EngineResult;

/// Message shown to the user for any failed generation.
pub const USER_ERROR_MESSAGE: &str = "Error generating image. Please try again.";

/// Path of the generation endpoint, relative to the service base URL.
const GENERATE_PATH: &str = "api/image/generate";

/// Errors from the generative edit flow.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The prompt is empty after trimming.
    #[error("prompt is empty")]
    EmptyPrompt,

    /// Another generation is already in flight.
    #[error("a generation request is already in progress")]
    Busy,

    /// The service base URL is malformed.
    #[error("invalid image service URL: {0}")]
    InvalidUrl(String),

    /// The HTTP exchange failed (connection, timeout, bad JSON).
    #[error("image service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("image service returned {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Error text from the response body.
        message: String,
    },

    /// A success response carried no image.
    #[error("image service response did not contain an image")]
    MissingImage,

    /// The canvas changed while the request was in flight.
    #[error("canvas was edited while the request was in flight")]
    Stale,
}

impl BridgeError {
    /// Text suitable for showing to the user.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "Enter a prompt to generate an image.",
            Self::Busy => "An image is already being generated.",
            Self::InvalidUrl(_)
            | Self::Http(_)
            | Self::Service { .. }
            | Self::MissingImage
            | Self::Stale => USER_ERROR_MESSAGE,
        }
    }
}

/// Body of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Trimmed user prompt.
    pub prompt: String,
    /// Current canvas as a PNG data URL.
    pub image: String,
    /// Sampling temperature (0..=1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Body of a successful generation response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated image as a data URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Optional text the model returned alongside the image.
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Something that turns a prompt and an image into a new image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Run one generation.
    ///
    /// # Errors
    ///
    /// Returns a [`BridgeError`] describing the transport or service failure.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, BridgeError>;
}

/// [`ImageGenerator`] backed by the HTTP generation endpoint.
#[derive(Debug, Clone)]
pub struct HttpImageGenerator {
    http: Client,
    endpoint: Url,
}

impl HttpImageGenerator {
    /// Create a client for the service at `base_url`.
    ///
    /// The generation path is appended to whatever path the base URL has.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidUrl`] if the URL is malformed and
    /// [`BridgeError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, BridgeError> {
        let mut base = Url::parse(base_url).map_err(|e| BridgeError::InvalidUrl(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(GENERATE_PATH)
            .map_err(|e| BridgeError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .user_agent(concat!("doodler/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, endpoint })
    }

    /// Full URL requests are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, BridgeError> {
        tracing::debug!("POST {} ({} chars of prompt)", self.endpoint, request.prompt.len());
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| "Failed to generate image".to_string());
            return Err(BridgeError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<GenerateResponse>().await?)
    }
}

/// A generation captured by [`GenerativeBridge::begin`].
#[derive(Debug, Clone)]
pub struct PendingEdit {
    /// Request to send.
    pub request: GenerateRequest,
    generation: u64,
}

impl PendingEdit {
    /// Edit generation the request was captured at.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Prompt state and the single-flight guard for generative edits.
#[derive(Debug, Clone)]
pub struct GenerativeBridge {
    prompt: String,
    loading: bool,
    generation: u64,
    upload_max_dimension: u32,
    fit_policy: FitPolicy,
    temperature: Option<f32>,
    reject_stale_responses: bool,
}

impl GenerativeBridge {
    /// Create an idle bridge.
    #[must_use]
    pub fn new(config: &DoodlerConfig) -> Self {
        Self {
            prompt: String::new(),
            loading: false,
            generation: 0,
            upload_max_dimension: config.upload_max_dimension,
            fit_policy: config.fit_policy,
            temperature: config.temperature,
            reject_stale_responses: config.reject_stale_responses,
        }
    }

    /// Current prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Replace the prompt text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Current edit generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Record that the canvas content changed.
    pub fn note_local_edit(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Capture the canvas and mark a request in flight.
    ///
    /// The committed snapshot is downscaled so its longer edge fits the
    /// upload limit and encoded as a PNG data URL.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::EmptyPrompt`], [`BridgeError::Busy`], or a
    /// render error if the snapshot cannot be encoded. The bridge stays idle
    /// on error.
    pub fn begin(&mut self, canvas: &CanvasModel) -> EngineResult<PendingEdit> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(BridgeError::EmptyPrompt.into());
        }
        if self.loading {
            return Err(BridgeError::Busy.into());
        }

        let upload = downscale_to_max(canvas.snapshot(), self.upload_max_dimension)?;
        let image = encode_png_data_url(&upload)?;
        let request = GenerateRequest {
            prompt: prompt.to_string(),
            image,
            temperature: self.temperature,
        };

        self.loading = true;
        tracing::info!(
            "Generative edit started ({}x{} upload, generation {})",
            upload.width(),
            upload.height(),
            self.generation
        );
        Ok(PendingEdit {
            request,
            generation: self.generation,
        })
    }

    /// Finish a request started with [`begin`](Self::begin).
    ///
    /// On success the generated image is fitted onto a white canvas-sized
    /// raster, installed as the canvas content and the prompt is cleared.
    /// The trimmed prompt that produced it is returned.
    ///
    /// On failure nothing on the canvas changes and the prompt is kept.
    ///
    /// # Errors
    ///
    /// Returns the generator's [`BridgeError`], [`BridgeError::MissingImage`],
    /// [`BridgeError::Stale`] when stale responses are rejected, or a render
    /// error if the image cannot be decoded.
    pub fn complete(
        &mut self,
        canvas: &mut CanvasModel,
        pending: PendingEdit,
        outcome: Result<GenerateResponse, BridgeError>,
    ) -> EngineResult<String> {
        self.loading = false;

        let response = outcome.inspect_err(|e| {
            tracing::warn!("Generative edit failed: {e}");
        })?;
        if self.reject_stale_responses && pending.generation != self.generation {
            tracing::warn!(
                "Discarding generated image from generation {} (now {})",
                pending.generation,
                self.generation
            );
            return Err(BridgeError::Stale.into());
        }
        let image = response.image.ok_or_else(|| {
            tracing::warn!("Generative edit response carried no image");
            BridgeError::MissingImage
        })?;
        if let Some(description) = response.description.as_deref() {
            tracing::info!("Generated image description: {description}");
        }

        let generated = decode_data_url(&image)?;
        let fitted = composite_fitted(
            &generated,
            canvas.width(),
            canvas.height(),
            self.fit_policy,
        )?;
        canvas.apply_snapshot(fitted)?;
        self.note_local_edit();
        self.prompt.clear();
        tracing::info!(
            "Installed generated {}x{} image ({:?})",
            generated.width(),
            generated.height(),
            self.fit_policy
        );
        Ok(pending.request.prompt)
    }
}
