use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{GameResult, Guess, Question},
    error::{ApiError, ApiException},
    protocol::{CallKind, CallReply, CallRequest, CanisterMethod},
};
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

pub mod config;
pub mod game;
pub mod mock;

pub use config::{load_settings, BackendKind, Settings};
pub use game::{format_price, GameError, GameSession, Screen, Step};
pub use mock::MockQuizBackend;

const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("remote client is unavailable")]
    Unavailable,
    #[error("{method} rejected by canister (code {code}): {message}")]
    Rejected {
        method: &'static str,
        code: u32,
        message: String,
    },
    #[error("gateway returned HTTP {status}: {source}")]
    Api {
        status: u16,
        #[source]
        source: ApiException,
    },
    #[error("gateway returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed {method} reply: {reason}")]
    MalformedReply { method: &'static str, reason: String },
}

/// Remote side of the game: one query for the questions, one update for the score.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    async fn get_questions(&self) -> Result<Vec<Question>>;
    async fn submit_guesses(&self, guesses: Vec<Guess>) -> Result<GameResult>;
    fn label(&self) -> String;
}

pub struct MissingQuizBackend;

#[async_trait]
impl QuizBackend for MissingQuizBackend {
    async fn get_questions(&self) -> Result<Vec<Question>> {
        Err(BackendError::Unavailable.into())
    }

    async fn submit_guesses(&self, _guesses: Vec<Guess>) -> Result<GameResult> {
        Err(BackendError::Unavailable.into())
    }

    fn label(&self) -> String {
        "missing".to_string()
    }
}

/// Talks to the quiz canister through an HTTPS gateway using a JSON call envelope.
pub struct HttpQuizBackend {
    http: Client,
    gateway_url: Url,
    canister_id: String,
}

impl HttpQuizBackend {
    pub fn new(gateway_url: &str, canister_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Self::with_client(http, gateway_url, canister_id)
    }

    pub fn with_client(
        http: Client,
        gateway_url: &str,
        canister_id: impl Into<String>,
    ) -> Result<Self> {
        let gateway_url = Url::parse(gateway_url)
            .with_context(|| format!("invalid gateway url '{gateway_url}'"))?;
        let canister_id = canister_id.into();
        if canister_id.trim().is_empty() {
            bail!("canister id must not be empty");
        }
        Ok(Self {
            http,
            gateway_url,
            canister_id,
        })
    }

    pub fn endpoint(&self, kind: CallKind) -> Result<Url> {
        let mut url = self.gateway_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("gateway url cannot carry a path: {}", self.gateway_url))?
            .pop_if_empty()
            .extend(["api", "v2", "canister", self.canister_id.as_str(), kind.endpoint()]);
        Ok(url)
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        method: CanisterMethod,
        arg: serde_json::Value,
    ) -> Result<T> {
        let url = self.endpoint(method.kind())?;
        let res = self
            .http
            .post(url.clone())
            .json(&CallRequest::new(method, arg))
            .send()
            .await
            .with_context(|| format!("failed to reach gateway at {url}"))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                return Err(BackendError::Api {
                    status: status.as_u16(),
                    source: api_error.into(),
                }
                .into());
            }
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let reply: CallReply<T> = res.json().await.map_err(|err| BackendError::MalformedReply {
            method: method.name(),
            reason: err.to_string(),
        })?;
        match reply {
            CallReply::Replied { reply } => Ok(reply),
            CallReply::Rejected {
                reject_code,
                reject_message,
            } => Err(BackendError::Rejected {
                method: method.name(),
                code: reject_code,
                message: reject_message,
            }
            .into()),
        }
    }
}

#[async_trait]
impl QuizBackend for HttpQuizBackend {
    async fn get_questions(&self) -> Result<Vec<Question>> {
        self.invoke(CanisterMethod::GetQuestions, serde_json::Value::Null)
            .await
    }

    async fn submit_guesses(&self, guesses: Vec<Guess>) -> Result<GameResult> {
        let arg = serde_json::to_value(&guesses).context("failed to encode guesses")?;
        self.invoke(CanisterMethod::SubmitGuesses, arg).await
    }

    fn label(&self) -> String {
        format!("{} via {}", self.canister_id, self.gateway_url)
    }
}

/// Runs backend calls for a [`GameSession`] and logs their outcome.
#[derive(Clone)]
pub struct QuizClient {
    backend: Arc<dyn QuizBackend>,
}

impl QuizClient {
    pub fn new(backend: Arc<dyn QuizBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_label(&self) -> String {
        self.backend.label()
    }

    pub async fn fetch_questions(&self) -> Result<Vec<Question>> {
        info!(backend = %self.backend.label(), "fetching questions");
        match self.backend.get_questions().await {
            Ok(questions) => {
                info!(count = questions.len(), "questions loaded");
                if questions.is_empty() {
                    warn!("backend returned no questions");
                }
                Ok(questions)
            }
            Err(err) => {
                error!("failed to load questions: {err:#}");
                Err(err)
            }
        }
    }

    pub async fn submit_guesses(&self, guesses: Vec<Guess>) -> Result<GameResult> {
        info!(count = guesses.len(), "submitting guesses");
        match self.backend.submit_guesses(guesses).await {
            Ok(result) => {
                info!(score = result.score, max_score = result.max_score, "result received");
                Ok(result)
            }
            Err(err) => {
                error!("failed to submit guesses: {err:#}");
                Err(err)
            }
        }
    }

    /// Fetches the questions and moves the session to the welcome screen.
    pub async fn load_into(&self, session: &mut GameSession) -> Result<()> {
        match self.fetch_questions().await {
            Ok(questions) => {
                session.questions_loaded(questions);
                Ok(())
            }
            Err(err) => {
                session.load_failed(format!("{err:#}"));
                Err(err)
            }
        }
    }

    /// Submits the finished round and moves the session to the result (or welcome) screen.
    pub async fn submit_from(
        &self,
        session: &mut GameSession,
        guesses: Vec<Guess>,
    ) -> Result<GameResult> {
        match self.submit_guesses(guesses).await {
            Ok(result) => {
                session.result_received(result.clone());
                Ok(result)
            }
            Err(err) => {
                session.submit_failed(format!("{err:#}"));
                Err(err)
            }
        }
    }
}

/// HTTP client for car image downloads, bounded by the same timeout as quiz calls.
pub fn image_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build image http client")
}

pub async fn download_image(http: &Client, url: &str) -> Result<Vec<u8>> {
    download_image_capped(http, url, MAX_IMAGE_BYTES).await
}

async fn download_image_capped(http: &Client, url: &str, limit: usize) -> Result<Vec<u8>> {
    let mut res = http
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch image {url}"))?
        .error_for_status()?;
    if let Some(len) = res.content_length() {
        if len > limit as u64 {
            bail!("image {url} is {len} bytes; limit is {limit}");
        }
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = res
        .chunk()
        .await
        .with_context(|| format!("failed to read image {url}"))?
    {
        if bytes.len() + chunk.len() > limit {
            bail!("image {url} exceeds the {limit} byte limit");
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
