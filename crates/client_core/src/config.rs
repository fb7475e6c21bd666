use std::{fmt, fs, path::Path, str::FromStr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::{HttpQuizBackend, MockQuizBackend, QuizBackend};

pub const SETTINGS_FILE: &str = "car_quiz.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Remote,
    Mock,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(BackendKind::Remote),
            "mock" => Ok(BackendKind::Mock),
            other => Err(format!("unknown backend '{other}' (expected 'remote' or 'mock')")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Remote => f.write_str("remote"),
            BackendKind::Mock => f.write_str("mock"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendKind,
    pub gateway_url: String,
    pub canister_id: String,
    pub request_timeout_secs: u64,
    /// Pause between a selection and the next question.
    pub advance_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Remote,
            gateway_url: "https://icp0.io".into(),
            canister_id: "ebwns-iiaaa-aaaam-qdtta-cai".into(),
            request_timeout_secs: 30,
            advance_delay_ms: 300,
        }
    }
}

impl Settings {
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend == BackendKind::Mock {
            return Ok(());
        }
        let url = Url::parse(&self.gateway_url)
            .with_context(|| format!("invalid gateway url '{}'", self.gateway_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("gateway url must use http or https, got '{}'", url.scheme());
        }
        if self.canister_id.trim().is_empty() {
            bail!("canister id must not be empty");
        }
        if self.request_timeout_secs == 0 {
            bail!("request timeout must be at least one second");
        }
        Ok(())
    }

    pub fn build_backend(&self) -> anyhow::Result<Arc<dyn QuizBackend>> {
        self.validate()?;
        Ok(match self.backend {
            BackendKind::Mock => Arc::new(MockQuizBackend::default()),
            BackendKind::Remote => Arc::new(HttpQuizBackend::new(
                &self.gateway_url,
                self.canister_id.clone(),
                self.request_timeout(),
            )?),
        })
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE))
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings_from(path: &Path) -> Settings {
    load_settings_with(path, |name| std::env::var(name).ok())
}

/// Like [`load_settings_from`], with overrides read through `lookup` instead of the process env.
pub fn load_settings_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<Settings>(&raw) {
            Ok(file_settings) => settings = file_settings,
            Err(err) => warn!(path = %path.display(), "ignoring unreadable settings file: {err}"),
        }
    }

    apply_overrides(&mut settings, lookup);
    settings
}

fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("IC_HOST") {
        settings.gateway_url = v;
    }
    if let Some(v) = lookup("APP__GATEWAY_URL") {
        settings.gateway_url = v;
    }

    if let Some(v) = lookup("CANISTER_ID") {
        settings.canister_id = v;
    }
    if let Some(v) = lookup("APP__CANISTER_ID") {
        settings.canister_id = v;
    }

    if let Some(v) = lookup("APP__BACKEND") {
        match v.parse::<BackendKind>() {
            Ok(kind) => settings.backend = kind,
            Err(err) => warn!("ignoring APP__BACKEND: {err}"),
        }
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = lookup("APP__ADVANCE_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.advance_delay_ms = parsed;
        }
    }
}
