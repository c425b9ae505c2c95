use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.ghiblio.art/gpt4o_image/";
pub const DEBUG_API_BASE: &str = "http://localhost:9999/gpt4o_image/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

pub const API_KEY_ENV: &str = "GHIBLIO_ART_API_KEY";
pub const API_BASE_ENV: &str = "GHIBLIO_API_BASE";
pub const DEBUG_ENV: &str = "GHIBLIO_DEBUG";
pub const TIMEOUT_ENV: &str = "GHIBLIO_TIMEOUT_SECS";
pub const LOG_LEVEL_ENV: &str = "GHIBLIO_LOG_LEVEL";
pub const LOG_FILE_ENV: &str = "GHIBLIO_LOG_FILE";

#[derive(Debug, Clone)]
pub struct GhiblioConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub debug: bool,
    pub timeout_secs: u64,
    /// Tag forwarded with every generation so the service can attribute the call.
    pub source: String,
}

impl Default for GhiblioConfig {
    fn default() -> Self {
        GhiblioConfig {
            api_key: None,
            api_base: None,
            debug: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            source: "mcp".to_string(),
        }
    }
}

impl GhiblioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty());
        let api_base = env::var(API_BASE_ENV).ok().filter(|base| !base.is_empty());
        let debug = env::var(DEBUG_ENV).ok().map_or(false, |val| val == "true");
        let timeout_secs = env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|secs| secs.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        GhiblioConfig {
            api_key,
            api_base,
            debug,
            timeout_secs,
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Explicit base URL first, then the debug endpoint, then production.
    /// `from_env` has already folded `GHIBLIO_API_BASE` into `api_base`.
    pub fn resolved_api_base(&self) -> String {
        let base = match &self.api_base {
            Some(base) => base.clone(),
            None if self.debug => DEBUG_API_BASE.to_string(),
            None => DEFAULT_API_BASE.to_string(),
        };

        if base.ends_with('/') {
            base
        } else {
            format!("{}/", base)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured key wins; the per-call value is only used when none is configured.
    pub fn credential<'a>(&'a self, call_auth: Option<&'a str>) -> Option<&'a str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .or_else(|| call_auth.filter(|key| !key.is_empty()))
    }
}
