use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 4070;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OUTPUT_DIR: &str = "public/output";
pub const DEFAULT_BASE_NAME: &str = "manga";
pub const DEFAULT_PUBLIC_PREFIX: &str = "/public/output";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub output_dir: Option<PathBuf>,
    pub base_name: Option<String>,
    pub public_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub json_logs: bool,
    pub gemini: GeminiConfig,
    pub storage: StorageConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: None,
            base_url: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        // An empty key counts as missing, same as an unset variable.
        let api_key = env::var("GEMINI_API_KEY").ok().filter(|key| !key.is_empty());
        let model = env::var("GEMINI_MODEL").ok();
        let base_url = env::var("GEMINI_BASE_URL").ok();

        GeminiConfig {
            api_key,
            model,
            base_url,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_BASE_URL)
            .trim_end_matches('/')
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            output_dir: None,
            base_name: None,
            public_prefix: None,
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let output_dir = env::var("OUTPUT_DIR").ok().map(PathBuf::from);
        let base_name = env::var("OUTPUT_BASE_NAME").ok();
        let public_prefix = env::var("PUBLIC_URL_PREFIX").ok();

        StorageConfig {
            output_dir,
            base_name,
            public_prefix,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = Some(base_name.into());
        self
    }

    pub fn with_public_prefix(mut self, public_prefix: impl Into<String>) -> Self {
        self.public_prefix = Some(public_prefix.into());
        self
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn base_name(&self) -> &str {
        self.base_name.as_deref().unwrap_or(DEFAULT_BASE_NAME)
    }

    pub fn public_prefix(&self) -> &str {
        self.public_prefix
            .as_deref()
            .unwrap_or(DEFAULT_PUBLIC_PREFIX)
            .trim_end_matches('/')
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: None,
            port: None,
            json_logs: false,
            gemini: GeminiConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let host = env::var("HOST").ok();
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let json_logs = env::var("LOG_FORMAT")
            .ok()
            .map_or(false, |val| val.eq_ignore_ascii_case("json"));

        Config {
            host,
            port,
            json_logs,
            gemini: GeminiConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_storage(mut self, config: StorageConfig) -> Self {
        self.storage = config;
        self
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }
}
