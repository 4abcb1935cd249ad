use std::path::PathBuf;
use std::str::FromStr;

use crate::pipeline::rag::generator::ChatClientConfig;
use crate::pipeline::rag::retrieval::{
    RetrievalOptions, DEFAULT_MIN_TOKEN_LEN, DEFAULT_TOP_K, EXACT_PHRASE_BONUS,
};

/// Application-level constants
pub const APP_NAME: &str = "Ticket Copilot";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5050;
pub const DEFAULT_CORPUS_DIR: &str = "data/procedures";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

pub const DEFAULT_GENERATOR_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";
pub const DEFAULT_GENERATOR_MODEL: &str = "moonshotai/kimi-k2.5";
pub const DEFAULT_GENERATOR_MAX_TOKENS: u32 = 800;
pub const DEFAULT_GENERATOR_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 60;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,ticket_copilot=debug,tower_http=info"
}

/// Webhook destination for ticket logging.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketLogConfig {
    pub url: String,
    /// Signs request bodies when set.
    pub shared_secret: Option<String>,
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub corpus_dir: PathBuf,
    /// Sheet allowlist; empty means every sheet.
    pub sheets: Vec<String>,
    pub retrieval: RetrievalOptions,
    /// `None` when no API key is configured.
    pub generator: Option<ChatClientConfig>,
    /// `None` when no webhook URL is configured.
    pub ticket_log: Option<TicketLogConfig>,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Process environment, after loading `.env` if present.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let phrase_bonus = parse_or(&get, "RETRIEVAL_PHRASE_BONUS", EXACT_PHRASE_BONUS);
        let retrieval = RetrievalOptions {
            top_k: parse_or(&get, "RETRIEVAL_TOP_K", DEFAULT_TOP_K),
            min_token_len: parse_or(&get, "RETRIEVAL_MIN_TOKEN_LEN", DEFAULT_MIN_TOKEN_LEN),
            phrase_bonus: (phrase_bonus > 0.0).then_some(phrase_bonus),
        };

        let generator = get("NVIDIA_API_KEY").map(|api_key| ChatClientConfig {
            base_url: get("NVIDIA_BASE_URL").unwrap_or_else(|| DEFAULT_GENERATOR_BASE_URL.into()),
            api_key,
            model: get("NVIDIA_MODEL").unwrap_or_else(|| DEFAULT_GENERATOR_MODEL.into()),
            max_tokens: parse_or(&get, "NVIDIA_MAX_TOKENS", DEFAULT_GENERATOR_MAX_TOKENS),
            temperature: parse_or(&get, "NVIDIA_TEMPERATURE", DEFAULT_GENERATOR_TEMPERATURE),
            timeout_secs: parse_or(&get, "NVIDIA_TIMEOUT_SECS", DEFAULT_GENERATOR_TIMEOUT_SECS),
        });

        let ticket_log = get("GAS_URL")
            .or_else(|| get("GAS_WEBAPP_URL"))
            .map(|url| TicketLogConfig {
                url,
                shared_secret: get("GAS_SHARED_SECRET"),
            });

        let mut allowed_origins = split_list(get("ALLOWED_ORIGINS").as_deref());
        if allowed_origins.is_empty() {
            allowed_origins.push(DEFAULT_ALLOWED_ORIGIN.to_string());
        }

        Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port: parse_or(&get, "PORT", DEFAULT_PORT),
            corpus_dir: PathBuf::from(get("CORPUS_DIR").unwrap_or_else(|| DEFAULT_CORPUS_DIR.into())),
            sheets: split_list(get("SHEETS").as_deref()),
            retrieval,
            generator,
            ticket_log,
            allowed_origins,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> T
where
    T: FromStr + Copy,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid numeric setting, using default");
            default
        }),
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:5050");
        assert_eq!(config.corpus_dir, PathBuf::from("data/procedures"));
        assert!(config.sheets.is_empty());
        assert_eq!(config.retrieval, RetrievalOptions::default());
        assert!(config.generator.is_none());
        assert!(config.ticket_log.is_none());
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn generator_enabled_by_api_key() {
        let config = config_from(&[("NVIDIA_API_KEY", "nvapi-test"), ("NVIDIA_MAX_TOKENS", "400")]);
        let generator = config.generator.unwrap();
        assert_eq!(generator.api_key, "nvapi-test");
        assert_eq!(generator.base_url, DEFAULT_GENERATOR_BASE_URL);
        assert_eq!(generator.model, DEFAULT_GENERATOR_MODEL);
        assert_eq!(generator.max_tokens, 400);
        assert_eq!(generator.timeout_secs, 60);
    }

    #[test]
    fn blank_api_key_disables_generator() {
        assert!(config_from(&[("NVIDIA_API_KEY", "   ")]).generator.is_none());
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = config_from(&[("PORT", "not-a-port"), ("RETRIEVAL_TOP_K", "-3")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.retrieval.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn zero_phrase_bonus_disables_it() {
        let config = config_from(&[("RETRIEVAL_PHRASE_BONUS", "0")]);
        assert_eq!(config.retrieval.phrase_bonus, None);
    }

    #[test]
    fn sheets_and_origins_split_on_commas() {
        let config = config_from(&[
            ("SHEETS", "Refunds, Hotel ,,"),
            ("ALLOWED_ORIGINS", "https://copilot.example.com,http://localhost:3000"),
        ]);
        assert_eq!(config.sheets, vec!["Refunds", "Hotel"]);
        assert_eq!(config.allowed_origins.len(), 2);
    }

    #[test]
    fn legacy_webapp_url_key_accepted() {
        let config = config_from(&[("GAS_WEBAPP_URL", "https://script.example/exec")]);
        let log = config.ticket_log.unwrap();
        assert_eq!(log.url, "https://script.example/exec");
        assert!(log.shared_secret.is_none());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
