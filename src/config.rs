//! Configuração do eventblast carregada a partir de `eventblast.toml`.
//!
//! A struct [`AppConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `TELEGRAM_BOT_TOKEN` tem precedência sobre o arquivo.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::campaign::RetryPolicy;
use crate::error::AppError;
use crate::telegram::client::API_BASE;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const DEFAULT_CONFIG_FILE: &str = "eventblast.toml";

/// Variável de ambiente com o token do bot.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Configuração de nível superior carregada de `eventblast.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Token do bot do Telegram.
    #[serde(default)]
    pub telegram_token: String,

    /// URL base da Bot API (sobrescrita em testes).
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,

    /// Tentativas por job antes de marcá-lo como falho.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Atraso base em milissegundos para o backoff exponencial.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Concorrência inicial de cada sessão e do modo `run`.
    #[serde(default = "default_workers")]
    pub default_workers: usize,

    /// Limite superior aceito por `/workers`.
    #[serde(default = "default_max_workers_limit")]
    pub max_workers_limit: usize,

    /// Diretório dos arquivos enviados pelo chat.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Diretório dos arquivos `results_*.json`.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Lista de proxies compartilhada.
    #[serde(default = "default_proxies_file")]
    pub proxies_file: PathBuf,

    /// Timeout do long poll de `getUpdates`, em segundos.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

fn default_telegram_api_base() -> String {
    API_BASE.to_string()
}

// Valor padrão para tentativas: 3.
fn default_max_retries() -> u32 {
    3
}

// Valor padrão para o atraso base: 1000ms.
fn default_base_delay_ms() -> u64 {
    1000
}

fn default_workers() -> usize {
    20
}

fn default_max_workers_limit() -> usize {
    200
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_proxies_file() -> PathBuf {
    PathBuf::from("proxies.txt")
}

fn default_poll_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            telegram_api_base: default_telegram_api_base(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            default_workers: default_workers(),
            max_workers_limit: default_max_workers_limit(),
            data_dir: default_data_dir(),
            results_dir: default_results_dir(),
            proxies_file: default_proxies_file(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Carrega a configuração de `path`.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo para o token.
        Ok(config.with_token_override(std::env::var(TOKEN_ENV).ok()))
    }

    /// Substitui o token quando `token` não é vazio.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token
            && !token.is_empty()
        {
            self.telegram_token = token;
        }
        self
    }

    /// Token obrigatório para o modo bot.
    pub fn require_token(&self) -> Result<&str, AppError> {
        if self.telegram_token.is_empty() {
            Err(AppError::MissingBotToken)
        } else {
            Ok(&self.telegram_token)
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries.max(1),
            base_delay_ms: self.base_delay_ms,
        }
    }

    /// Concorrência dentro de `1..=max_workers_limit`.
    pub fn clamp_workers(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_workers_limit.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert!(config.telegram_token.is_empty());
        assert_eq!(config.telegram_api_base, "https://api.telegram.org");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.default_workers, 20);
        assert_eq!(config.max_workers_limit, 200);
        assert_eq!(config.proxies_file, PathBuf::from("proxies.txt"));
        assert_eq!(config.poll_timeout_secs, 30);
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            telegram_token = "123:abc"
            max_retries = 5
            data_dir = "uploads"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.data_dir, PathBuf::from("uploads"));
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.default_workers, 20);
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn load_from_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eventblast.toml");
        std::fs::write(&path, "default_workers = 7\nresults_dir = \"out\"\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_workers, 7);
        assert_eq!(config.results_dir, PathBuf::from("out"));
    }

    #[test]
    fn load_from_rejects_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eventblast.toml");
        std::fs::write(&path, "max_retries = \"many\"").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(AppError::Toml(_))));
    }

    #[test]
    fn token_override_wins_unless_empty() {
        let config = AppConfig {
            telegram_token: "from-file".into(),
            ..AppConfig::default()
        };
        let kept = config.clone().with_token_override(Some(String::new()));
        assert_eq!(kept.telegram_token, "from-file");
        let replaced = config.with_token_override(Some("from-env".into()));
        assert_eq!(replaced.telegram_token, "from-env");
    }

    #[test]
    fn require_token_reports_missing() {
        assert!(matches!(
            AppConfig::default().require_token(),
            Err(AppError::MissingBotToken)
        ));
    }

    #[test]
    fn retry_policy_from_config() {
        let config = AppConfig {
            max_retries: 0,
            base_delay_ms: 250,
            ..AppConfig::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.base_delay_ms, 250);
    }

    #[test]
    fn clamp_workers_to_limit() {
        let config = AppConfig::default();
        assert_eq!(config.clamp_workers(0), 1);
        assert_eq!(config.clamp_workers(50), 50);
        assert_eq!(config.clamp_workers(500), 200);
    }
}
