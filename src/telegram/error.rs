//! Tipos de erro para o cliente da Telegram Bot API.
//!
//! Define [`TelegramError`] com variantes para rate limiting, erros HTTP,
//! respostas `ok: false` e falhas de rede ou de disco. Usa `thiserror` para
//! derivar `Display` e `Error` a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com a Telegram Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// O servidor retornou HTTP 429.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Qualquer outro status HTTP fora de 2xx.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP 200 com `"ok": false` no corpo.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// `getFile` não devolveu `file_path`.
    #[error("file {0} has no downloadable path")]
    MissingFilePath(String),

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Falha ao gravar um arquivo baixado.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
