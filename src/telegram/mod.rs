pub mod client;
pub mod error;
pub mod types;

use std::future::Future;
use std::path::Path;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use types::Message;

/// Outbound half of a chat channel: formatted notifications and file fetches.
pub trait ChatTransport: Send + Sync {
    fn send_text(&self, chat_id: i64, text: &str) -> impl Future<Output = Result<(), TelegramError>> + Send;

    fn download_document(
        &self,
        file_id: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<u64, TelegramError>> + Send;
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_handles_markup() {
        assert_eq!(escape_html("<b>&\"x\"</b>"), "&lt;b&gt;&amp;&quot;x&quot;&lt;/b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
