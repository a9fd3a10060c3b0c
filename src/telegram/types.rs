//! Tipos de dados da Telegram Bot API usados pelo bot.
//!
//! Apenas os campos que o plano de controle lê são modelados; o restante do
//! JSON é ignorado pelo `serde`.

use serde::{Deserialize, Serialize};

/// Envelope comum a todas as respostas da Bot API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Detalhes extras de um erro; `retry_after` acompanha respostas 429.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
}

/// Um evento recebido via `getUpdates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub document: Option<Document>,
}

/// Arquivo anexado a uma mensagem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: String,
}

/// Resultado de `getFile`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileInfo {
    pub file_id: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Corpo de `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_text_message() {
        let json = r#"{
            "ok": true,
            "result": [{
                "update_id": 10,
                "message": {
                    "message_id": 1,
                    "from": {"id": 7, "is_bot": false, "first_name": "Ada", "username": "ada"},
                    "chat": {"id": 7, "type": "private"},
                    "date": 1700000000,
                    "text": "/start"
                }
            }]
        }"#;
        let resp: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(resp.ok);
        let updates = resp.result.unwrap();
        let msg = updates[0].message.as_ref().unwrap();
        assert_eq!(msg.chat.id, 7);
        assert_eq!(msg.chat.chat_type, "private");
        assert_eq!(msg.text.as_deref(), Some("/start"));
        assert_eq!(msg.from.as_ref().unwrap().username.as_deref(), Some("ada"));
    }

    #[test]
    fn update_with_document() {
        let json = r#"{
            "update_id": 11,
            "message": {
                "message_id": 2,
                "chat": {"id": 7, "type": "private"},
                "document": {"file_id": "abc", "file_name": "emails.txt", "file_size": 42}
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let doc = update.message.unwrap().document.unwrap();
        assert_eq!(doc.file_id, "abc");
        assert_eq!(doc.file_name.as_deref(), Some("emails.txt"));
    }

    #[test]
    fn error_response_without_result() {
        let json = r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let resp: ApiResponse<bool> = serde_json::from_str(json).unwrap();
        assert!(!resp.ok);
        assert!(resp.result.is_none());
        assert_eq!(resp.description.as_deref(), Some("Bad Request: chat not found"));
        assert!(resp.parameters.is_none());
    }

    #[test]
    fn flood_wait_parameters() {
        let json = r#"{"ok": false, "error_code": 429, "description": "Too Many Requests: retry after 35", "parameters": {"retry_after": 35}}"#;
        let resp: ApiResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.parameters.and_then(|p| p.retry_after), Some(35));
    }

    #[test]
    fn send_message_request_shape() {
        let req = SendMessageRequest {
            chat_id: 5,
            text: "<b>hi</b>",
            parse_mode: "HTML",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["chat_id"], 5);
        assert_eq!(json["parse_mode"], "HTML");
    }
}
