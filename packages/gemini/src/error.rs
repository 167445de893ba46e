use serde_json::Value;
use thiserror::Error;
use voice_synth_domain::VoiceError;

/// Transport-level failures talking to the Gemini API.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("websocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("http error {status}: {body}")]
    HttpError { status: http::StatusCode, body: Value },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("no api key found: set GEMINI_API_KEY, GOOGLE_API_KEY or API_KEY")]
    MissingApiKey,
    #[error("tls setup failed: {0}")]
    Tls(String),
}

#[derive(Error, Debug)]
pub enum WebSocketError {
    #[error("NonNormalCloseCode: {0}")]
    NonNormalCloseCode(String),
    #[error("ClosedWithoutCloseFrame")]
    ClosedWithoutCloseFrame,
    #[error("UnexpectedMessageType")]
    UnexpectedMessageType,
}

impl From<ClientError> for VoiceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::HttpError { status, body } => {
                let detail = body
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| body.to_string());
                VoiceError::RemoteService(format!("HTTP {status}: {detail}"))
            }
            ClientError::SerdeError(e) => {
                VoiceError::RemoteService(format!("unreadable response: {e}"))
            }
            ClientError::MissingApiKey | ClientError::InvalidUrl(_) | ClientError::Tls(_) => {
                VoiceError::Configuration(err.to_string())
            }
            ClientError::ReqwestError(_) | ClientError::WebSocketError(_) => {
                VoiceError::Transport(err.to_string())
            }
        }
    }
}

impl From<WebSocketError> for VoiceError {
    fn from(err: WebSocketError) -> Self {
        VoiceError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn http_error_surfaces_service_message() {
        let err = ClientError::HttpError {
            status: http::StatusCode::BAD_REQUEST,
            body: json!({"error": {"code": 400, "message": "API key not valid."}}),
        };
        assert_eq!(
            VoiceError::from(err),
            VoiceError::RemoteService("HTTP 400 Bad Request: API key not valid.".into())
        );
    }

    #[test]
    fn missing_key_is_configuration() {
        assert!(matches!(
            VoiceError::from(ClientError::MissingApiKey),
            VoiceError::Configuration(_)
        ));
    }
}
