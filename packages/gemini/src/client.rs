use crate::endpoints::generate_content::{GenerateContent, SpeechConfig};
use crate::endpoints::{GeminiEndpoint, RequestBody};
use crate::error::ClientError;
use crate::live::{LiveConnection, LiveSetup};
use reqwest::{Method, Url, header::CONTENT_TYPE};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tracing::{debug, info};
use voice_synth_domain::{SynthesisMode, VoiceError};

pub type Result<T> = std::result::Result<T, ClientError>;

const API_KEY_HEADER: &str = "x-goog-api-key";
const APPLICATION_JSON: &str = "application/json";

pub const DEFAULT_REST_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-09-2025";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: [&str; 3] = ["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

/// Gemini client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin for REST calls
    pub rest_base_url: String,
    /// Live (bidirectional streaming) endpoint
    pub live_url: String,
    /// Model used for single-voice and conversation requests
    pub tts_model: String,
    /// Model used for live voice cloning sessions
    pub live_model: String,
    /// TCP/TLS connect timeout. Requests themselves are not timed out.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            live_url: DEFAULT_LIVE_URL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            live_model: DEFAULT_LIVE_MODEL.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Defaults with `GEMINI_TTS_MODEL` / `GEMINI_LIVE_MODEL` applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(model) = non_empty_var("GEMINI_TTS_MODEL") {
            config.tts_model = model;
        }
        if let Some(model) = non_empty_var("GEMINI_LIVE_MODEL") {
            config.live_model = model;
        }
        config
    }

    pub fn with_rest_base_url(mut self, url: impl Into<String>) -> Self {
        self.rest_base_url = url.into();
        self
    }

    pub fn with_live_url(mut self, url: impl Into<String>) -> Self {
        self.live_url = url.into();
        self
    }

    pub fn with_tts_model(mut self, model: impl Into<String>) -> Self {
        self.tts_model = model.into();
        self
    }

    pub fn with_live_model(mut self, model: impl Into<String>) -> Self {
        self.live_model = model.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn model_for(&self, mode: SynthesisMode) -> &str {
        match mode {
            SynthesisMode::Single | SynthesisMode::Conversation => &self.tts_model,
            SynthesisMode::Clone => &self.live_model,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), VoiceError> {
        for (name, url) in [("rest_base_url", &self.rest_base_url), ("live_url", &self.live_url)] {
            url.parse::<Url>()
                .map_err(|e| VoiceError::Configuration(format!("{name} {url:?}: {e}")))?;
        }
        if self.tts_model.trim().is_empty() || self.live_model.trim().is_empty() {
            return Err(VoiceError::Configuration("model names must not be empty".into()));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// First non-empty key from [`API_KEY_VARS`].
pub fn api_key_from_env() -> Result<String> {
    API_KEY_VARS
        .iter()
        .find_map(|name| non_empty_var(name))
        .ok_or(ClientError::MissingApiKey)
}

#[derive(Clone)]
pub struct GeminiClient {
    inner: reqwest::Client,
    api_key: String,
    config: ClientConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("config", &self.config)
            .finish()
    }
}

impl GeminiClient {
    pub fn from_env() -> Result<Self> {
        Self::new_with_config(api_key_from_env()?, ClientConfig::from_env())
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::new_with_config(api_key, ClientConfig::default())
    }

    pub fn new_with_config(api_key: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClientError::MissingApiKey);
        }

        // Shared by reqwest and the websocket connector; ignore if already installed.
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let client = reqwest::Client::builder()
            .use_preconfigured_tls(tls_config)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::Tls(e.to_string()))?;

        Ok(Self {
            inner: client,
            api_key,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn hit<T: GeminiEndpoint>(&self, endpoint: T) -> Result<T::ResponseBody> {
        let mut builder = self
            .inner
            .request(T::METHOD, endpoint.url(&self.config.rest_base_url)?)
            .header(API_KEY_HEADER, &self.api_key);

        if matches!(T::METHOD, Method::POST | Method::PATCH) {
            builder = match endpoint.request_body()? {
                RequestBody::Json(json) => {
                    builder.header(CONTENT_TYPE, APPLICATION_JSON).json(&json)
                }
                RequestBody::Empty => builder,
            };
        }

        let resp = builder.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
            return Err(ClientError::HttpError { status, body });
        }

        endpoint.response_body(resp).await
    }

    /// One `generateContent` call; returns the base64 PCM payload.
    pub async fn generate_content(
        &self,
        text: &str,
        speech: SpeechConfig,
    ) -> std::result::Result<String, VoiceError> {
        let endpoint = GenerateContent::speech(self.config.tts_model.clone(), text, speech);
        debug!(model = %endpoint.model, chars = text.len(), "generateContent");

        let resp = self.hit(endpoint).await?;

        match resp.first_inline_audio() {
            Some(data) => {
                debug!(base64_len = data.len(), "audio payload received");
                Ok(data.to_string())
            }
            None => Err(VoiceError::RemoteService(match resp.finish_reason() {
                Some(reason) => format!("No audio data returned from Gemini (finish reason {reason})."),
                None => "No audio data returned from Gemini.".to_string(),
            })),
        }
    }

    fn live_endpoint(&self) -> Result<Url> {
        let mut url = self
            .config
            .live_url
            .parse::<Url>()
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", self.config.live_url)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Open a live session and hand it to a background task.
    pub async fn open_live(&self, setup: LiveSetup) -> Result<LiveConnection> {
        let url = self.live_endpoint()?;
        let (ws, response) = connect_async(url.as_str()).await?;
        info!(status = %response.status(), model = %setup.model, "live session connected");
        Ok(LiveConnection::spawn(ws, setup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_depends_on_mode() {
        let config = ClientConfig::default().with_live_model("live-x");
        assert_eq!(config.model_for(SynthesisMode::Single), DEFAULT_TTS_MODEL);
        assert_eq!(config.model_for(SynthesisMode::Conversation), DEFAULT_TTS_MODEL);
        assert_eq!(config.model_for(SynthesisMode::Clone), "live-x");
    }

    #[test]
    fn default_config_is_valid() {
        assert!(ClientConfig::default().validate().is_ok());
        let broken = ClientConfig::default().with_rest_base_url("not a url");
        assert!(matches!(broken.validate(), Err(VoiceError::Configuration(_))));
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(matches!(
            GeminiClient::new("  "),
            Err(ClientError::MissingApiKey)
        ));
    }

    #[test]
    fn live_url_carries_key() {
        let client = GeminiClient::new("secret").unwrap();
        let url = client.live_endpoint().unwrap();
        assert_eq!(url.scheme(), "wss");
        assert!(url.as_str().ends_with("BidiGenerateContent?key=secret"));
    }

    #[test]
    fn debug_redacts_key() {
        let client = GeminiClient::new("secret").unwrap();
        assert!(!format!("{client:?}").contains("secret"));
    }
}
