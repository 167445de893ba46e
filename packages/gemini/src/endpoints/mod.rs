pub(crate) use crate::client::Result;
use crate::error::ClientError;
pub(crate) use reqwest::{Method, Response, Url};
pub(crate) use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod generate_content;
pub mod live;

#[derive(Debug)]
pub enum RequestBody {
    Json(Value),
    Empty,
}

#[allow(async_fn_in_trait)]
pub trait GeminiEndpoint {
    const PATH: &'static str;

    const METHOD: Method;

    type ResponseBody;

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![]
    }

    fn request_body(&self) -> Result<RequestBody> {
        Ok(RequestBody::Empty)
    }

    async fn response_body(self, resp: Response) -> Result<Self::ResponseBody>;

    fn url(&self, base_url: &str) -> Result<Url> {
        let mut url = base_url
            .parse::<Url>()
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;

        let mut path = Self::PATH.to_string();

        for (placeholder, id) in self.path_params() {
            path = path.replace(placeholder, id);
        }

        url.set_path(&path);

        Ok(url)
    }
}

/// Inline binary payload (`inlineData` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    #[serde(default)]
    pub mime_type: String,
    /// Base64 text.
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}
