use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::models::Lang;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, from: Lang, to: Lang) -> anyhow::Result<String>;
}

/// Talks to a LibreTranslate-compatible endpoint.
pub struct HttpTranslator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTranslator {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, from: Lang, to: Lang) -> anyhow::Result<String> {
        let url = format!("{}/translate", self.base_url.trim_end_matches('/'));
        let resp: TranslateResponse = self
            .client
            .post(url)
            .json(&json!({
                "q": text,
                "source": from.as_str(),
                "target": to.as_str(),
                "format": "text",
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.translated_text)
    }
}
