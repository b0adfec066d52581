use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::Result;
use super::{HttpReply, TranslationBackend};

/// Body returned by the MyMemory `get` endpoint (only the fields we read)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    pub response_data: Option<MyMemoryResponseData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyMemoryResponseData {
    #[serde(rename = "translatedText")]
    pub translated_text: Option<String>,
}

impl MyMemoryResponse {
    /// Parse a reply body and pull out `responseData.translatedText`, if present
    pub fn translated_text(body: &str) -> Result<Option<String>> {
        let response: MyMemoryResponse = serde_json::from_str(body)?;
        Ok(response.response_data.and_then(|data| data.translated_text))
    }
}

/// MyMemory HTTP backend
pub struct MyMemoryBackend {
    client: Client,
    endpoint: String,
}

impl MyMemoryBackend {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("modpack-translate/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl TranslationBackend for MyMemoryBackend {
    async fn fetch(&self, phrase: &str, langpair: &str) -> Result<HttpReply> {
        debug!("Sending translation request to: {}", self.endpoint);

        let response = self.client
            .get(&self.endpoint)
            .query(&[("q", phrase), ("langpair", langpair)])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("MyMemory replied {}: {}", status, body);
        Ok(HttpReply { status, body })
    }
}
