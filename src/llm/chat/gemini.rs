use async_trait::async_trait;
use log::debug;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::time::Duration;

use super::GenerationProvider;
use crate::llm::{ GenerationRequest, ProviderConfig, ProviderError, TurnRole };

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiInstruction,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: TurnRole,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: Option<String>,
}

fn to_payload(request: &GenerationRequest) -> GeminiRequest {
    let contents = request.turns
        .iter()
        .map(|turn| {
            let mut parts = vec![GeminiPart::Text { text: turn.text.clone() }];
            if let Some(image) = &turn.image {
                parts.push(GeminiPart::Inline {
                    inline_data: GeminiInlineData {
                        mime_type: image.mime_type.clone(),
                        data: image.to_base64(),
                    },
                });
            }
            GeminiContent { role: turn.role, parts }
        })
        .collect();

    GeminiRequest {
        system_instruction: GeminiInstruction {
            parts: vec![GeminiPart::Text { text: request.system_instruction.clone() }],
        },
        contents,
        generation_config: GeminiGenerationConfig {
            temperature: request.temperature,
        },
    }
}

fn extract_text(body: &str) -> Result<String, ProviderError> {
    let parsed: GoogleResponse = serde_json
        ::from_str(body)
        .map_err(|e| ProviderError::Decode(e.to_string()))?;
    let text = parsed.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();
    Ok(text)
}

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), model)
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate(
        &self,
        model: &str,
        credential: &str,
        request: &GenerationRequest
    ) -> Result<String, ProviderError> {
        if credential.is_empty() {
            return Err(ProviderError::EmptyCredential);
        }
        let url = self.endpoint(model);
        debug!("GeminiProvider::generate() → model={} turns={}", model, request.turns.len());

        let resp = self.client
            .post(&url)
            .query(&[("key", credential)])
            .json(&to_payload(request))
            .send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        extract_text(&body)
    }
}
