pub mod postprocess;

use async_trait::async_trait;
use log::{ error, info, warn };
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::credentials::CredentialPool;
use crate::config::prompt::{ self, ReplyRules, IMAGE_ONLY_PROMPT, MODEL_CHAIN };
use crate::llm::chat::GenerationProvider;
use crate::llm::GenerationRequest;
use crate::models::chat::{ ChatMessage, ImageAttachment };
use self::postprocess::{ ensure_attribution, or_not_found };

pub type Progress<'a> = dyn Fn(&str) + Send + Sync + 'a;

/// Failure of a `Responder` other than `CompletionGateway`, which never fails.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no reply available: {0}")]
    Unavailable(String),
}

/// Resolves one user turn into a reply. The conversation store talks to the
/// gateway through this seam.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        image: Option<&ImageAttachment>,
        progress: &Progress<'_>
    ) -> Result<String, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Ceiling on provider calls per turn. `None` walks the whole
    /// model × credential grid.
    pub max_attempts: Option<usize>,
    pub delay: Duration,
}

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1500);

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// `(model_index, credential_index)` pairs in the order they are tried:
/// every credential for the first model, then every credential for the
/// next one, cut at `max_attempts`.
pub fn attempt_plan(
    models: usize,
    credentials: usize,
    max_attempts: Option<usize>
) -> Vec<(usize, usize)> {
    let full = (0..models).flat_map(|m| (0..credentials).map(move |c| (m, c)));
    match max_attempts {
        Some(limit) => full.take(limit).collect(),
        None => full.collect(),
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub models: Vec<String>,
    pub credentials: CredentialPool,
    pub temperature: f32,
    pub retry: RetryPolicy,
    pub rules: ReplyRules,
}

impl GatewayConfig {
    pub fn new(credentials: CredentialPool) -> Self {
        Self {
            models: MODEL_CHAIN.iter().map(|m| m.to_string()).collect(),
            credentials,
            temperature: 0.0,
            retry: RetryPolicy::default(),
            rules: ReplyRules::default(),
        }
    }
}

pub struct CompletionGateway {
    provider: Arc<dyn GenerationProvider>,
    config: GatewayConfig,
    system_instruction: String,
}

impl CompletionGateway {
    pub fn new(provider: Arc<dyn GenerationProvider>, config: GatewayConfig) -> Self {
        let system_instruction = prompt::system_instruction(&config.rules);
        Self {
            provider,
            config,
            system_instruction,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Always yields a displayable reply: a post-processed model answer, or
    /// the busy text once every attempt has failed.
    pub async fn send_message(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        image: Option<&ImageAttachment>,
        progress: &Progress<'_>
    ) -> String {
        let prompt = if prompt.trim().is_empty() && image.is_some() { IMAGE_ONLY_PROMPT } else { prompt };
        let request = GenerationRequest::build(
            &self.system_instruction,
            history,
            prompt,
            image,
            self.config.temperature
        );

        let models = &self.config.models;
        let keys = self.config.credentials.keys();
        let plan = attempt_plan(models.len(), keys.len(), self.config.retry.max_attempts);
        let rules = &self.config.rules;

        for (attempt, &(m, c)) in plan.iter().enumerate() {
            let model = &models[m];
            info!(
                "Attempt {}/{}: model={} credential=#{}",
                attempt + 1,
                plan.len(),
                model,
                c + 1
            );
            match self.provider.generate(model, &keys[c], &request).await {
                Ok(text) => {
                    let text = or_not_found(text, &rules.not_found);
                    return ensure_attribution(
                        &text,
                        &rules.attribution_marker,
                        &rules.attribution_line
                    );
                }
                Err(e) => {
                    warn!("Generation failed on model={} credential=#{}: {}", model, c + 1, e);
                    if attempt + 1 < plan.len() {
                        progress(rules.retry_status.as_str());
                        tokio::time::sleep(self.config.retry.delay).await;
                    }
                }
            }
        }

        error!(
            "All {} generation attempts failed ({} models, {} credentials)",
            plan.len(),
            models.len(),
            keys.len()
        );
        rules.busy.clone()
    }
}

#[async_trait]
impl Responder for CompletionGateway {
    async fn respond(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        image: Option<&ImageAttachment>,
        progress: &Progress<'_>
    ) -> Result<String, GatewayError> {
        Ok(self.send_message(prompt, history, image, progress).await)
    }
}
