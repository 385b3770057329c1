#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{ Arc, Mutex };
use std::time::Duration;

use dcet_chat::config::credentials::CredentialPool;
use dcet_chat::config::prompt::ReplyRules;
use dcet_chat::gateway::{ CompletionGateway, GatewayConfig, RetryPolicy };
use dcet_chat::llm::chat::GenerationProvider;
use dcet_chat::llm::{ GenerationRequest, ProviderError };

pub type Behaviour = Box<dyn Fn(&str, &str, &GenerationRequest) -> Result<String, ProviderError> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Call {
    pub model: String,
    pub credential: String,
    pub request: GenerationRequest,
}

/// Provider double that records every call and answers through `behaviour`.
pub struct StubProvider {
    behaviour: Behaviour,
    calls: Mutex<Vec<Call>>,
}

impl StubProvider {
    pub fn new<F>(behaviour: F) -> Arc<Self>
        where F: Fn(&str, &str, &GenerationRequest) -> Result<String, ProviderError> + Send + Sync + 'static
    {
        Arc::new(Self {
            behaviour: Box::new(behaviour),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempted(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .map(|c| (c.model, c.credential))
            .collect()
    }
}

#[async_trait]
impl GenerationProvider for StubProvider {
    async fn generate(
        &self,
        model: &str,
        credential: &str,
        request: &GenerationRequest
    ) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(Call {
            model: model.to_string(),
            credential: credential.to_string(),
            request: request.clone(),
        });
        (self.behaviour)(model, credential, request)
    }
}

pub fn rate_limited() -> ProviderError {
    ProviderError::Status {
        status: 429,
        body: "RESOURCE_EXHAUSTED".to_string(),
    }
}

pub fn config(models: &[&str], keys: &str) -> GatewayConfig {
    GatewayConfig {
        models: models.iter().map(|m| m.to_string()).collect(),
        credentials: CredentialPool::parse(keys),
        temperature: 0.0,
        retry: RetryPolicy {
            max_attempts: None,
            delay: Duration::ZERO,
        },
        rules: ReplyRules::default(),
    }
}

pub fn gateway(provider: Arc<StubProvider>, config: GatewayConfig) -> CompletionGateway {
    CompletionGateway::new(provider, config)
}

/// Progress sink that remembers every status line.
#[derive(Default)]
pub struct StatusLog {
    lines: Mutex<Vec<String>>,
}

impl StatusLog {
    pub fn push(&self, status: &str) {
        self.lines.lock().unwrap().push(status.to_string());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}
