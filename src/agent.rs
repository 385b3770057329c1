use chrono::{ Duration as ChronoDuration, Utc };
use log::{ error, info, warn };
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::Args;
use crate::config::credentials::CredentialPool;
use crate::config::prompt::IMAGE_ONLY_CONTENT;
use crate::gateway::{ CompletionGateway, GatewayConfig, Progress, Responder, RetryPolicy };
use crate::history::{ create_kv_store, ConversationStore, ExpiryPolicy, StoreError };
use crate::llm::chat::new_provider;
use crate::llm::ProviderConfig;
use crate::models::chat::{ ChatMessage, ImageAttachment };

/// One local chat session: the conversation plus the gateway that answers it.
/// Methods take `&mut self`, so turns run one at a time.
pub struct ChatAgent {
    store: ConversationStore,
    responder: Arc<dyn Responder>,
}

impl ChatAgent {
    pub fn with_parts(store: ConversationStore, responder: Arc<dyn Responder>) -> Self {
        Self { store, responder }
    }

    pub fn gateway_config(args: &Args) -> GatewayConfig {
        let credentials = CredentialPool::parse(&args.api_keys);
        let mut config = GatewayConfig::new(credentials);
        config.temperature = args.temperature;
        config.retry = RetryPolicy {
            max_attempts: args.max_attempts,
            delay: Duration::from_millis(args.retry_delay_ms),
        };
        config
    }

    pub fn expiry_policy(args: &Args) -> Result<ExpiryPolicy, Box<dyn Error + Send + Sync>> {
        let threshold = ChronoDuration::try_hours(args.history_expiry_hours)
            .filter(|t| *t > ChronoDuration::zero())
            .ok_or_else(|| format!("history expiry out of range: {}h", args.history_expiry_hours))?;
        Ok(ExpiryPolicy { threshold })
    }

    pub async fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let provider_config = ProviderConfig {
            base_url: args.chat_base_url.clone(),
            timeout_secs: args.chat_timeout_secs,
        };
        let provider = new_provider(&provider_config)?;
        let gateway_config = Self::gateway_config(args);
        if gateway_config.credentials.is_empty() {
            warn!("No API keys configured (API_KEY); every question will get the busy reply");
        }
        info!(
            "Gateway configured: models={:?} credentials={} max_attempts={:?} delay={:?}",
            gateway_config.models,
            gateway_config.credentials.len(),
            gateway_config.retry.max_attempts,
            gateway_config.retry.delay
        );
        let gateway = CompletionGateway::new(provider, gateway_config);

        let kv = create_kv_store(args)?;
        let policy = Self::expiry_policy(args)?;
        let store = ConversationStore::open(kv, policy, Utc::now()).await;
        info!("Restored {} messages", store.len());

        Ok(Self::with_parts(store, Arc::new(gateway)))
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.messages()
    }

    /// Sends one user turn. Returns the reply, or `None` when there was
    /// nothing to send or no reply could be produced.
    pub async fn send(
        &mut self,
        input: &str,
        image: Option<ImageAttachment>,
        progress: &Progress<'_>
    ) -> Result<Option<String>, StoreError> {
        if input.trim().is_empty() && image.is_none() {
            return Ok(None);
        }

        let history = self.store.messages().to_vec();
        let content = if input.trim().is_empty() { IMAGE_ONLY_CONTENT } else { input };
        let id = self.store.next_id();
        self.store.append(ChatMessage::user(id, content, image.clone())).await?;

        match self.responder.respond(input, &history, image.as_ref(), progress).await {
            Ok(reply) => {
                let reply_id = self.store.next_id();
                self.store.append(ChatMessage::bot(reply_id, reply.clone())).await?;
                Ok(Some(reply))
            }
            Err(e) => {
                error!("No reply for turn: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn edit(&mut self, id: &str, new_text: &str, progress: &Progress<'_>) -> bool {
        self.store.edit_and_regenerate(id, new_text, self.responder.as_ref(), progress).await
    }

    pub async fn delete(&mut self, id: &str) -> bool {
        self.store.delete(id).await
    }

    pub async fn new_chat(&mut self) {
        self.store.clear().await;
    }
}
