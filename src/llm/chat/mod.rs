pub mod gemini;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;

use super::{ GenerationRequest, ProviderConfig, ProviderError };
use self::gemini::GeminiProvider;

/// One call to the hosted model: a system instruction, ordered turns and a
/// temperature in, reply text out.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        credential: &str,
        request: &GenerationRequest
    ) -> Result<String, ProviderError>;
}

pub fn new_provider(
    config: &ProviderConfig
) -> Result<Arc<dyn GenerationProvider>, Box<dyn StdError + Send + Sync>> {
    let provider = GeminiProvider::from_config(config)?;
    Ok(Arc::new(provider))
}
