//! Completion-model integrations for the shopqa service.
//!
//! The [`CompletionModel`] trait is the seam between the answering
//! pipeline and a hosted LLM; [`DeepSeekClient`] is the production
//! implementation. Tests stub the trait.

use async_trait::async_trait;

pub mod deepseek;
pub mod error;

pub use deepseek::{DeepSeekClient, DEEPSEEK_API_BASE};
pub use error::{ModelError, Result};

/// A hosted chat-completion model.
///
/// `complete` receives the fixed system instruction, the retrieved
/// context block, and the raw user input, and returns the model's
/// answer text verbatim.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, system: &str, context: &str, input: &str) -> Result<String>;
}
