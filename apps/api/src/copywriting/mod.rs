//! Marketing copy generation.
//!
//! `AppState` holds an `Arc<dyn CopyWriter>`; production wires in the
//! `LlmClient`, tests wire in a canned writer.

pub mod handlers;
pub mod prompts;

use async_trait::async_trait;

use crate::llm_client::{LlmClient, LlmError};

#[async_trait]
pub trait CopyWriter: Send + Sync {
    async fn generate_copy(
        &self,
        system_prompt: &str,
        user_requirement: &str,
    ) -> Result<String, LlmError>;
}

#[async_trait]
impl CopyWriter for LlmClient {
    async fn generate_copy(
        &self,
        system_prompt: &str,
        user_requirement: &str,
    ) -> Result<String, LlmError> {
        let prompt = prompts::build_copy_prompt(user_requirement);
        self.call_text(system_prompt, &prompt).await
    }
}
