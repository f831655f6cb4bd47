use std::sync::Arc;
use std::time::Duration;

use ai::{
    chat_completions::{ChatCompletion, ChatCompletionMessage, ChatCompletionRequestBuilder},
    clients::openai::Client,
};

use crate::{conf::settings, pkg::internal::pipeline::error::StageError};

#[async_trait::async_trait]
pub trait ScoreOps {
    async fn score_cv(
        &self,
        system: &str,
        prompt: &str,
    ) -> core::result::Result<String, StageError>;
}

#[async_trait::async_trait]
impl ScoreOps for Arc<Client> {
    async fn score_cv(
        &self,
        system: &str,
        prompt: &str,
    ) -> core::result::Result<String, StageError> {
        let mut builder = ChatCompletionRequestBuilder::default();
        builder
            .model(&settings.ai_model)
            .messages(vec![
                ChatCompletionMessage::System(system.into()),
                ChatCompletionMessage::User(prompt.into()),
            ])
            .max_completion_tokens(settings.ai_max_tokens);
        // some model profiles run without an explicit temperature
        if let Some(temperature) = settings.ai_temperature {
            builder.temperature(temperature);
        }
        let request = builder
            .build()
            .map_err(|e| StageError::ModelCall(e.to_string()))?;
        let response = tokio::time::timeout(
            Duration::from_secs(settings.ai_timeout_secs),
            self.chat_completions(&request),
        )
        .await
        .map_err(|_| {
            StageError::ModelCall(format!(
                "model call timed out after {}s",
                settings.ai_timeout_secs
            ))
        })?
        .map_err(|e| StageError::ModelCall(e.to_string()))?;
        let answer = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .cloned()
            .ok_or_else(|| StageError::ModelCall("model returned no completion".into()))?;
        Ok(answer)
    }
}
