//! Answer generation from retrieved context.

use super::{context::format_context_for_prompt, ContextChunk};
use crate::config::Prompts;
use crate::error::{RagError, Result};
use crate::llm::LanguageModel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Renders the answer prompt and asks the language model.
pub struct AnswerGenerator {
    llm: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Render the prompt for a query and its context.
    pub fn render_prompt(&self, context: &[ContextChunk], question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(context));
        vars.insert("question".to_string(), question.to_string());
        self.prompts.render_with_custom(&self.prompts.rag.template, &vars)
    }

    /// Answer `question` from `context`. An empty context is valid input.
    #[instrument(skip(self, context), fields(chunks = context.len()))]
    pub async fn generate(&self, context: &[ContextChunk], question: &str) -> Result<String> {
        let prompt = self.render_prompt(context, question);

        let answer = self.llm.complete(&prompt).await.map_err(|e| match e {
            e @ RagError::GenerationFailed(_) => e,
            other => RagError::GenerationFailed(other.to_string()),
        })?;

        info!("RAG answer generated");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingModel {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(RagError::GenerationFailed("503 Service Unavailable".into()));
            }
            Ok("It is about ownership.".to_string())
        }
    }

    fn chunk(order: usize, content: &str) -> ContextChunk {
        ContextChunk {
            order,
            content: content.to_string(),
            score: 1.0,
        }
    }

    #[tokio::test]
    async fn test_generate_renders_context_and_question() {
        let model = RecordingModel::new(false);
        let generator = AnswerGenerator::new(model.clone());

        let answer = generator
            .generate(&[chunk(2, "borrowing rules"), chunk(0, "ownership intro")], "What is it about?")
            .await
            .unwrap();
        assert_eq!(answer, "It is about ownership.");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Context: borrowing rules\n\nownership intro"));
        assert!(prompts[0].contains("Question: What is it about?"));
        assert!(prompts[0].contains("I DONT KNOW"));
    }

    #[tokio::test]
    async fn test_generate_with_empty_context() {
        let model = RecordingModel::new(false);
        let generator = AnswerGenerator::new(model.clone());

        assert!(generator.generate(&[], "Anything?").await.is_ok());
        assert!(model.prompts.lock().unwrap()[0].contains("Context: \n"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_generation_failure() {
        let generator = AnswerGenerator::new(RecordingModel::new(true));
        let err = generator.generate(&[chunk(0, "x")], "q").await.unwrap_err();

        assert!(matches!(err, RagError::GenerationFailed(_)));
        assert_eq!(
            err.to_output(),
            "Error: Failed to get response from RAG chain, 503 Service Unavailable"
        );
    }

    #[test]
    fn test_question_with_placeholder_text_is_kept_literal() {
        let generator = AnswerGenerator::new(RecordingModel::new(false));
        let context = [chunk(0, "the transcript")];

        let first = generator.render_prompt(&context, "what does {{context}} mean");
        assert!(first.contains("Question: what does {{context}} mean"));
        assert_eq!(first.matches("the transcript").count(), 1);

        for _ in 0..50 {
            assert_eq!(generator.render_prompt(&context, "what does {{context}} mean"), first);
        }
    }

    #[tokio::test]
    async fn test_custom_variables_reach_template() {
        let mut prompts = Prompts::default();
        prompts.rag.template = "[{{channel}}] {{question}} / {{context}}".to_string();
        prompts.variables.insert("channel".to_string(), "rustconf".to_string());

        let model = RecordingModel::new(false);
        let generator = AnswerGenerator::new(model.clone()).with_prompts(prompts);
        generator.generate(&[chunk(0, "ctx")], "q?").await.unwrap();

        assert_eq!(model.prompts.lock().unwrap()[0], "[rustconf] q? / ctx");
    }
}
