pub mod openai;


use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::Result;

pub use openai::{ChatClient, GenerationConfig};

/// Reply the model is told to give when the context does not hold the answer
pub const NOT_IN_CONTEXT_REPLY: &str =
    "I don't have enough information in the uploaded documents to answer that question.";

/// A text-generating language model
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete `prompt`, returning the model's text as-is
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Build the grounded prompt sent for a question and its retrieved context
#[inline]
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an intelligent document assistant. Answer the user's question based ONLY on the provided context from the documents. \n\
         \n\
         If the answer cannot be found in the context, politely say \"{}\"\n\
         \n\
         Be concise, accurate, and cite which document you're referencing when possible.\n\
         \n\
         Context from documents:\n\
         {}\n\
         \n\
         User Question: {}\n\
         \n\
         Answer:",
        NOT_IN_CONTEXT_REPLY, context, question
    )
}

/// Turns a question plus retrieved context into a model answer
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
}

impl AnswerComposer {
    #[inline]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    #[inline]
    pub async fn answer(&self, question: &str, context: &str) -> Result<String> {
        let prompt = build_prompt(question, context);

        debug!(
            "Asking {} ({} prompt chars)",
            self.generator.model_name(),
            prompt.chars().count()
        );

        self.generator.generate(&prompt).await
    }

    #[inline]
    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }
}
