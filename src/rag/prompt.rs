//! Answer prompt assembly.

use crate::config::Prompts;
use crate::vector_store::SearchHit;
use std::collections::HashMap;

/// Join retrieved chunk texts into the context block.
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders the single-message prompt sent to the generation model.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    prompts: Prompts,
}

impl PromptBuilder {
    pub fn new(prompts: Prompts) -> Self {
        Self { prompts }
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Fill the template with system instructions, history, context and the question.
    pub fn build(&self, chat_history: &str, context: &str, question: &str) -> String {
        // System text may itself use custom variables.
        let system = self
            .prompts
            .render_with_custom(&self.prompts.rag.system, &HashMap::new());

        let vars = HashMap::from([
            ("system".to_string(), system),
            ("chat_history".to_string(), chat_history.to_string()),
            ("context".to_string(), context.to_string()),
            ("question".to_string(), question.to_string()),
        ]);

        self.prompts.render_with_custom(&self.prompts.rag.template, &vars)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Prompts::default())
    }
}
