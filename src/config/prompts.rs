//! Prompt templates for ragchat.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompt used for answer generation.
///
/// `template` receives `{{system}}`, `{{chat_history}}`, `{{context}}` and `{{question}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub template: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant in a multi-turn conversation. Use the chat history \
                     and the relevant documents below to answer the user's new question. If the \
                     documents do not contain the answer, say so."
                .to_string(),

            template: r#"{{system}}

Chat History:
{{chat_history}}

Relevant Documents:
{{context}}

New Question:
{{question}}

Answer:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let rag_path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// The template is scanned once, left to right. Substituted values are copied
    /// through verbatim, so `{{...}}` text inside them is never expanded. Unknown
    /// placeholders are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };

            let name = &after[..end];
            match vars.get(name) {
                Some(value) => result.push_str(value),
                None => {
                    result.push_str("{{");
                    result.push_str(name);
                    result.push_str("}}");
                }
            }
            rest = &after[end + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
