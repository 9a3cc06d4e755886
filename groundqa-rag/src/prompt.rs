//! Prompt composition.

use serde::{Deserialize, Serialize};

use crate::document::RetrievalResult;

const DEFAULT_INSTRUCTION: &str = "Use the following pieces of context to answer the question at \
the end. If you don't know the answer, just say that you don't know, don't try to make up an \
answer.";

const DEFAULT_NO_CONTEXT: &str = "No relevant context was found.";

/// Template that turns retrieved chunks and a question into a prompt.
///
/// Rendering is a pure function of the template, the ranked chunks and the
/// question:
///
/// ```text
/// {instruction}
///
/// ### Context
/// {chunk 1}{separator}{chunk 2}...
///
/// ### Question
/// {question}
///
/// ### Answer
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Instruction header placed before the context.
    pub instruction: String,
    /// Text placed between consecutive chunks.
    pub separator: String,
    /// Context body used when nothing was retrieved.
    pub no_context: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            instruction: DEFAULT_INSTRUCTION.to_string(),
            separator: "\n---\n".to_string(),
            no_context: DEFAULT_NO_CONTEXT.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Replace the instruction header.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Replace the chunk separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Render the prompt for `question` over `context`, in rank order.
    pub fn render(&self, context: &RetrievalResult, question: &str) -> String {
        let body = if context.is_empty() {
            self.no_context.clone()
        } else {
            let texts: Vec<&str> = context.iter().map(|hit| hit.chunk.text.as_str()).collect();
            texts.join(&self.separator)
        };

        format!(
            "{instruction}\n\n### Context\n{body}\n\n### Question\n{question}\n\n### Answer\n",
            instruction = self.instruction,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::{Chunk, ScoredChunk};

    fn hit(text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: format!("doc_{text}"),
                document_id: "doc".into(),
                index: 0,
                start: 0,
                end: text.chars().count(),
                text: text.into(),
                metadata: HashMap::new(),
            },
            score,
        }
    }

    #[test]
    fn renders_chunks_in_rank_order_with_separator() {
        let context = RetrievalResult::from_ranked(vec![hit("first", 0.9), hit("second", 0.5)]);
        let prompt = PromptTemplate::default().render(&context, "What?");

        let first = prompt.find("first").unwrap();
        let second = prompt.find("second").unwrap();
        assert!(first < second);
        assert!(prompt.contains("first\n---\nsecond"));
        assert!(prompt.ends_with("### Question\nWhat?\n\n### Answer\n"));
    }

    #[test]
    fn empty_context_states_nothing_was_found() {
        let prompt = PromptTemplate::default().render(&RetrievalResult::empty(), "Anything?");
        assert!(prompt.contains("### Context\nNo relevant context was found.\n"));
        assert!(prompt.contains("Anything?"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let context = RetrievalResult::from_ranked(vec![hit("a", 1.0)]);
        let template = PromptTemplate::default().with_separator("\n\n");
        assert_eq!(template.render(&context, "q"), template.render(&context, "q"));
    }
}
