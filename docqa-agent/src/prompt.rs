//! Prompt templates and context assembly.

use docqa_rag::RetrievalResult;

/// Answer returned when retrieval finds nothing. No model call is made.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information to answer your question.";

/// Message attached to successful chat responses.
pub const SUCCESS_MESSAGE: &str = "Assistant responded successfully";

/// System instructions for the tool-calling agent.
pub const AGENT_SYSTEM_PROMPT: &str = "You are a multilingual assistant specialized in answering \
questions based on the provided context.

You have access to tools you can use when appropriate.

Instructions:
- Answer based on the information in the provided context when it is available
- If the information is not in the context, say clearly that you do not have that information
- If the user asks to create, save or store a note, use the create_note tool
- Keep a professional and helpful tone
- Be precise and concise in your answers";

/// Answering template, filled by [`render_rag_prompt`].
pub const RAG_TEMPLATE: &str = "You are a multilingual assistant specialized in answering \
questions based only on the provided context.

Relevant context:
{context}

Question: {question}

Instructions:
- Answer only from the information in the provided context
- If the information is not in the context, say clearly that you do not have that information
- Be precise and concise in your answer
- If the context contains several sources, you may combine their information
- Keep a professional and helpful tone
- If the user asks to create a note, you may use the available tool to do it

Answer:";

/// Label each retrieved chunk with its position, in retrieval order.
///
/// Produces `Source 1:\n{content}\n`, `Source 2:\n{content}\n`, ... joined by
/// newlines.
pub fn build_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("Source {}:\n{}\n", i + 1, r.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill [`RAG_TEMPLATE`].
pub fn render_rag_prompt(context: &str, question: &str) -> String {
    // Substitute the question first so a `{context}` typed by the user is
    // left alone.
    RAG_TEMPLATE.replacen("{question}", question, 1).replacen("{context}", context, 1)
}

#[cfg(test)]
mod tests {
    use docqa_rag::ChunkMetadata;

    use super::*;

    fn result(content: &str, i: usize) -> RetrievalResult {
        RetrievalResult {
            content: content.to_string(),
            metadata: ChunkMetadata {
                file_id: "1".into(),
                chunk_index: i,
                chunk_length: content.len(),
                source: None,
            },
            score: 1.0,
        }
    }

    #[test]
    fn sources_are_numbered_in_order() {
        let context = build_context(&[result("first", 3), result("second", 0)]);
        assert_eq!(context, "Source 1:\nfirst\n\nSource 2:\nsecond\n");
    }

    #[test]
    fn prompt_contains_context_and_question() {
        let prompt = render_rag_prompt("Source 1:\nA cat sat.\n", "What did the cat do?");
        assert!(prompt.contains("Relevant context:\nSource 1:\nA cat sat.\n"));
        assert!(prompt.contains("Question: What did the cat do?"));
        assert!(!prompt.contains("{context}"));
        assert!(prompt.ends_with("Answer:"));
    }
}
