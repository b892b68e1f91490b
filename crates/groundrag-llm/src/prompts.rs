//! Prompt templates sent to the completion gateway.

/// Returned by the model when the context does not contain the answer.
pub const NO_INFORMATION: &str = "I don't have this information.";

/// Question answering restricted to `chunks`, joined one per line.
pub fn qa_prompt<S: AsRef<str>>(chunks: &[S], question: &str) -> String {
    let context = join(chunks, "\n");
    format!(
        "You are a helpful enterprise assistant. Answer the question based ONLY on the provided context. \
         If the answer is not in the context, say \"{NO_INFORMATION}\"\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}

/// Asks for an ungroundedness score: 0 when every claim in `answer` is
/// supported by `sources`, 1 when none is.
pub fn grounding_judge_prompt<S: AsRef<str>>(answer: &str, sources: &[S]) -> String {
    let sources = join(sources, "\n---\n");
    format!(
        "Given the following response and source documents, estimate how much of the response is NOT supported by the sources.\n\n\
         Response: {answer}\n\n\
         Sources:\n{sources}\n\n\
         Reply with a single number between 0 and 1, where 0 means every claim is supported and 1 means no claim is supported.\n\n\
         Score:"
    )
}

fn join<S: AsRef<str>>(parts: &[S], sep: &str) -> String {
    parts.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qa_prompt_embeds_context_and_question() {
        let prompt = qa_prompt(&["first chunk", "second chunk"], "What is the policy?");
        assert!(prompt.contains("Context:\nfirst chunk\nsecond chunk\n"));
        assert!(prompt.contains("Question: What is the policy?"));
        assert!(prompt.ends_with("Answer:"));
        assert!(prompt.contains(NO_INFORMATION));
    }

    #[test]
    fn judge_prompt_lists_sources() {
        let prompt = grounding_judge_prompt("Remote work is allowed.", &["a", "b"]);
        assert!(prompt.contains("Response: Remote work is allowed."));
        assert!(prompt.contains("a\n---\nb"));
    }
}
