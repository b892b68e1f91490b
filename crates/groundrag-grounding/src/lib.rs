//! Grounding scores: how much of an answer is not traceable to its sources.
//!
//! 0 means fully supported, 1 means fully unsupported. [`LexicalGrounding`]
//! is always available; [`JudgedGrounding`] asks a language model and falls
//! back to the lexical score whenever the model cannot give a usable number.
use std::sync::Arc;
use tracing::{debug, warn};

use groundrag_core::tokens::{overlap_ratio, token_set};
use groundrag_core::traits::{is_error_completion, CompletionGateway, CompletionParams};
use groundrag_core::{Error, Result};
use groundrag_llm::prompts::grounding_judge_prompt;

pub trait GroundingScorer: Send + Sync {
    /// Ungroundedness of `answer` against `sources`, always in [0, 1].
    fn score(&self, answer: &str, sources: &[String]) -> f32;
}

/// `1 - |A ∩ S| / |A|` over lowercase whitespace tokens of the answer (`A`)
/// and of all sources joined by a space (`S`). No sources, or an answer
/// without tokens, scores 1.
pub fn lexical_score(answer: &str, sources: &[String]) -> f32 {
    if sources.is_empty() {
        return 1.0;
    }
    let answer_tokens = token_set(answer);
    if answer_tokens.is_empty() {
        return 1.0;
    }
    let source_tokens = token_set(&sources.join(" "));
    (1.0 - overlap_ratio(&answer_tokens, &source_tokens)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalGrounding;

impl GroundingScorer for LexicalGrounding {
    fn score(&self, answer: &str, sources: &[String]) -> f32 {
        lexical_score(answer, sources)
    }
}

pub struct JudgedGrounding {
    gateway: Arc<dyn CompletionGateway>,
    params: CompletionParams,
}

impl JudgedGrounding {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { gateway, params: CompletionParams { temperature: 0.0, max_tokens: 16 } }
    }

    fn judge(&self, answer: &str, sources: &[String]) -> Result<f32> {
        let reply = self.gateway.complete(&grounding_judge_prompt(answer, sources), &self.params)?;
        if is_error_completion(&reply) {
            return Err(Error::ScoringDegraded(reply));
        }
        parse_score(&reply).ok_or_else(|| Error::ScoringDegraded(format!("unparsable judge reply: {reply:?}")))
    }
}

impl GroundingScorer for JudgedGrounding {
    fn score(&self, answer: &str, sources: &[String]) -> f32 {
        if sources.is_empty() || token_set(answer).is_empty() {
            return 1.0;
        }
        match self.judge(answer, sources) {
            Ok(score) => {
                debug!(score, judge = self.gateway.name(), "grounding judged");
                score
            }
            Err(e) => {
                warn!(judge = self.gateway.name(), "grounding judge unusable, using lexical overlap: {e}");
                lexical_score(answer, sources)
            }
        }
    }
}

/// First token of `reply` that parses as a finite number, clamped to [0, 1].
fn parse_score(reply: &str) -> Option<f32> {
    reply
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-')).trim_end_matches('.'))
        .filter_map(|t| t.parse::<f32>().ok())
        .find(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}
