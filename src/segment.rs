use regex::Regex;
use tracing::{info, warn};

use crate::llm::LlmClient;
use crate::prompts;

/// Remove delimited reasoning blocks some instruct models prepend before the
/// answer. Non-greedy so only the marked span goes, not everything between
/// the first and last marker.
pub fn strip_reasoning(text: &str) -> String {
    match Regex::new(r"(?s)<think>.*?</think>") {
        Ok(re) => re.replace_all(text, "").trim().to_string(),
        Err(_) => text.trim().to_string(),
    }
}

/// Lenient recognizer for the reply "protocol": the first bracketed,
/// comma-separated run of digits anywhere in the text. No match means an
/// empty result, never an error.
pub fn parse_positions(reply: &str) -> Vec<usize> {
    let Ok(re) = Regex::new(r"\[([0-9,\s]*)\]") else {
        return vec![];
    };
    let Some(caps) = re.captures(reply) else {
        return vec![];
    };

    let inner = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let mut positions: Vec<usize> = inner
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse::<usize>().ok())
        .collect();
    positions.sort_unstable();
    positions
}

/// Serialize positions the way the submission expects: `[2, 5]`.
pub fn format_positions(positions: &[usize]) -> String {
    let inner: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
    format!("[{}]", inner.join(", "))
}

/// F1 over position sets, for offline eval against labeled data.
pub fn f1_score(predicted: &[usize], actual: &[usize]) -> f64 {
    if predicted.is_empty() && actual.is_empty() {
        return 1.0;
    }
    if predicted.is_empty() || actual.is_empty() {
        return 0.0;
    }

    let predicted: std::collections::HashSet<_> = predicted.iter().collect();
    let actual: std::collections::HashSet<_> = actual.iter().collect();
    let intersection = predicted.intersection(&actual).count() as f64;

    let precision = intersection / predicted.len() as f64;
    let recall = intersection / actual.len() as f64;
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

/// The segmentation pipeline's single entry point: text in, space insertion
/// positions out. All transport and parse failures degrade to an empty list
/// so one bad record never kills a run.
pub struct SpaceRestorer {
    llm: LlmClient,
}

impl SpaceRestorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    /// Predict insertion positions for one concatenated string. Every
    /// returned position `p` satisfies `0 < p < text.chars().count()`.
    pub async fn restore_spaces(&self, text: &str) -> Vec<usize> {
        if text.is_empty() {
            return vec![];
        }

        let prompt = prompts::segmentation_prompt(text);
        let reply = match self.llm.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(text, error = %e, "LLM request failed, defaulting to no positions");
                return vec![];
            }
        };

        if reply.is_empty() {
            warn!(text, "LLM returned an empty reply");
            return vec![];
        }

        let cleaned = strip_reasoning(&reply);
        let positions = parse_positions(&cleaned);

        // Only strictly interior positions are meaningful insertion points.
        let char_len = text.chars().count();
        let valid: Vec<usize> = positions
            .into_iter()
            .filter(|&p| p > 0 && p < char_len)
            .collect();

        info!(text, reply, positions = ?valid, "record processed");
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Transport;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Canned-reply transport that counts calls.
    struct FakeTransport {
        reply: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    /// Transport that always fails, for the degrade-to-empty path.
    struct BrokenTransport;

    #[async_trait]
    impl Transport for BrokenTransport {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("connection refused")
        }

        async fn health_check(&self) -> Result<()> {
            anyhow::bail!("connection refused")
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn restorer_with_reply(reply: &str) -> (SpaceRestorer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = FakeTransport {
            reply: reply.to_string(),
            calls: calls.clone(),
        };
        (
            SpaceRestorer::new(LlmClient::new(Box::new(transport))),
            calls,
        )
    }

    #[test]
    fn test_parse_simple_list() {
        assert_eq!(parse_positions("[5, 11, 13]"), vec![5, 11, 13]);
    }

    #[test]
    fn test_parse_empty_list() {
        assert_eq!(parse_positions("[]"), Vec::<usize>::new());
    }

    #[test]
    fn test_parse_no_list() {
        assert_eq!(parse_positions("no list here"), Vec::<usize>::new());
    }

    #[test]
    fn test_parse_sorts_ascending() {
        assert_eq!(parse_positions("[13, 5, 11]"), vec![5, 11, 13]);
    }

    #[test]
    fn test_parse_skips_bad_tokens_and_blanks() {
        assert_eq!(parse_positions("[5, , 11,  ,13]"), vec![5, 11, 13]);
    }

    #[test]
    fn test_parse_takes_first_bracketed_run() {
        assert_eq!(parse_positions("answer: [3, 7] or maybe [9]"), vec![3, 7]);
    }

    #[test]
    fn test_strip_reasoning_block() {
        let reply = "<think>hmm, the word boundary is after купил...</think>[3, 7]";
        assert_eq!(strip_reasoning(reply), "[3, 7]");
        assert_eq!(parse_positions(&strip_reasoning(reply)), vec![3, 7]);
    }

    #[test]
    fn test_strip_reasoning_is_non_greedy() {
        let reply = "<think>a</think>[1]<think>b</think>";
        assert_eq!(strip_reasoning(reply), "[1]");
    }

    #[test]
    fn test_format_positions() {
        assert_eq!(format_positions(&[2, 5]), "[2, 5]");
        assert_eq!(format_positions(&[]), "[]");
        // round-trips through the lenient parser
        assert_eq!(parse_positions(&format_positions(&[5, 11, 13])), vec![5, 11, 13]);
    }

    #[test]
    fn test_f1_score() {
        assert_eq!(f1_score(&[], &[]), 1.0);
        assert_eq!(f1_score(&[1], &[]), 0.0);
        assert_eq!(f1_score(&[], &[1]), 0.0);
        assert_eq!(f1_score(&[5, 11, 13], &[5, 11, 13]), 1.0);
        // one of two predictions correct, one of two actuals hit
        assert!((f1_score(&[5, 9], &[5, 11]) - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_input_short_circuits_without_network() {
        let (restorer, calls) = restorer_with_reply("[1, 2]");
        let positions = restorer.restore_spaces("").await;
        assert!(positions.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_positions_are_strictly_interior() {
        // куплюдиван has 10 chars; 0 and 10+ must be dropped
        let (restorer, _) = restorer_with_reply("[0, 5, 10, 99]");
        let positions = restorer.restore_spaces("куплюдиван").await;
        assert_eq!(positions, vec![5]);
    }

    #[tokio::test]
    async fn test_char_len_not_byte_len_bounds() {
        // Cyrillic chars are 2 bytes each; position 9 is interior in chars
        let (restorer, _) = restorer_with_reply("[9]");
        let positions = restorer.restore_spaces("куплюдиван").await;
        assert_eq!(positions, vec![9]);
    }

    #[tokio::test]
    async fn test_reasoning_block_ignored_end_to_end() {
        let (restorer, _) = restorer_with_reply("<think>reasoning...</think>[3, 7]");
        let positions = restorer.restore_spaces("ищудомвПодмосковье").await;
        assert_eq!(positions, vec![3, 7]);
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_to_empty() {
        let restorer = SpaceRestorer::new(LlmClient::new(Box::new(BrokenTransport)));
        let positions = restorer.restore_spaces("куплюдиван").await;
        assert!(positions.is_empty());
    }
}
