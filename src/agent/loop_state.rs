//! Session and oracle loop state
//!
//! `SessionState` is the evidence accumulated by one `ask`; `OracleLoopState`
//! tracks the oracle's turns and the observations it has been shown.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::core::{CollectedDatum, PageVisit, ToolResult};

/// Longest session budget honoured; larger limits are clamped to it
pub const MAX_TIME_LIMIT: Duration = Duration::from_secs(86_400 * 365 * 30);

/// State of one browsing session.
///
/// `history` and `collected` only ever grow, and in fallback mode the
/// n-th datum always comes from the n-th visit.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub prompt: String,
    pub deadline: Instant,
    pub history: Vec<PageVisit>,
    pub collected: Vec<CollectedDatum>,
    pub completed: bool,
    pub error: Option<String>,
}

impl SessionState {
    /// Start a session whose deadline is `time_limit` from now, clamped to
    /// [`MAX_TIME_LIMIT`]
    pub fn new(prompt: impl Into<String>, time_limit: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(time_limit.min(MAX_TIME_LIMIT))
            .unwrap_or(now);
        Self {
            prompt: prompt.into(),
            deadline,
            history: Vec::new(),
            collected: Vec::new(),
            completed: false,
            error: None,
        }
    }

    pub fn deadline_passed(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn time_remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Append a visit and the evidence distilled from it
    pub fn record_page(&mut self, visit: PageVisit, datum: CollectedDatum) {
        self.history.push(visit);
        self.collected.push(datum);
    }

    pub fn pages_visited(&self) -> usize {
        self.history.len()
    }
}

/// State of the oracle decision loop
#[derive(Debug, Clone)]
pub struct OracleLoopState {
    /// Current turn number (0-indexed)
    pub turn: usize,
    /// Maximum allowed turns
    pub max_turns: usize,
    /// Observations collected from tool executions
    pub observations: Vec<Observation>,
    /// Final answer if the oracle has produced one
    pub final_answer: Option<String>,
}

impl OracleLoopState {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turn: 0,
            max_turns,
            observations: Vec::new(),
            final_answer: None,
        }
    }

    /// Check if the loop should continue
    pub fn should_continue(&self) -> bool {
        self.turn < self.max_turns && self.final_answer.is_none()
    }

    /// Format observations for inclusion in the next prompt
    pub fn format_observations(&self) -> String {
        format_observations(&self.observations)
    }

    pub fn add_observation(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    /// Increment the turn counter
    pub fn next_turn(&mut self) {
        self.turn += 1;
    }
}

/// Render observations as numbered sections
pub fn format_observations(observations: &[Observation]) -> String {
    if observations.is_empty() {
        return String::new();
    }

    let mut output = String::from("## Tool Observations:\n");
    for (i, obs) in observations.iter().enumerate() {
        output.push_str(&format!(
            "\n### Observation {} ({})\n{}\n",
            i + 1,
            obs.tool_name,
            obs.output
        ));
    }
    output
}

/// An observation from a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Name of the tool that produced this observation
    pub tool_name: String,
    /// Whether the tool execution was successful
    pub success: bool,
    /// Text output from the tool, `Error: ...` on failure
    pub output: String,
}

impl From<ToolResult> for Observation {
    fn from(result: ToolResult) -> Self {
        Self {
            tool_name: result.tool_name,
            success: result.success,
            output: result.output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PageMetadata;
    use chrono::Utc;

    #[test]
    fn test_loop_state_new() {
        let state = OracleLoopState::new(10);
        assert_eq!(state.turn, 0);
        assert_eq!(state.max_turns, 10);
        assert!(state.observations.is_empty());
        assert!(state.final_answer.is_none());
    }

    #[test]
    fn test_should_continue() {
        let mut state = OracleLoopState::new(2);
        assert!(state.should_continue());

        state.next_turn();
        assert!(state.should_continue());

        state.next_turn();
        assert!(!state.should_continue());

        let mut answered = OracleLoopState::new(5);
        answered.final_answer = Some("done".to_string());
        assert!(!answered.should_continue());
    }

    #[test]
    fn test_format_observations() {
        let mut state = OracleLoopState::new(10);
        assert_eq!(state.format_observations(), "");

        state.add_observation(ToolResult::success("search", "<ul>results</ul>").into());
        state.add_observation(ToolResult::failure("browse", "HTTP 404").into());

        let formatted = state.format_observations();
        assert!(formatted.contains("### Observation 1 (search)"));
        assert!(formatted.contains("### Observation 2 (browse)\nError: HTTP 404"));
    }

    #[test]
    fn test_session_records_in_order() {
        let mut state = SessionState::new("q", Duration::from_secs(60));
        assert!(!state.deadline_passed());
        assert!(state.time_remaining() <= Duration::from_secs(60));

        for i in 0..2 {
            let url = format!("https://example.com/{}", i);
            state.record_page(
                PageVisit {
                    url: url.clone(),
                    title: format!("Page {}", i),
                    timestamp: Utc::now(),
                    http_status: 200,
                },
                CollectedDatum::from_page(&url, "text", PageMetadata::default()),
            );
        }

        assert_eq!(state.pages_visited(), 2);
        assert_eq!(state.history[1].url, state.collected[1].source_url);
    }

    #[test]
    fn test_huge_time_limit_is_clamped() {
        let state = SessionState::new("q", Duration::from_secs(u64::MAX));
        assert!(!state.deadline_passed());
        assert!(state.time_remaining() <= MAX_TIME_LIMIT);
        assert!(state.time_remaining() > MAX_TIME_LIMIT - Duration::from_secs(60));
    }

    #[test]
    fn test_zero_time_limit_is_already_past() {
        let state = SessionState::new("q", Duration::ZERO);
        assert!(state.deadline_passed());
        assert_eq!(state.time_remaining(), Duration::ZERO);
    }
}
