//! Agent module - browsing sessions and their orchestration
//!
//! Contains the session engine, the two decision strategies (oracle and
//! fallback plan), and the summary builder.

pub mod loop_state;
pub mod oracle;
pub mod orchestrator;
pub mod plan;
pub mod session;
pub mod summary;

pub use loop_state::{Observation, OracleLoopState, SessionState};
pub use oracle::{Decision, DecisionOracle, LlmOracle, Strategy};
pub use orchestrator::Agent;
pub use plan::{build_plan, DistilledPage, FirstUnvisited, LinkSelector, PlanStep};
pub use session::{run_session, BrowseResult};
pub use summary::{build_summary, NO_DATA_SUMMARY};
