//! Browsing session engine
//!
//! Runs one deadline-bounded session with either strategy and turns every
//! outcome, failures included, into a [`BrowseResult`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::min;
use std::time::Duration;
use tokio::time::{sleep, timeout_at};

use crate::agent::loop_state::{OracleLoopState, SessionState};
use crate::agent::oracle::{Decision, DecisionOracle, Strategy};
use crate::agent::plan::{build_plan, DistilledPage, LinkSelector, PlanStep};
use crate::core::{BrowseError, CollectedDatum, Config, HttpMethod, PageVisit, Result};
use crate::distill::Distiller;
use crate::navigation::{NavigationClient, Payload};
use crate::tools::web::search_url;
use crate::tools::ToolRegistry;

pub const AGENT_RESULTS_TITLE: &str = "Agent Results";
pub const AGENT_OBSERVATIONS_TITLE: &str = "Agent Observations";

/// Outcome of one `ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseResult {
    pub prompt: String,
    pub pages_visited: Vec<PageVisit>,
    pub data_collected: Vec<CollectedDatum>,
    pub completed: bool,
    pub error: Option<String>,
    pub summary: Option<String>,
    /// Final answer of the oracle, when one drove the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_result: Option<String>,
    /// Plan followed in fallback mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub browsing_plan: Vec<PlanStep>,
}

/// Run one session to completion. Never fails: errors end up in
/// [`BrowseResult::error`] next to whatever was collected before them.
pub async fn run_session(
    strategy: &Strategy,
    client: &mut NavigationClient,
    config: &Config,
    prompt: &str,
    time_limit: Duration,
) -> BrowseResult {
    let mut state = SessionState::new(prompt, time_limit);
    let mut agent_result = None;
    let mut browsing_plan = Vec::new();

    tracing::info!(prompt, strategy = strategy.name(), ?time_limit, "browsing session started");

    let outcome = if prompt.trim().is_empty() {
        Err(BrowseError::Other("prompt must not be empty".to_string()))
    } else {
        match strategy {
            Strategy::Oracle(oracle) => {
                run_oracle(oracle.as_ref(), client, config, &mut state)
                    .await
                    .map(|answer| agent_result = answer)
            }
            Strategy::Fallback(selector) => {
                browsing_plan = build_plan(prompt, config.session.min_pages);
                run_fallback(selector.as_ref(), client, config, &mut state).await
            }
        }
    };

    match outcome {
        Ok(()) => {
            state.completed = true;
            tracing::info!(pages = state.pages_visited(), data = state.collected.len(), "browsing session complete");
        }
        Err(e) => {
            let error = match e {
                BrowseError::Orchestration(_) => e,
                other => BrowseError::orchestration(other.to_string()),
            };
            tracing::warn!(error = %error, pages = state.pages_visited(), "browsing session failed");
            state.error = Some(error.to_string());
        }
    }

    BrowseResult {
        prompt: state.prompt,
        pages_visited: state.history,
        data_collected: state.collected,
        completed: state.completed,
        error: state.error,
        summary: None,
        agent_result,
        browsing_plan,
    }
}

/// Oracle-driven loop. Returns the oracle's final answer, if it gave one.
///
/// Visits are rebuilt from the client's history afterwards, so they are
/// kept even when the oracle fails part way.
async fn run_oracle(
    oracle: &dyn DecisionOracle,
    client: &mut NavigationClient,
    config: &Config,
    state: &mut SessionState,
) -> Result<Option<String>> {
    let history_start = client.history().len();
    let mut registry = ToolRegistry::new(config.distill.clone(), config.session.search_url.clone());
    let mut turns = OracleLoopState::new(config.oracle.max_turns);

    let outcome = drive_oracle(oracle, &mut registry, client, state, &mut turns).await;

    for (i, entry) in client.history()[history_start..].iter().enumerate() {
        let title = registry
            .page_title(&entry.url)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Page {}", i + 1));
        state.history.push(PageVisit {
            url: entry.url.clone(),
            title,
            timestamp: entry.timestamp,
            http_status: entry.status,
        });
    }

    match &turns.final_answer {
        Some(answer) => state
            .collected
            .push(CollectedDatum::from_agent(AGENT_RESULTS_TITLE, answer.clone())),
        None if !turns.observations.is_empty() => state.collected.push(CollectedDatum::from_agent(
            AGENT_OBSERVATIONS_TITLE,
            turns.format_observations(),
        )),
        None => {}
    }

    outcome.map(|()| turns.final_answer)
}

async fn drive_oracle(
    oracle: &dyn DecisionOracle,
    registry: &mut ToolRegistry,
    client: &mut NavigationClient,
    state: &SessionState,
    turns: &mut OracleLoopState,
) -> Result<()> {
    while turns.should_continue() {
        if state.deadline_passed() {
            tracing::info!(turn = turns.turn, "deadline reached before a final answer");
            break;
        }

        let decision = timeout_at(
            state.deadline,
            oracle.decide(&state.prompt, registry.all_definitions(), &turns.observations),
        )
        .await;
        let Ok(decision) = decision else {
            tracing::info!(turn = turns.turn, "deadline reached while the oracle was deciding");
            break;
        };

        match decision? {
            Decision::Final(answer) => {
                tracing::info!(turn = turns.turn + 1, "oracle produced a final answer");
                turns.final_answer = Some(answer);
            }
            Decision::Invoke(call) => {
                let result = registry.execute(client, state.deadline, &call).await;
                tracing::info!(
                    turn = turns.turn + 1,
                    tool = %call.name,
                    success = result.success,
                    "tool executed"
                );
                turns.add_observation(result.into());
            }
        }
        turns.next_turn();
    }

    if turns.final_answer.is_none() && !turns.should_continue() {
        tracing::info!(max_turns = turns.max_turns, "turn limit reached without a final answer");
    }
    Ok(())
}

/// Deterministic fallback loop: search, then follow links until
/// `min_pages` pages were visited, links run out, or time is up.
async fn run_fallback(
    selector: &dyn LinkSelector,
    client: &mut NavigationClient,
    config: &Config,
    state: &mut SessionState,
) -> Result<()> {
    let distiller = Distiller::new();
    let min_pages = config.session.min_pages;
    let mut pages: Vec<DistilledPage> = Vec::new();
    let mut requested: Vec<String> = Vec::new();

    while !state.deadline_passed() && state.pages_visited() < min_pages {
        let url = if state.history.is_empty() {
            search_url(&config.session.search_url, &state.prompt)
        } else {
            match selector.select(&state.prompt, &pages, &requested) {
                Some(url) => url,
                None => {
                    tracing::info!(pages = state.pages_visited(), "no unvisited links left to follow");
                    break;
                }
            }
        };

        requested.push(url.clone());
        let html = client
            .fetch_before(state.deadline, &url, HttpMethod::Get, Payload::None)
            .await?;
        let http_status = client.history().last().map_or(200, |entry| entry.status);

        let record = distiller.extract(&html, Some(&url));
        tracing::info!(url = %url, title = %record.title, "page visited");

        state.record_page(
            PageVisit {
                url: url.clone(),
                title: record.title.clone(),
                timestamp: Utc::now(),
                http_status,
            },
            CollectedDatum::from_page(&url, record.main_content.clone(), record.metadata.clone()),
        );
        pages.push(DistilledPage { url, record });

        if state.pages_visited() < min_pages {
            let pause = min(config.session.step_delay(), state.time_remaining());
            sleep(pause).await;
        }
    }

    Ok(())
}
