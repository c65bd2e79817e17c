//! Fallback browsing plan
//!
//! Used when no decision oracle is available: search once for the prompt,
//! then keep following links until enough pages have been visited.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::distill::{is_absolute_http, is_non_result, is_search_url, unwrap_redirect, PageRecord};

/// One step of the static fallback plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanStep {
    Search { query: String },
    BrowseResults { count: usize },
    ExtractInformation { topics: Vec<String> },
}

/// The three-step plan: search, browse `pages` results, extract topics
pub fn build_plan(prompt: &str, pages: usize) -> Vec<PlanStep> {
    vec![
        PlanStep::Search {
            query: prompt.to_string(),
        },
        PlanStep::BrowseResults { count: pages },
        PlanStep::ExtractInformation {
            topics: prompt.split_whitespace().map(str::to_string).collect(),
        },
    ]
}

/// A page distilled during the fallback loop
#[derive(Debug, Clone)]
pub struct DistilledPage {
    pub url: String,
    pub record: PageRecord,
}

/// Picks the next URL to follow in fallback mode
pub trait LinkSelector: Send + Sync {
    /// `pages` is in visitation order; `visited` holds every URL requested so far
    fn select(&self, prompt: &str, pages: &[DistilledPage], visited: &[String]) -> Option<String>;
}

/// First unvisited result-like link, newest page first
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstUnvisited;

impl LinkSelector for FirstUnvisited {
    fn select(&self, _prompt: &str, pages: &[DistilledPage], visited: &[String]) -> Option<String> {
        pages.iter().rev().find_map(|page| {
            // on a results page, links back into the engine itself are chrome
            let engine_host = is_search_url(&page.url)
                .then(|| host_of(&page.url))
                .flatten();

            page.record
                .links
                .iter()
                .map(|link| unwrap_redirect(&link.url))
                .filter(|url| is_absolute_http(url) && !is_non_result(url))
                .filter(|url| engine_host.is_none() || host_of(url) != engine_host)
                .find(|url| !visited.iter().any(|seen| same_page(seen, url)))
        })
    }
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

/// URLs equal once any fragment is dropped
fn same_page(a: &str, b: &str) -> bool {
    let strip = |u: &str| u.split('#').next().unwrap_or(u).to_string();
    strip(a) == strip(b)
}
