// Query synthesizer: one completion call turns a profile into search queries

use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::llm::CompletionClient;
use crate::models::{QuerySet, StartupProfile};

/// Straight or curly double-quote pairs, one line at most; empty pairs still consume both quotes
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"\n]*)"|“([^”\n]*)”"#).expect("valid quoted-query regex"));

const TOPIC_DIRECTIVES: [&str; 6] = [
    "market size and growth rate",
    "main competitors",
    "customer adoption metrics",
    "cost estimates for building and operating the business",
    "common business models",
    "potential partnerships and distribution channels",
];

pub struct QueryAgent;

impl QueryAgent {
    pub async fn synthesize_queries(client: &CompletionClient, profile: &StartupProfile) -> QuerySet {
        let reply = client.complete(&Self::build_prompt(profile)).await;
        if reply.trim().is_empty() {
            warn!("Query synthesis returned no text");
            return QuerySet::default();
        }

        let queries = Self::parse_queries(&reply);
        info!(query_count = queries.len(), "Queries synthesized");
        queries
    }

    pub fn build_prompt(profile: &StartupProfile) -> String {
        let directives = TOPIC_DIRECTIVES
            .iter()
            .map(|d| format!("- {d}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a market research analyst. Write web search queries for researching this startup idea.\n\n\
             Startup idea: {}\n\
             Country: {}\n\
             Target market: {}\n\
             Budget: {}\n\
             Stage: {}\n\
             Team size: {}\n\
             Technologies: {}\n\
             Funding goal: {}\n\
             Launch timeline: {}\n\n\
             Cover each of these topics:\n{directives}\n\n\
             Return one query per line, each wrapped in double quotes.",
            profile.idea,
            profile.country,
            profile.target_market,
            profile.budget,
            profile.stage,
            profile.team_size,
            profile.technologies,
            profile.funding_goal,
            profile.launch_timeline,
        )
    }

    /// Quoted substrings first; every non-blank line when there are none.
    /// Fallback lines are kept verbatim, list numerals included.
    pub fn parse_queries(reply: &str) -> QuerySet {
        let quoted: Vec<&str> = QUOTED
            .captures_iter(reply)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().trim())
            .filter(|q| !q.is_empty())
            .collect();

        if !quoted.is_empty() {
            return QuerySet::from_candidates(quoted);
        }

        QuerySet::from_candidates(reply.lines().map(str::trim).filter(|l| !l.is_empty()))
    }
}
