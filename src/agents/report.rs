// Report synthesizer: asks the model for the ten-section analysis

use tracing::{info, warn};

use super::extractor::has_market_research_heading;
use crate::llm::CompletionClient;
use crate::models::{ReportSection, ResearchBundle, StartupProfile};
use crate::utils::truncate_chars;

/// Pages quoted as supporting material
pub const MAX_SOURCE_PAGES: usize = 2;
/// Characters kept from each quoted page
pub const MAX_SOURCE_CHARS: usize = 1000;

pub struct ReportAgent;

impl ReportAgent {
    /// Returns the last reply obtained; empty when the backend failed both times.
    pub async fn synthesize_report(
        client: &CompletionClient,
        bundle: &ResearchBundle,
        profile: &StartupProfile,
    ) -> String {
        let reply = client.complete(&Self::build_prompt(profile, Some(bundle))).await;
        if has_market_research_heading(&reply) {
            info!(reply_len = reply.len(), "Report synthesized");
            return reply;
        }

        warn!(
            reply_len = reply.len(),
            "Report lacks a Market Research heading, retrying without source material"
        );
        let retry = client.complete(&Self::build_prompt(profile, None)).await;
        info!(
            reply_len = retry.len(),
            structured = has_market_research_heading(&retry),
            "Report retry complete"
        );
        retry
    }

    pub fn build_prompt(profile: &StartupProfile, bundle: Option<&ResearchBundle>) -> String {
        let headings = ReportSection::ALL
            .iter()
            .map(|s| format!("## {}", s.name()))
            .collect::<Vec<_>>()
            .join("\n");

        let mut prompt = format!(
            "Generate a detailed market analysis for the startup idea '{}' in {}, targeting '{}'.\n\
             Budget: {}\n\
             Stage of development: {}\n\
             Team size: {}\n\
             Key technologies: {}\n\
             Funding goal: {}\n\
             Timeline to launch: {}\n\n\
             Structure the answer with exactly these ten markdown headings, in this order, \
             and never omit one. Under each heading write short bullet points starting with '- '. \
             Under Competitor Analysis you may use a markdown table instead.\n\n\
             {headings}\n",
            profile.idea,
            profile.country,
            profile.target_market,
            profile.budget,
            profile.stage,
            profile.team_size,
            profile.technologies,
            profile.funding_goal,
            profile.launch_timeline,
        );

        if let Some(bundle) = bundle.filter(|b| !b.is_empty()) {
            prompt.push_str("\nUse the research material below:\n");
            for record in bundle.iter().take(MAX_SOURCE_PAGES) {
                prompt.push_str(&format!(
                    "\nSource: {}\n{}\n",
                    record.url,
                    truncate_chars(&record.content, MAX_SOURCE_CHARS)
                ));
            }
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::tests::scripted_client;
    use crate::models::tests::profile;
    use crate::models::PageRecord;
    use crate::types::AppError;

    fn bundle() -> ResearchBundle {
        vec![
            PageRecord {
                url: "https://one".to_string(),
                content: "x".repeat(1500),
            },
            PageRecord {
                url: "https://two".to_string(),
                content: "second page".to_string(),
            },
            PageRecord {
                url: "https://three".to_string(),
                content: "third page".to_string(),
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_prompt_lists_headings_in_order() {
        let prompt = ReportAgent::build_prompt(&profile(), None);
        let positions: Vec<usize> = ReportSection::ALL
            .iter()
            .map(|s| prompt.find(&format!("## {}", s.name())).expect("heading present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(prompt.contains("Banana peel packaging"));
        assert!(!prompt.contains("research material"));
    }

    #[test]
    fn test_prompt_quotes_two_truncated_pages() {
        let prompt = ReportAgent::build_prompt(&profile(), Some(&bundle()));
        assert!(prompt.contains("https://one"));
        assert!(prompt.contains(&"x".repeat(MAX_SOURCE_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_SOURCE_CHARS + 1)));
        assert!(prompt.contains("second page"));
        assert!(!prompt.contains("third page"));
    }

    #[tokio::test]
    async fn test_structured_reply_is_used_directly() {
        let reply = "## Market Research\n- growing".to_string();
        let (client, prompts) = scripted_client(vec![Ok(reply.clone())]);

        let result = ReportAgent::synthesize_report(&client, &bundle(), &profile()).await;

        assert_eq!(result, reply);
        assert_eq!(prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unstructured_reply_retries_without_material() {
        let (client, prompts) = scripted_client(vec![
            Ok("Some rambling text".to_string()),
            Ok("Market Research: still unsure".to_string()),
        ]);

        let result = ReportAgent::synthesize_report(&client, &bundle(), &profile()).await;

        assert_eq!(result, "Market Research: still unsure");
        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("second page"));
        assert!(!prompts[1].contains("second page"));
        assert!(prompts[1].contains("## Market Research"));
    }

    #[tokio::test]
    async fn test_second_reply_used_even_if_unstructured() {
        let (client, prompts) = scripted_client(vec![
            Err(AppError::LLMApi("timeout".to_string())),
            Ok("still no headings".to_string()),
        ]);

        let result = ReportAgent::synthesize_report(&client, &bundle(), &profile()).await;

        assert_eq!(result, "still no headings");
        assert_eq!(prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_total_backend_failure_is_empty() {
        let (client, _) = scripted_client(vec![
            Err(AppError::LLMApi("down".to_string())),
            Err(AppError::LLMApi("down".to_string())),
        ]);
        assert_eq!(ReportAgent::synthesize_report(&client, &bundle(), &profile()).await, "");
    }
}
