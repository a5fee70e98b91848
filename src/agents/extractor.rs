//! Section Extractor
//!
//! Coerces a free-form report into the ten fixed sections. Each section body
//! is located by an ordered chain of matchers; the first one yielding a
//! non-blank body wins:
//!
//! 1. markdown heading (`#` to `######`) whose text is the section name
//! 2. legacy label line (`Section Name:`), up to the next `Label:` line
//!
//! A located body becomes a verbatim markdown table (Competitor Analysis
//! only), a bullet list, or a bounded paragraph. Anything else is the
//! placeholder.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::models::{ExtractedBody, ReportSection, StructuredReport, PLACEHOLDER_TEXT};
use crate::types::{AppError, AppResult};
use crate::utils::truncate_chars;

/// Longest unbulleted body kept for a section
pub const MAX_PARAGRAPH_CHARS: usize = 500;

/// Same opening rule as a section heading: the space after the hashes is optional
static NEXT_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]*\S").expect("heading pattern"));

static NEXT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:\*\*)?[A-Z][A-Za-z0-9 ()&/'-]{0,60}(?:\*\*)?:").expect("label pattern")
});

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*-[ \t]+(\S.*)$").expect("bullet pattern"));

static TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\|.*\|[ \t]*\n[ \t]*\|[ \t:|-]*-[ \t:|-]*\n(?:[ \t]*\|.*\|[ \t]*(?:\n|$))+")
        .expect("table pattern")
});

static IMAGE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*!\[[^\]]*\]\([^)]*\)[ \t]*$").expect("image pattern"));

/// Compiled patterns for one section name
struct SectionPatterns {
    section: ReportSection,
    heading: Regex,
    legacy: Regex,
}

impl SectionPatterns {
    fn new(section: ReportSection) -> AppResult<Self> {
        let name = regex::escape(section.name());
        let heading = Regex::new(&format!(
            r"(?im)^[ \t]{{0,3}}#{{1,6}}[ \t]*(?:\d+[.)][ \t]*)?(?:\*\*)?[ \t]*{name}[ \t]*(?:\*\*)?[ \t]*:?[ \t]*$"
        ))
        .map_err(|e| AppError::Internal(format!("heading pattern for {}: {}", section, e)))?;
        let legacy = Regex::new(&format!(r"(?im)^[ \t]*(?:\*\*)?{name}(?:\*\*)?[ \t]*:"))
            .map_err(|e| AppError::Internal(format!("label pattern for {}: {}", section, e)))?;

        Ok(Self {
            section,
            heading,
            legacy,
        })
    }
}

type Matcher = fn(&str, &SectionPatterns) -> Option<String>;

/// Tried in order; see module docs
const MATCHERS: [(&str, Matcher); 2] = [
    ("markdown-heading", match_markdown_heading),
    ("legacy-label", match_legacy_label),
];

/// Body under a markdown heading for the section, up to the next heading
fn match_markdown_heading(text: &str, patterns: &SectionPatterns) -> Option<String> {
    patterns.heading.find_iter(text).find_map(|heading| {
        let rest = &text[heading.end()..];
        let end = NEXT_HEADING.find(rest).map(|m| m.start()).unwrap_or(rest.len());
        non_blank_body(&rest[..end])
    })
}

/// Body after a `Section Name:` label, up to the next label or heading line
fn match_legacy_label(text: &str, patterns: &SectionPatterns) -> Option<String> {
    patterns.legacy.find_iter(text).find_map(|label| {
        let rest = &text[label.end()..];
        // The remainder of the label line always belongs to the body
        let first_line_end = rest.find('\n').unwrap_or(rest.len());
        let tail = &rest[first_line_end..];
        let end = [NEXT_LABEL.find(tail), NEXT_HEADING.find(tail)]
            .into_iter()
            .flatten()
            .map(|m| first_line_end + m.start())
            .min()
            .unwrap_or(rest.len());
        non_blank_body(&rest[..end])
    })
}

fn non_blank_body(raw: &str) -> Option<String> {
    let cleaned = IMAGE_LINE.replace_all(raw, "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Shapes a located, non-blank body
fn shape_body(section: ReportSection, body: &str) -> ExtractedBody {
    if body == PLACEHOLDER_TEXT {
        return ExtractedBody::Placeholder;
    }

    if section == ReportSection::CompetitorAnalysis {
        if let Some(table) = TABLE.find(body) {
            return ExtractedBody::Table(table.as_str().trim().to_string());
        }
    }

    let bullets: Vec<String> = BULLET
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if !bullets.is_empty() {
        return ExtractedBody::Bullets(bullets);
    }

    ExtractedBody::Paragraph(truncate_chars(body, MAX_PARAGRAPH_CHARS).trim_end().to_string())
}

/// Whether a reply carries a recognizable "Market Research" heading in either form
pub fn has_market_research_heading(text: &str) -> bool {
    match SectionPatterns::new(ReportSection::MarketResearch) {
        Ok(patterns) => {
            let text = text.replace("\r\n", "\n");
            patterns.heading.is_match(&text) || patterns.legacy.is_match(&text)
        }
        Err(_) => false,
    }
}

pub struct SectionExtractor {
    patterns: Vec<SectionPatterns>,
    chart_ref: String,
}

impl SectionExtractor {
    /// `chart_ref` is the image reference appended to the assembled document
    pub fn new(chart_ref: impl Into<String>) -> AppResult<Self> {
        let patterns = ReportSection::ALL
            .into_iter()
            .map(SectionPatterns::new)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self {
            patterns,
            chart_ref: chart_ref.into(),
        })
    }

    pub fn extract(&self, report_text: &str) -> StructuredReport {
        let text = report_text.replace("\r\n", "\n");

        let report = StructuredReport::build(self.chart_ref.clone(), |section| {
            let Some(patterns) = self.patterns.iter().find(|p| p.section == section) else {
                return ExtractedBody::Placeholder;
            };
            Self::extract_section(&text, patterns)
        });

        let missing: Vec<&str> = report
            .sections()
            .iter()
            .filter(|s| s.body.is_placeholder())
            .map(|s| s.section.name())
            .collect();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Sections without structured insight");
        }
        report
    }

    fn extract_section(text: &str, patterns: &SectionPatterns) -> ExtractedBody {
        for (strategy, matcher) in MATCHERS {
            if let Some(body) = matcher(text, patterns) {
                debug!(section = %patterns.section, strategy, "Section located");
                return shape_body(patterns.section, &body);
            }
        }
        ExtractedBody::Placeholder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SectionExtractor {
        SectionExtractor::new("reports/summary_chart.svg").unwrap()
    }

    fn full_reply(skip: Option<ReportSection>) -> String {
        let mut reply = String::from("Here is the analysis you asked for.\n\n");
        for section in ReportSection::ALL {
            if Some(section) == skip {
                continue;
            }
            reply.push_str(&format!("## {}\n", section.name()));
            for i in 1..=3 {
                reply.push_str(&format!("- {} point {}\n", section.name(), i));
            }
            reply.push('\n');
        }
        reply
    }

    fn expected_bullets(section: ReportSection) -> ExtractedBody {
        ExtractedBody::Bullets((1..=3).map(|i| format!("{} point {}", section.name(), i)).collect())
    }

    #[test]
    fn test_all_sections_with_bullets() {
        let report = extractor().extract(&full_reply(None));
        for section in ReportSection::ALL {
            assert_eq!(report.body(section), &expected_bullets(section), "{}", section);
        }

        let markdown = report.to_markdown();
        let positions: Vec<usize> = ReportSection::ALL
            .iter()
            .map(|s| markdown.find(&format!("## {}\n", s.name())).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_missing_section_gets_placeholder_only() {
        let report = extractor().extract(&full_reply(Some(ReportSection::RiskAssessment)));
        assert_eq!(report.sections().len(), 10);
        for section in ReportSection::ALL {
            if section == ReportSection::RiskAssessment {
                assert_eq!(report.body(section), &ExtractedBody::Placeholder);
            } else {
                assert_eq!(report.body(section), &expected_bullets(section));
            }
        }
        assert!(report.to_markdown().contains(&format!("## Risk Assessment\n{}", PLACEHOLDER_TEXT)));
    }

    #[test]
    fn test_reextracting_assembled_report_is_stable() {
        let reply = format!(
            "{}\n## Competitor Analysis\n| Competitor | Strength |\n|---|---|\n| Acme | Brand |\n",
            full_reply(Some(ReportSection::CompetitorAnalysis))
        )
        .replace("- Feasibility point 1\n- Feasibility point 2\n- Feasibility point 3\n", "Feasible with a small team.\n")
        .replace("## Business Outline\n", "## Ignored\n");

        let first = extractor().extract(&reply);
        let second = extractor().extract(&first.to_markdown());
        assert_eq!(first, second);
        assert!(matches!(first.body(ReportSection::Feasibility), ExtractedBody::Paragraph(_)));
        assert!(first.body(ReportSection::BusinessOutline).is_placeholder());
    }

    #[test]
    fn test_heading_depth_and_case_are_ignored() {
        let reply = "#### market research\n- big\n# FEASIBILITY\n- doable\n### 3. Budget Requirements:\n- $50k\n";
        let report = extractor().extract(reply);
        assert_eq!(report.body(ReportSection::MarketResearch), &ExtractedBody::Bullets(vec!["big".into()]));
        assert_eq!(report.body(ReportSection::Feasibility), &ExtractedBody::Bullets(vec!["doable".into()]));
        assert_eq!(report.body(ReportSection::BudgetRequirements), &ExtractedBody::Bullets(vec!["$50k".into()]));
    }

    #[test]
    fn test_legacy_label_form() {
        let reply = "Market Research: Demand is rising.\n- Segment grows 12% yearly\nFeasibility: High\nSWOT Analysis:\n- Strength: low cost\n";
        let report = extractor().extract(reply);
        assert_eq!(
            report.body(ReportSection::MarketResearch),
            &ExtractedBody::Bullets(vec!["Segment grows 12% yearly".into()])
        );
        assert_eq!(report.body(ReportSection::Feasibility), &ExtractedBody::Paragraph("High".into()));
        assert_eq!(
            report.body(ReportSection::SwotAnalysis),
            &ExtractedBody::Bullets(vec!["Strength: low cost".into()])
        );
    }

    #[test]
    fn test_unspaced_headings_end_the_previous_section() {
        let report = extractor().extract("##Market Research\n- a\n##Feasibility\n- b\n");
        assert_eq!(report.body(ReportSection::MarketResearch), &ExtractedBody::Bullets(vec!["a".into()]));
        assert_eq!(report.body(ReportSection::Feasibility), &ExtractedBody::Bullets(vec!["b".into()]));
    }

    #[test]
    fn test_markdown_heading_wins_over_legacy() {
        let reply = "Feasibility: legacy text\n\n## Feasibility\n- from heading\n";
        let report = extractor().extract(reply);
        assert_eq!(report.body(ReportSection::Feasibility), &ExtractedBody::Bullets(vec!["from heading".into()]));
    }

    #[test]
    fn test_blank_heading_falls_through() {
        let reply = "## Feasibility\n\n## Feasibility\n- second occurrence\n";
        let report = extractor().extract(reply);
        assert_eq!(
            report.body(ReportSection::Feasibility),
            &ExtractedBody::Bullets(vec!["second occurrence".into()])
        );
    }

    #[test]
    fn test_competitor_table_kept_verbatim() {
        let table = "| Competitor | Strengths | Weaknesses |\n|:-----------|-----------|-----------:|\n| Company A | Strong brand | High costs |\n| Company B | Innovation | Limited reach |";
        let reply = format!("## Competitor Analysis\nThe main players:\n\n{}\n\n- extra note\n## Feasibility\n- ok\n", table);
        let report = extractor().extract(&reply);
        assert_eq!(report.body(ReportSection::CompetitorAnalysis), &ExtractedBody::Table(table.to_string()));
    }

    #[test]
    fn test_table_outside_competitor_section_is_not_special() {
        let reply = "## Budget Requirements\n| Item | Cost |\n|---|---|\n| Rent | $1k |\n";
        let report = extractor().extract(reply);
        assert!(matches!(report.body(ReportSection::BudgetRequirements), ExtractedBody::Paragraph(_)));
    }

    #[test]
    fn test_paragraph_is_bounded() {
        let long = "word ".repeat(300);
        let reply = format!("## Scalability Potential\n{}\n", long);
        let report = extractor().extract(&reply);
        match report.body(ReportSection::ScalabilityPotential) {
            ExtractedBody::Paragraph(text) => assert!(text.chars().count() <= MAX_PARAGRAPH_CHARS),
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_reply_is_all_placeholders() {
        let report = extractor().extract("");
        assert!(report.sections().iter().all(|s| s.body.is_placeholder()));
    }

    #[test]
    fn test_cac_heading_with_parentheses() {
        let reply = "### Customer Acquisition Cost (CAC) Estimate\n- $40 per customer\n\n![Summary chart](x.svg)\n";
        let report = extractor().extract(reply);
        assert_eq!(
            report.body(ReportSection::CustomerAcquisitionCost),
            &ExtractedBody::Bullets(vec!["$40 per customer".into()])
        );
    }

    #[test]
    fn test_has_market_research_heading() {
        assert!(has_market_research_heading("intro\n## Market Research\n- x"));
        assert!(has_market_research_heading("**Market Research**:\nsize"));
        assert!(has_market_research_heading("Market Research: size"));
        assert!(!has_market_research_heading("We did some market research for you."));
        assert!(!has_market_research_heading(""));
    }
}
