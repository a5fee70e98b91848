//! Core data model for one research run.
//!
//! Every value flows forward through the pipeline:
//! `StartupProfile` → `QuerySet` → `ResearchBundle` → raw completion → `StructuredReport`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::{Validate, ValidationError};

/// Maximum number of queries handed to the collector
pub const MAX_QUERIES: usize = 6;

/// Marker used for a section whose body could not be recovered
pub const PLACEHOLDER_TEXT: &str = "no structured insight extracted.";

/// Development stage of the startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Idea,
    Prototype,
    #[serde(rename = "Early Traction")]
    EarlyTraction,
    Scaling,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Idea, Stage::Prototype, Stage::EarlyTraction, Stage::Scaling];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idea => "Idea",
            Stage::Prototype => "Prototype",
            Stage::EarlyTraction => "Early Traction",
            Stage::Scaling => "Scaling",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str().replace(' ', "").to_lowercase() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown stage '{}', expected one of: Idea, Prototype, Early Traction, Scaling",
                    s
                )
            })
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Parameters submitted for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartupProfile {
    #[validate(custom(function = "not_blank"))]
    pub idea: String,
    #[validate(custom(function = "not_blank"))]
    pub country: String,
    #[validate(custom(function = "not_blank"))]
    pub target_market: String,
    /// Free text, currency-agnostic
    #[validate(custom(function = "not_blank"))]
    pub budget: String,
    pub stage: Stage,
    #[validate(range(min = 1))]
    pub team_size: u32,
    #[validate(custom(function = "not_blank"))]
    pub technologies: String,
    #[validate(custom(function = "not_blank"))]
    pub funding_goal: String,
    #[validate(custom(function = "not_blank"))]
    pub launch_timeline: String,
}

/// Ordered, deduplicated, bounded list of search queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySet(Vec<String>);

impl QuerySet {
    /// Keeps the first occurrence of every non-blank candidate, up to [`MAX_QUERIES`]
    pub fn from_candidates<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut queries = Vec::new();
        for candidate in candidates {
            let candidate: String = candidate.into();
            if candidate.trim().is_empty() || !seen.insert(candidate.clone()) {
                continue;
            }
            queries.push(candidate);
            if queries.len() == MAX_QUERIES {
                break;
            }
        }
        Self(queries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a QuerySet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One successfully fetched, content-bearing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub content: String,
}

/// Pages collected for one run, unique by URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchBundle(Vec<PageRecord>);

impl ResearchBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the record unless its URL is already present
    pub fn push(&mut self, record: PageRecord) -> bool {
        if self.0.iter().any(|r| r.url == record.url) {
            return false;
        }
        self.0.push(record);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageRecord> {
        self.0.iter()
    }

    pub fn urls(&self) -> Vec<&str> {
        self.0.iter().map(|r| r.url.as_str()).collect()
    }
}

impl FromIterator<PageRecord> for ResearchBundle {
    fn from_iter<T: IntoIterator<Item = PageRecord>>(iter: T) -> Self {
        let mut bundle = ResearchBundle::new();
        for record in iter {
            bundle.push(record);
        }
        bundle
    }
}

/// The ten report sections, in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportSection {
    MarketResearch,
    CompetitorAnalysis,
    Feasibility,
    BudgetRequirements,
    BusinessOutline,
    RequirementsToGetStarted,
    SwotAnalysis,
    RiskAssessment,
    ScalabilityPotential,
    CustomerAcquisitionCost,
}

impl ReportSection {
    pub const ALL: [ReportSection; 10] = [
        ReportSection::MarketResearch,
        ReportSection::CompetitorAnalysis,
        ReportSection::Feasibility,
        ReportSection::BudgetRequirements,
        ReportSection::BusinessOutline,
        ReportSection::RequirementsToGetStarted,
        ReportSection::SwotAnalysis,
        ReportSection::RiskAssessment,
        ReportSection::ScalabilityPotential,
        ReportSection::CustomerAcquisitionCost,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportSection::MarketResearch => "Market Research",
            ReportSection::CompetitorAnalysis => "Competitor Analysis",
            ReportSection::Feasibility => "Feasibility",
            ReportSection::BudgetRequirements => "Budget Requirements",
            ReportSection::BusinessOutline => "Business Outline",
            ReportSection::RequirementsToGetStarted => "Requirements to Get Started",
            ReportSection::SwotAnalysis => "SWOT Analysis",
            ReportSection::RiskAssessment => "Risk Assessment",
            ReportSection::ScalabilityPotential => "Scalability Potential",
            ReportSection::CustomerAcquisitionCost => "Customer Acquisition Cost (CAC) Estimate",
        }
    }
}

impl std::fmt::Display for ReportSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Body recovered for one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractedBody {
    /// Bullet items without their leading marker
    Bullets(Vec<String>),
    /// Markdown table kept verbatim (Competitor Analysis only)
    Table(String),
    /// Unbulleted body, bounded in length
    Paragraph(String),
    Placeholder,
}

impl ExtractedBody {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ExtractedBody::Placeholder)
    }

    pub fn render(&self) -> String {
        match self {
            ExtractedBody::Bullets(items) => items
                .iter()
                .map(|item| format!("- {}", item))
                .collect::<Vec<_>>()
                .join("\n"),
            ExtractedBody::Table(table) => table.clone(),
            ExtractedBody::Paragraph(text) => text.clone(),
            ExtractedBody::Placeholder => PLACEHOLDER_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBody {
    pub section: ReportSection,
    pub body: ExtractedBody,
}

/// Ten-section report in fixed order, plus the summary chart reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredReport {
    sections: Vec<SectionBody>,
    chart_ref: String,
}

impl StructuredReport {
    /// Builds the report by asking `body_for` once per section, in order
    pub fn build<F>(chart_ref: impl Into<String>, mut body_for: F) -> Self
    where
        F: FnMut(ReportSection) -> ExtractedBody,
    {
        let sections = ReportSection::ALL
            .into_iter()
            .map(|section| SectionBody {
                section,
                body: body_for(section),
            })
            .collect();
        Self {
            sections,
            chart_ref: chart_ref.into(),
        }
    }

    pub fn sections(&self) -> &[SectionBody] {
        &self.sections
    }

    pub fn body(&self, section: ReportSection) -> &ExtractedBody {
        // `build` always fills every section
        &self.sections[ReportSection::ALL
            .iter()
            .position(|s| *s == section)
            .unwrap_or_default()]
        .body
    }

    pub fn chart_ref(&self) -> &str {
        &self.chart_ref
    }

    /// Assembles the markdown document handed to the display layer
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        for entry in &self.sections {
            output.push_str(&format!("## {}\n", entry.section.name()));
            output.push_str(&entry.body.render());
            output.push_str("\n\n");
        }
        output.push_str(&format!("![Summary chart]({})\n", self.chart_ref));
        output
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn profile() -> StartupProfile {
        StartupProfile {
            idea: "Banana peel packaging".to_string(),
            country: "United States".to_string(),
            target_market: "Eco-conscious businesses".to_string(),
            budget: "$50,000".to_string(),
            stage: Stage::Idea,
            team_size: 3,
            technologies: "Biomaterials".to_string(),
            funding_goal: "$100,000 from VC".to_string(),
            launch_timeline: "6 months".to_string(),
        }
    }

    #[test]
    fn test_profile_validation() {
        assert!(profile().validate().is_ok());

        let mut blank = profile();
        blank.country = "   ".to_string();
        assert!(blank.validate().is_err());

        let mut no_team = profile();
        no_team.team_size = 0;
        assert!(no_team.validate().is_err());
    }

    #[test]
    fn test_stage_parsing() {
        assert_eq!("early traction".parse::<Stage>(), Ok(Stage::EarlyTraction));
        assert_eq!("Early-Traction".parse::<Stage>(), Ok(Stage::EarlyTraction));
        assert_eq!("SCALING".parse::<Stage>(), Ok(Stage::Scaling));
        assert!("seed".parse::<Stage>().is_err());
        assert_eq!(Stage::EarlyTraction.to_string(), "Early Traction");
    }

    #[test]
    fn test_query_set_dedup_and_bound() {
        let set = QuerySet::from_candidates(vec!["a", "b", "a", "", "c", "d", "e", "f", "g"]);
        assert_eq!(set.as_slice(), &["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_bundle_rejects_duplicate_urls() {
        let mut bundle = ResearchBundle::new();
        assert!(bundle.push(PageRecord { url: "https://a".into(), content: "one".into() }));
        assert!(!bundle.push(PageRecord { url: "https://a".into(), content: "two".into() }));
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.iter().next().map(|r| r.content.as_str()), Some("one"));
    }

    #[test]
    fn test_report_always_has_ten_sections_in_order() {
        let report = StructuredReport::build("reports/summary_chart.svg", |_| ExtractedBody::Placeholder);
        let names: Vec<_> = report.sections().iter().map(|s| s.section).collect();
        assert_eq!(names, ReportSection::ALL.to_vec());

        let markdown = report.to_markdown();
        let first = markdown.find("## Market Research").unwrap();
        let last = markdown.find("## Customer Acquisition Cost (CAC) Estimate").unwrap();
        assert!(first < last);
        assert_eq!(markdown.matches(PLACEHOLDER_TEXT).count(), 10);
        assert!(markdown.trim_end().ends_with("![Summary chart](reports/summary_chart.svg)"));
    }

    #[test]
    fn test_render_bullets() {
        let body = ExtractedBody::Bullets(vec!["one".into(), "two".into()]);
        assert_eq!(body.render(), "- one\n- two");
    }

    #[test]
    fn test_placeholder_renders_sentinel() {
        assert_eq!(ExtractedBody::Placeholder.render(), "no structured insight extracted.");
    }
}
