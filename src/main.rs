use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use venture_scout::{
    config::Config, utils::init_logger, PipelineError, ResearchPipeline, Stage, StartupProfile,
};

/// Generate a structured market-research report for a startup idea
#[derive(Debug, Parser)]
#[command(name = "venture-scout", version, about)]
struct Args {
    /// The startup idea, in a sentence
    #[arg(long)]
    idea: String,

    #[arg(long)]
    country: String,

    #[arg(long)]
    target_market: String,

    /// Available budget, free text (e.g. "$50,000")
    #[arg(long)]
    budget: String,

    /// Idea, Prototype, Early Traction or Scaling
    #[arg(long)]
    stage: Stage,

    #[arg(long)]
    team_size: u32,

    /// Key technologies
    #[arg(long)]
    technologies: String,

    #[arg(long)]
    funding_goal: String,

    #[arg(long)]
    launch_timeline: String,

    /// Write the markdown report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Stop after query synthesis and print the queries
    #[arg(long)]
    queries_only: bool,
}

impl Args {
    fn profile(&self) -> StartupProfile {
        StartupProfile {
            idea: self.idea.clone(),
            country: self.country.clone(),
            target_market: self.target_market.clone(),
            budget: self.budget.clone(),
            stage: self.stage,
            team_size: self.team_size,
            technologies: self.technologies.clone(),
            funding_goal: self.funding_goal.clone(),
            launch_timeline: self.launch_timeline.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logger();
    let args = Args::parse();

    let config = Config::from_env()?;
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        search = ?config.search.provider,
        renderer = ?config.browser.renderer,
        "Configuration loaded"
    );

    let pipeline = match ResearchPipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => return Ok(fail(&e)),
    };
    let profile = args.profile();

    if args.queries_only {
        return match pipeline.synthesize_queries(&profile).await {
            Ok(queries) => {
                let text = queries.iter().cloned().collect::<Vec<_>>().join("\n");
                emit(&text, args.output.as_ref()).await?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => Ok(fail(&e)),
        };
    }

    match pipeline.run(&profile).await {
        Ok(result) => {
            emit(&result.markdown, args.output.as_ref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(fail(&e)),
    }
}

async fn emit(text: &str, output: Option<&PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, text)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn fail(error: &PipelineError) -> ExitCode {
    eprintln!("{error}");
    ExitCode::FAILURE
}
