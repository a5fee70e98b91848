// Summary chart: a fixed, illustrative cost/opportunity breakdown

use plotters::element::Pie;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::{AppError, AppResult};

pub const CHART_FILE_NAME: &str = "summary_chart.svg";

/// Category labels and their share of the pie, in percent
pub const SUMMARY_CATEGORIES: [(&str, f64); 5] = [
    ("Market Opportunity", 30.0),
    ("Operating Costs", 25.0),
    ("Competition", 20.0),
    ("Risk", 15.0),
    ("Growth Potential", 10.0),
];

const PALETTE: [RGBColor; 5] = [
    RGBColor(66, 133, 244),
    RGBColor(219, 68, 55),
    RGBColor(244, 180, 0),
    RGBColor(15, 157, 88),
    RGBColor(171, 71, 188),
];

/// Where [`render_summary_chart`] writes for a given directory
pub fn summary_chart_path(dir: &Path) -> PathBuf {
    dir.join(CHART_FILE_NAME)
}

pub fn render_summary_chart(dir: &Path) -> AppResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::Internal(format!("Failed to create chart directory {}: {e}", dir.display())))?;

    let path = summary_chart_path(dir);
    draw_pie(&path).map_err(|e| AppError::Internal(format!("Failed to render summary chart: {e}")))?;

    info!(path = %path.display(), "Summary chart written");
    Ok(path)
}

fn draw_pie(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(path, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled("Startup Summary", ("sans-serif", 24))?;

    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let sizes: Vec<f64> = SUMMARY_CATEGORIES.iter().map(|(_, share)| *share).collect();
    let labels: Vec<&str> = SUMMARY_CATEGORIES.iter().map(|(label, _)| *label).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &PALETTE, &labels);
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", 14).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 12).into_font().color(&WHITE));
    area.draw(&pie)?;

    root.present()?;
    Ok(())
}
