// Budget-vs-spending bar chart: one budget bar and one spent bar per
// category, built with `charming`. The default `raster` feature writes a
// PNG; building without it writes a self-contained HTML page instead.

use anyhow::{anyhow, Result};
use charming::{
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisType, Tooltip, Trigger},
    series::bar,
    Chart,
};
use std::path::Path;
use tracing::info;

use crate::models::CategoryRecord;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const TITLE: &str = "Budget vs. Actual Spending by Category";

/// Build the chart for `records`. Budgets are already numeric by the time
/// records reach here, so a missing budget plots as a zero-height bar.
pub fn budget_chart(records: &[CategoryRecord]) -> Chart {
    let categories: Vec<String> = records.iter().map(|r| r.category_name.clone()).collect();
    let budget: Vec<f64> = records.iter().map(|r| r.budget_amount).collect();
    let spent: Vec<f64> = records.iter().map(|r| r.total_amount).collect();

    Chart::new()
        .title(Title::new().text(TITLE).left("center"))
        .tooltip(Tooltip::new().trigger(Trigger::Axis))
        .legend(Legend::new().top("bottom"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("10%")
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .name("Category")
                .axis_label(AxisLabel::new().rotate(45))
                .data(categories),
        )
        .y_axis(Axis::new().type_(AxisType::Value).name("Amount"))
        .series(bar::Bar::new().name("Budget").data(budget))
        .series(bar::Bar::new().name("Spent").data(spent))
}

/// Render `records` to `path`. Write failures are returned to the caller.
pub fn render(records: &[CategoryRecord], path: &Path) -> Result<()> {
    let chart = budget_chart(records);
    write_chart(&chart, path)?;
    info!(path = %path.display(), categories = records.len(), "chart written");
    Ok(())
}

#[cfg(not(feature = "raster"))]
fn write_chart(chart: &Chart, path: &Path) -> Result<()> {
    let mut renderer = charming::HtmlRenderer::new(TITLE, WIDTH as u64, HEIGHT as u64);
    renderer
        .save(chart, path)
        .map_err(|e| anyhow!("failed to write chart to {}: {e:?}", path.display()))
}

#[cfg(feature = "raster")]
fn write_chart(chart: &Chart, path: &Path) -> Result<()> {
    let mut renderer = charming::ImageRenderer::new(WIDTH, HEIGHT);
    renderer
        .save_format(charming::ImageFormat::Png, chart, path)
        .map_err(|e| anyhow!("failed to write chart to {}: {e:?}", path.display()))
}
