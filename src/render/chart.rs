use serde::Serialize;
use tera::{Context, Tera};

use crate::error::AppError;
use crate::response::aggregate::{shown_label, ChartView, Tally};

const CHART_TEMPLATE: &str = "chart.txt";
const EMPTY_TEMPLATE: &str = "empty.txt";
const BAR_WIDTH: usize = 40;

#[derive(Serialize)]
struct ChartRow {
  label: String,
  bar: String,
  value: usize,
}

fn templates() -> Result<Tera, AppError> {
  let mut tera = Tera::default();
  tera
    .add_raw_templates(vec![
      (CHART_TEMPLATE, include_str!("../../templates/charts/chart.txt.tera")),
      (EMPTY_TEMPLATE, include_str!("../../templates/charts/empty.txt.tera")),
    ])
    .map_err(|e| AppError::Render(format!("Template load failed: {e}")))?;
  Ok(tera)
}

fn bar(value: usize, max: usize) -> String {
  if max == 0 {
    return String::new();
  }
  let width = (value * BAR_WIDTH + max / 2) / max;
  "#".repeat(width.max(usize::from(value > 0)))
}

fn rows(view: &ChartView) -> Vec<ChartRow> {
  let pairs: Vec<(String, usize)> = match view {
    ChartView::Pie(slices) => slices
      .iter()
      .map(|s| (s.display_label.clone(), s.count))
      .collect(),
    ChartView::Bar(entries) => entries
      .iter()
      .map(|e| (shown_label(&e.label).to_string(), e.count))
      .collect(),
    ChartView::Empty => Vec::new(),
  };
  let label_width = pairs.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
  let max = pairs.iter().map(|(_, c)| *c).max().unwrap_or(0);
  pairs
    .into_iter()
    .map(|(label, value)| ChartRow {
      label: format!("{label:<label_width$}"),
      bar: bar(value, max),
      value
    })
    .collect()
}

/// Plain-text rendering of a question chart.
pub fn render_chart(title: &str, tally: &Tally, view: &ChartView) -> Result<String, AppError> {
  let tera = templates()?;
  let mut ctx = Context::new();
  ctx.insert("title", title);
  ctx.insert("underline", &"-".repeat(title.chars().count()));

  let template = if matches!(view, ChartView::Empty) {
    EMPTY_TEMPLATE
  } else {
    let footer = match view {
      ChartView::Pie(_) => format!(
        "Total tallied: {} from {} responses",
        tally.total_tallied, tally.responses_considered
      ),
      _ => format!("Responses: {}", tally.responses_considered),
    };
    ctx.insert("rows", &rows(view));
    ctx.insert("footer", &footer);
    ctx.insert("stale", &tally.stale);
    CHART_TEMPLATE
  };
  tera
    .render(template, &ctx)
    .map_err(|e| AppError::Render(format!("Render failed for {template}: {e}")))
}
