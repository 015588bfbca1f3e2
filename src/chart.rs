//! Static tick chart rendered to an embeddable `script` + `div` pair.
//!
//! The `div` carries the SVG drawn by plotters; the `script` carries the chart
//! document (configuration and data) and wires the toolbar to the SVG
//! viewBox. A fresh element id ties the two together on every render.

use std::ops::Range;

use chrono::{DateTime, Utc};
use plotters::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ChartError;
use crate::loader::TickSource;
use crate::model::tick::TickPoint;

const BEHAVIOR_JS: &str = include_str!("chart_behavior.js");

/// Fixed visual configuration of the tick chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: &'static str,
    pub width: u32,
    pub height: u32,
    pub x_axis_type: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub toolbar_location: &'static str,
    pub tools: &'static [&'static str],
    pub line_width: u32,
    pub line_color: &'static str,
    pub legend_label: &'static str,
}

impl ChartSpec {
    pub fn tick_chart() -> Self {
        Self {
            title: "Tick Chart: Bid Price (Static Embed)",
            width: 800,
            height: 400,
            x_axis_type: "datetime",
            x_label: "Time",
            y_label: "Bid Price",
            toolbar_location: "above",
            tools: &["pan", "wheel_zoom", "box_zoom", "reset", "save"],
            line_width: 2,
            line_color: "navy",
            legend_label: "Bid",
        }
    }

    fn line_rgb(&self) -> RGBColor {
        named_color(self.line_color).unwrap_or(RGBColor(0, 0, 128))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartArtifact {
    pub script: String,
    pub div: String,
    #[serde(skip)]
    pub element_id: String,
}

#[derive(Debug, Serialize)]
struct ChartDocument<'a> {
    element_id: &'a str,
    spec: &'a ChartSpec,
    x: Vec<i64>,
    y: Vec<f64>,
}

/// Load the tick file and render the chart; the whole request path.
pub fn embed_tick_chart(source: &TickSource, spec: &ChartSpec) -> Result<ChartArtifact, ChartError> {
    let records = source.load_chart_records()?;
    let points: Vec<TickPoint> = records.iter().filter_map(|r| r.point()).collect();
    render_components(spec, &points)
}

pub fn render_components(spec: &ChartSpec, points: &[TickPoint]) -> Result<ChartArtifact, ChartError> {
    let element_id = Uuid::new_v4().to_string();
    let svg = render_svg(spec, points)?;

    let div = format!(
        r#"<div class="tick-chart" id="{id}" data-root-id="{id}" style="width: {w}px;">{svg}</div>"#,
        id = element_id,
        w = spec.width,
        svg = svg,
    );

    let document = ChartDocument {
        element_id: &element_id,
        spec,
        x: points.iter().map(|p| p.x).collect(),
        y: points.iter().map(|p| p.y).collect(),
    };
    // Keep the JSON from terminating the surrounding script element.
    let doc_json = serde_json::to_string(&document)?.replace("</", "<\\/");
    let script = format!(
        "<script type=\"text/javascript\">\n(function() {{\n  const doc = {};\n{}}})();\n</script>",
        doc_json, BEHAVIOR_JS
    );

    tracing::debug!(points = points.len(), element_id = %element_id, "Rendered tick chart");
    Ok(ChartArtifact {
        script,
        div,
        element_id,
    })
}

pub fn render_svg(spec: &ChartSpec, points: &[TickPoint]) -> Result<String, ChartError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (spec.width, spec.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let (x_range, y_range) = axis_ranges(points);
        let mut chart = ChartBuilder::on(&root)
            .caption(spec.title, ("sans-serif", 18))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(64)
            .build_cartesian_2d(x_range, y_range)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc(spec.x_label)
            .y_desc(spec.y_label)
            .x_labels(6)
            .x_label_formatter(&|ms: &i64| time_label(*ms))
            .y_label_formatter(&|v: &f64| format!("{:.3}", v))
            .draw()
            .map_err(render_err)?;

        let color = spec.line_rgb();
        let stroke = color.stroke_width(spec.line_width);
        chart
            .draw_series(LineSeries::new(points.iter().map(|p| (p.x, p.y)), stroke))
            .map_err(render_err)?
            .label(spec.legend_label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

/// Data bounds with a little headroom; degenerate spans are widened so the
/// coordinate system never collapses.
pub fn axis_ranges(points: &[TickPoint]) -> (Range<i64>, Range<f64>) {
    let finite = || points.iter().filter(|p| p.y.is_finite());

    let (x_min, x_max) = match (finite().map(|p| p.x).min(), finite().map(|p| p.x).max()) {
        (Some(lo), Some(hi)) if hi > lo => (lo, hi),
        (Some(lo), Some(_)) => (lo - 1_000, lo + 1_000),
        _ => (0, 1_000),
    };

    let (y_lo, y_hi) = finite().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.y), hi.max(p.y))
    });
    let (y_min, y_max) = if y_lo.is_infinite() {
        (0.0, 1.0)
    } else if y_hi > y_lo {
        let pad = (y_hi - y_lo) * 0.05;
        (y_lo - pad, y_hi + pad)
    } else {
        (y_lo - 0.5, y_hi + 0.5)
    };

    (x_min..x_max, y_min..y_max)
}

fn time_label(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.format("%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn named_color(name: &str) -> Option<RGBColor> {
    match name {
        "navy" => Some(RGBColor(0, 0, 128)),
        "black" => Some(RGBColor(0, 0, 0)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        _ => None,
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}
