//! SVG charts for the report
//!
//! Both charts are standalone SVG documents embedded as
//! `data:image/svg+xml;base64,...` so the report stays a single file.

use crate::portfolio::types::{AllocationSlice, PerformanceSeries};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt::Write;

const DONUT_SIZE: f64 = 240.0;
const DONUT_RADIUS: f64 = 90.0;
const DONUT_WIDTH: f64 = 40.0;

const LINE_WIDTH: f64 = 800.0;
const LINE_HEIGHT: f64 = 320.0;
const PAD_LEFT: f64 = 64.0;
const PAD_RIGHT: f64 = 16.0;
const PAD_TOP: f64 = 16.0;
const PAD_BOTTOM: f64 = 40.0;
const X_LABELS: usize = 6;

const PORTFOLIO_COLOR: &str = "#1e3a8a";
const BENCHMARK_COLOR: &str = "#9ca3af";

/// Wrap an SVG document as a data URI
pub fn svg_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}

/// Allocation donut; `None` when there is nothing positive to draw
pub fn donut_chart(slices: &[AllocationSlice]) -> Option<String> {
    let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }

    let center = DONUT_SIZE / 2.0;
    let circumference = 2.0 * std::f64::consts::PI * DONUT_RADIUS;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{s}" height="{s}" viewBox="0 0 {s} {s}">"#,
        s = DONUT_SIZE
    );
    let _ = write!(
        svg,
        r#"<g transform="rotate(-90 {c} {c})" fill="none" stroke-width="{w}">"#,
        c = center,
        w = DONUT_WIDTH
    );

    // Each slice is a dash on the same circle, offset by the slices before it
    let mut offset = 0.0;
    for slice in slices.iter().filter(|s| s.value > 0.0) {
        let length = slice.value / total * circumference;
        let _ = write!(
            svg,
            r#"<circle cx="{c}" cy="{c}" r="{r}" stroke="{color}" stroke-dasharray="{len:.3} {gap:.3}" stroke-dashoffset="{off:.3}"/>"#,
            c = center,
            r = DONUT_RADIUS,
            color = slice.color,
            len = length,
            gap = circumference - length,
            off = -offset,
        );
        offset += length;
    }

    svg.push_str("</g></svg>");
    Some(svg_data_uri(&svg))
}

fn polyline(values: &[f64], min: f64, max: f64, color: &str, dashed: bool) -> String {
    let plot_width = LINE_WIDTH - PAD_LEFT - PAD_RIGHT;
    let plot_height = LINE_HEIGHT - PAD_TOP - PAD_BOTTOM;
    let span = (max - min).max(f64::EPSILON);
    let step = if values.len() > 1 {
        plot_width / (values.len() - 1) as f64
    } else {
        0.0
    };

    let points = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = PAD_LEFT + i as f64 * step;
            let y = PAD_TOP + (1.0 - (v - min) / span) * plot_height;
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ");

    let dash = if dashed { r#" stroke-dasharray="6 4""# } else { "" };
    format!(
        r#"<polyline fill="none" stroke="{}" stroke-width="2"{} points="{}"/>"#,
        color, dash, points
    )
}

/// Growth-of-10,000 line chart; `None` when the series is empty
pub fn performance_chart(series: &PerformanceSeries) -> Option<String> {
    if series.portfolio.is_empty() {
        return None;
    }

    let (min, max) = series
        .portfolio
        .iter()
        .chain(&series.benchmark)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    // Breathing room above and below the lines
    let margin = ((max - min) * 0.05).max(1.0);
    let (min, max) = (min - margin, max + margin);

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="11">"#,
        w = LINE_WIDTH,
        h = LINE_HEIGHT
    );

    let plot_bottom = LINE_HEIGHT - PAD_BOTTOM;
    for i in 0..=4 {
        let fraction = i as f64 / 4.0;
        let y = PAD_TOP + fraction * (plot_bottom - PAD_TOP);
        let value = max - fraction * (max - min);
        let _ = write!(
            svg,
            r##"<line x1="{x1}" x2="{x2}" y1="{y:.1}" y2="{y:.1}" stroke="#e5e7eb"/><text x="{tx}" y="{ty:.1}" text-anchor="end" fill="#6b7280">{value:.0}</text>"##,
            x1 = PAD_LEFT,
            x2 = LINE_WIDTH - PAD_RIGHT,
            y = y,
            tx = PAD_LEFT - 6.0,
            ty = y + 4.0,
            value = value,
        );
    }

    if !series.benchmark.is_empty() {
        svg.push_str(&polyline(&series.benchmark, min, max, BENCHMARK_COLOR, true));
    }
    svg.push_str(&polyline(&series.portfolio, min, max, PORTFOLIO_COLOR, false));

    let count = series.labels.len();
    if count > 0 {
        let plot_width = LINE_WIDTH - PAD_LEFT - PAD_RIGHT;
        let every = (count / X_LABELS).max(1);
        for (i, label) in series.labels.iter().enumerate().step_by(every) {
            let x = if count > 1 {
                PAD_LEFT + i as f64 * plot_width / (count - 1) as f64
            } else {
                PAD_LEFT
            };
            let _ = write!(
                svg,
                r##"<text x="{x:.1}" y="{y}" text-anchor="middle" fill="#6b7280">{label}</text>"##,
                x = x,
                y = LINE_HEIGHT - PAD_BOTTOM / 2.0 + 4.0,
                label = label,
            );
        }
    }

    svg.push_str("</svg>");
    Some(svg_data_uri(&svg))
}
