//! SVG rendering of the waiting-time histogram
//!
//! Self-contained vector figure: one bar per bucket, a dashed vertical
//! line at the mean wait, axis labels and a title. The markup is
//! assembled as a string, no plotting dependency involved.

use crate::histogram::HistogramSpec;
use crate::time_utils::format_hms;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;

const BAR_FILL: &str = "#4c72b0";
const FONT: &str = "font-family=\"sans-serif\"";

/// Histogram figure renderer
#[derive(Debug)]
pub struct SvgHistogram<'a> {
    spec: &'a HistogramSpec,
    mean_seconds: f64,
    title: String,
}

impl<'a> SvgHistogram<'a> {
    pub fn new(spec: &'a HistogramSpec, mean_seconds: f64, title: impl Into<String>) -> Self {
        Self {
            spec,
            mean_seconds,
            title: title.into(),
        }
    }

    /// Escape XML special characters
    fn escape_xml(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }

    /// Generate the complete SVG document
    pub fn render(&self) -> String {
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

        let min_edge = self.spec.edges[0];
        let max_edge = *self.spec.edges.last().expect("edges are never empty");
        let span = max_edge - min_edge;
        let max_count = self.spec.counts.iter().copied().max().unwrap_or(0).max(1);

        let x_of = |value: f64| MARGIN_LEFT + plot_w * (value - min_edge) / span;
        let baseline = MARGIN_TOP + plot_h;

        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
        ));
        svg.push('\n');
        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

        // title
        svg.push_str(&format!(
            r#"<text x="{x}" y="32" text-anchor="middle" {FONT} font-size="18">{title}</text>"#,
            x = WIDTH / 2.0,
            title = Self::escape_xml(&self.title),
        ));
        svg.push('\n');

        // bars
        for (i, &count) in self.spec.counts.iter().enumerate() {
            let x0 = x_of(self.spec.edges[i]);
            let x1 = x_of(self.spec.edges[i + 1]);
            let bar_h = plot_h * count as f64 / max_count as f64;
            svg.push_str(&format!(
                r#"<rect x="{x0:.2}" y="{y:.2}" width="{w:.2}" height="{bar_h:.2}" fill="{BAR_FILL}" stroke="black" stroke-width="1"/>"#,
                y = baseline - bar_h,
                w = x1 - x0,
            ));
            svg.push('\n');
        }

        // axes
        svg.push_str(&format!(
            r#"<line x1="{MARGIN_LEFT}" y1="{baseline}" x2="{x2}" y2="{baseline}" stroke="black" stroke-width="1"/>"#,
            x2 = MARGIN_LEFT + plot_w,
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{baseline}" stroke="black" stroke-width="1"/>"#
        ));
        svg.push('\n');

        // dashed mean marker with legend
        let mean_x = x_of(self.spec.unit.convert(self.mean_seconds));
        svg.push_str(&format!(
            r#"<line x1="{mean_x:.2}" y1="{MARGIN_TOP}" x2="{mean_x:.2}" y2="{baseline}" stroke="red" stroke-width="2" stroke-dasharray="6 4"/>"#
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" text-anchor="end" {FONT} font-size="14" fill="red">Mean wait: {mean}</text>"#,
            x = WIDTH - MARGIN_RIGHT - 8.0,
            y = MARGIN_TOP + 18.0,
            mean = format_hms(self.mean_seconds),
        ));
        svg.push('\n');

        // edge tick labels for the data span
        svg.push_str(&format!(
            r#"<text x="{MARGIN_LEFT}" y="{y}" text-anchor="middle" {FONT} font-size="12">{min_edge:.1}</text>"#,
            y = baseline + 20.0,
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" text-anchor="middle" {FONT} font-size="12">{max_edge:.1}</text>"#,
            x = MARGIN_LEFT + plot_w,
            y = baseline + 20.0,
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" text-anchor="end" {FONT} font-size="12">{max_count}</text>"#,
            x = MARGIN_LEFT - 6.0,
            y = MARGIN_TOP + 12.0,
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="{x}" y="{baseline}" text-anchor="end" {FONT} font-size="12">0</text>"#,
            x = MARGIN_LEFT - 6.0,
        ));
        svg.push('\n');

        // axis titles
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" text-anchor="middle" {FONT} font-size="14">{label}</text>"#,
            x = MARGIN_LEFT + plot_w / 2.0,
            y = HEIGHT - 18.0,
            label = Self::escape_xml(self.spec.unit.axis_label()),
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="20" y="{y}" text-anchor="middle" {FONT} font-size="14" transform="rotate(-90 20 {y})">Job count</text>"#,
            y = MARGIN_TOP + plot_h / 2.0,
        ));
        svg.push('\n');

        svg.push_str("</svg>\n");
        svg
    }
}
