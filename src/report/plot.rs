use crate::analysis::metrics::SecurityMetrics;
use crate::analysis::regression::RegressionResult;
use std::fs;
use std::io;
use std::path::Path;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;
const TICKS: usize = 5;
const POINT_COLOR: &str = "#4682b4";
const LINE_COLOR: &str = "#c0392b";
const AXIS_COLOR: &str = "#333333";

/// Data-to-pixel mapping for the plot area. Every coordinate conversion goes
/// through this one type instead of ad-hoc math at each call site.
struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn from_points(points: &[(f64, f64)]) -> Self {
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for &(x, y) in points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }

        // Pad 5% on every side; a dimension with no spread gets a fixed pad
        // so the span never collapses to zero.
        let x_pad = pad(x_min, x_max);
        let y_pad = pad(y_min, y_max);
        Self {
            x_min: x_min - x_pad,
            x_max: x_max + x_pad,
            y_min: y_min - y_pad,
            y_max: y_max + y_pad,
        }
    }

    fn x_to_px(&self, x: f64) -> f64 {
        let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        MARGIN_LEFT + (x - self.x_min) / (self.x_max - self.x_min) * plot_width
    }

    // SVG y grows downward, data y grows upward.
    fn y_to_px(&self, y: f64) -> f64 {
        let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        HEIGHT - MARGIN_BOTTOM - (y - self.y_min) / (self.y_max - self.y_min) * plot_height
    }
}

fn pad(min: f64, max: f64) -> f64 {
    let span = max - min;
    if span > 0.0 {
        span * 0.05
    } else {
        min.abs().max(0.05) * 0.1
    }
}

/// Scatter of (annualized volatility, annualized return) with the fitted
/// line overlaid, rendered as a standalone SVG document.
pub struct ScatterPlot<'a> {
    metrics: &'a [SecurityMetrics],
    regression: &'a RegressionResult,
}

impl<'a> ScatterPlot<'a> {
    pub fn new(metrics: &'a [SecurityMetrics], regression: &'a RegressionResult) -> Self {
        Self {
            metrics,
            regression,
        }
    }

    pub fn render_svg(&self) -> String {
        let points: Vec<(&str, f64, f64)> = self
            .metrics
            .iter()
            .filter(|m| m.annualized_volatility.is_finite() && m.annualized_return.is_finite())
            .map(|m| {
                (
                    m.ticker.as_str(),
                    m.annualized_volatility,
                    m.annualized_return,
                )
            })
            .collect();

        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" \
             viewBox=\"0 0 {WIDTH} {HEIGHT}\" font-family=\"sans-serif\">\n"
        ));
        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

        if points.is_empty() {
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"16\">no data</text>\n",
                WIDTH / 2.0,
                HEIGHT / 2.0
            ));
            svg.push_str("</svg>\n");
            return svg;
        }

        let xy: Vec<(f64, f64)> = points.iter().map(|&(_, x, y)| (x, y)).collect();
        let frame = Frame::from_points(&xy);

        self.push_titles(&mut svg);
        self.push_axes(&mut svg, &frame);
        self.push_fitted_line(&mut svg, &frame);
        for (ticker, x, y) in &points {
            let px = frame.x_to_px(*x);
            let py = frame.y_to_px(*y);
            svg.push_str(&format!(
                "<circle cx=\"{px:.1}\" cy=\"{py:.1}\" r=\"4\" fill=\"{POINT_COLOR}\" fill-opacity=\"0.8\"/>\n"
            ));
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"{AXIS_COLOR}\">{ticker}</text>\n",
                px + 6.0,
                py - 6.0
            ));
        }
        svg.push_str("</svg>\n");
        svg
    }

    fn push_titles(&self, svg: &mut String) {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"24\" text-anchor=\"middle\" font-size=\"18\" fill=\"{AXIS_COLOR}\">\
             Annualized return vs. annualized volatility</text>\n",
            WIDTH / 2.0
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"44\" text-anchor=\"middle\" font-size=\"13\" fill=\"{AXIS_COLOR}\">\
             Conclusion: {}</text>\n",
            WIDTH / 2.0,
            self.regression.conclusion
        ));
    }

    fn push_axes(&self, svg: &mut String, frame: &Frame) {
        let x0 = MARGIN_LEFT;
        let x1 = WIDTH - MARGIN_RIGHT;
        let y0 = HEIGHT - MARGIN_BOTTOM;
        let y1 = MARGIN_TOP;

        svg.push_str(&format!(
            "<line x1=\"{x0}\" y1=\"{y0}\" x2=\"{x1}\" y2=\"{y0}\" stroke=\"{AXIS_COLOR}\"/>\n"
        ));
        svg.push_str(&format!(
            "<line x1=\"{x0}\" y1=\"{y0}\" x2=\"{x0}\" y2=\"{y1}\" stroke=\"{AXIS_COLOR}\"/>\n"
        ));

        for i in 0..TICKS {
            let fraction = i as f64 / (TICKS - 1) as f64;

            let x_value = frame.x_min + fraction * (frame.x_max - frame.x_min);
            let px = frame.x_to_px(x_value);
            svg.push_str(&format!(
                "<line x1=\"{px:.1}\" y1=\"{y0}\" x2=\"{px:.1}\" y2=\"{:.1}\" stroke=\"{AXIS_COLOR}\"/>\n",
                y0 + 5.0
            ));
            svg.push_str(&format!(
                "<text x=\"{px:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"11\" \
                 fill=\"{AXIS_COLOR}\">{x_value:.2}</text>\n",
                y0 + 20.0
            ));

            let y_value = frame.y_min + fraction * (frame.y_max - frame.y_min);
            let py = frame.y_to_px(y_value);
            svg.push_str(&format!(
                "<line x1=\"{:.1}\" y1=\"{py:.1}\" x2=\"{x0}\" y2=\"{py:.1}\" stroke=\"{AXIS_COLOR}\"/>\n",
                x0 - 5.0
            ));
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\" \
                 fill=\"{AXIS_COLOR}\">{y_value:.2}</text>\n",
                x0 - 10.0,
                py + 4.0
            ));
        }

        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"13\" \
             fill=\"{AXIS_COLOR}\">Annualized volatility</text>\n",
            (x0 + x1) / 2.0,
            HEIGHT - 20.0
        ));
        svg.push_str(&format!(
            "<text x=\"22\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"13\" \
             fill=\"{AXIS_COLOR}\" transform=\"rotate(-90 22 {:.1})\">Annualized return</text>\n",
            (y0 + y1) / 2.0,
            (y0 + y1) / 2.0
        ));
    }

    fn push_fitted_line(&self, svg: &mut String, frame: &Frame) {
        let y_at = |x: f64| self.regression.slope * x + self.regression.intercept;
        let (x1, y1) = (frame.x_min, y_at(frame.x_min));
        let (x2, y2) = (frame.x_max, y_at(frame.x_max));

        svg.push_str(&format!(
            "<defs><clipPath id=\"plot-area\"><rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\"/></clipPath></defs>\n",
            MARGIN_LEFT,
            MARGIN_TOP,
            WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
            HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
        ));
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{LINE_COLOR}\" \
             stroke-width=\"2\" clip-path=\"url(#plot-area)\"/>\n",
            frame.x_to_px(x1),
            frame.y_to_px(y1),
            frame.x_to_px(x2),
            frame.y_to_px(y2)
        ));
    }

    /// Write the rendered document to disk, creating parent directories as
    /// needed.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.render_svg())
    }
}
