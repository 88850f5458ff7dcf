//! Bar chart rendering of per-phylum totals.
//!
//! The chart is rasterized directly into an [`RgbImage`]: one bar per phylum
//! in summary order, a y axis with tick labels, and phylum names rotated
//! 45° under the x axis. Text uses the built-in glyphs in [`glyphs`].

mod glyphs;

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use tracing::info;

use crate::error::PipelineError;
use crate::types::PhylumSummary;

pub const TITLE: &str = "Total Species Count by Phylum";
pub const X_LABEL: &str = "Phylum";
pub const Y_LABEL: &str = "Total Species Count";

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BAR: Rgb<u8> = Rgb([135, 206, 235]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

const MARGIN_LEFT: u32 = 100;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 60;
const MARGIN_BOTTOM: u32 = 170;
const MIN_PLOT_SIDE: u32 = 50;

/// Canvas size of the rendered chart, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartStyle {
    /// 10×6 inches at 100 dpi.
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

impl ChartStyle {
    fn check(&self) -> Result<(), String> {
        if self.width < MARGIN_LEFT + MARGIN_RIGHT + MIN_PLOT_SIDE
            || self.height < MARGIN_TOP + MARGIN_BOTTOM + MIN_PLOT_SIDE
        {
            return Err(format!(
                "chart canvas {}x{} is too small",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

/// Renders the bar chart and saves it to `path`, replacing any existing file.
///
/// The image format follows the file extension; a path without one is
/// written as PNG.
///
/// # Errors
///
/// [`PipelineError::SinkWrite`] if the canvas is too small for the layout,
/// or encoding or writing the image fails.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn render_bar_chart(
    path: impl AsRef<Path>,
    summary: &[PhylumSummary],
    style: &ChartStyle,
) -> Result<(), PipelineError> {
    let path = path.as_ref();
    let img = draw(summary, style).map_err(|msg| PipelineError::sink(path, msg))?;

    let saved = match path.extension() {
        None => img.save_with_format(path, ImageFormat::Png),
        Some(_) => img.save(path),
    };
    saved.map_err(|e| PipelineError::sink(path, e))?;

    info!(bars = summary.len(), "Bar chart saved to {}", path.display());
    Ok(())
}

/// Draws the chart in memory.
pub fn draw(summary: &[PhylumSummary], style: &ChartStyle) -> Result<RgbImage, String> {
    style.check()?;

    let mut canvas = Canvas::new(style.width, style.height);
    let plot = PlotArea {
        left: MARGIN_LEFT,
        top: MARGIN_TOP,
        right: style.width - MARGIN_RIGHT,
        bottom: style.height - MARGIN_BOTTOM,
    };

    let max_total = summary.iter().map(|s| s.total_count).max().unwrap_or(0).max(0);
    let axis = YAxis::fit(max_total);

    // title and axis labels
    let title_x = (style.width as f32 - (glyphs::text_width(TITLE) * 3) as f32) / 2.0;
    canvas.text(TITLE, (title_x, 20.0), 3, 0.0);
    let x_label_x =
        (plot.left + plot.right) as f32 / 2.0 - (glyphs::text_width(X_LABEL) * 2) as f32 / 2.0;
    canvas.text(X_LABEL, (x_label_x, (style.height - 24) as f32), 2, 0.0);
    let y_label_y =
        (plot.top + plot.bottom) as f32 / 2.0 + (glyphs::text_width(Y_LABEL) * 2) as f32 / 2.0;
    canvas.text(Y_LABEL, (16.0, y_label_y), 2, 90.0);

    // y ticks
    for tick in 0..=axis.ticks {
        let value = axis.value(tick);
        let y = plot.y_for(value, axis.max());
        canvas.fill(plot.left - 6, y, 6, 1, INK);
        let label = value.to_string();
        let label_x = (plot.left - 10) as f32 - (glyphs::text_width(&label) * 2) as f32;
        canvas.text(&label, (label_x, y as f32 - glyphs::GLYPH_HEIGHT as f32), 2, 0.0);
    }

    // bars and rotated phylum labels
    if !summary.is_empty() {
        let slot = plot.width() as f32 / summary.len() as f32;
        for (i, row) in summary.iter().enumerate() {
            let x0 = plot.left as f32 + slot * i as f32 + slot * 0.1;
            let bar_width = (slot * 0.8).max(1.0) as u32;
            if row.total_count > 0 {
                let top = plot.y_for(i128::from(row.total_count), axis.max());
                canvas.fill(x0 as u32, top, bar_width, plot.bottom - top, BAR);
            }

            let center = plot.left as f32 + slot * (i as f32 + 0.5);
            canvas.text_ending_at(&row.phylum, (center, (plot.bottom + 10) as f32), 2, 45.0);
        }
    }

    // axes drawn last so bars do not cover them
    canvas.fill(plot.left, plot.top, 1, plot.height() + 1, INK);
    canvas.fill(plot.left, plot.bottom, plot.width(), 1, INK);

    Ok(canvas.img)
}

struct PlotArea {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
}

impl PlotArea {
    fn width(&self) -> u32 {
        self.right - self.left
    }

    fn height(&self) -> u32 {
        self.bottom - self.top
    }

    fn y_for(&self, value: i128, max: i128) -> u32 {
        let ratio = (value as f64 / max as f64).clamp(0.0, 1.0);
        self.bottom - (ratio * self.height() as f64).round() as u32
    }
}

/// Y axis range: `ticks` intervals of `step`, covering the tallest bar.
///
/// Held in `i128` so the rounded-up range of an `i64::MAX` total still fits.
#[derive(Debug, PartialEq, Eq)]
struct YAxis {
    step: i128,
    ticks: u32,
}

impl YAxis {
    fn fit(max_total: i64) -> Self {
        let max_total = i128::from(max_total);
        let step = nice_step(max_total as f64 / 5.0);
        let ticks = ((max_total + step - 1) / step).max(1) as u32;
        Self { step, ticks }
    }

    fn value(&self, tick: u32) -> i128 {
        self.step * i128::from(tick)
    }

    fn max(&self) -> i128 {
        self.value(self.ticks)
    }
}

/// Rounds `raw` up to 1, 2 or 5 times a power of ten, at least 1.
fn nice_step(raw: f64) -> i128 {
    if raw <= 1.0 {
        return 1;
    }
    let base = 10i128.pow(raw.log10().floor() as u32);
    let fraction = raw / base as f64;
    let nice = if fraction <= 1.0 {
        1
    } else if fraction <= 2.0 {
        2
    } else if fraction <= 5.0 {
        5
    } else {
        10
    };
    nice * base
}

struct Canvas {
    img: RgbImage,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbImage::from_pixel(width, height, BACKGROUND),
        }
    }

    fn fill(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        let x_end = x.saturating_add(w).min(self.img.width());
        let y_end = y.saturating_add(h).min(self.img.height());
        for py in y..y_end {
            for px in x..x_end {
                self.img.put_pixel(px, py, color);
            }
        }
    }

    fn plot(&mut self, x: f32, y: f32) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x.round() as u32, y.round() as u32);
        if x < self.img.width() && y < self.img.height() {
            self.img.put_pixel(x, y, INK);
        }
    }

    /// Draws `text` with its top-left corner at `origin`, the baseline turned
    /// `angle` degrees counter-clockwise.
    fn text(&mut self, text: &str, origin: (f32, f32), scale: u32, angle: f32) {
        let (sin, cos) = angle.to_radians().sin_cos();
        // along the baseline, and down the glyph, in screen coordinates
        let along = (cos, -sin);
        let down = (sin, cos);
        let scale = scale as f32;

        for (i, c) in text.chars().enumerate() {
            let rows = glyphs::glyph(c);
            let offset = (i as u32 * glyphs::ADVANCE) as f32;
            for (gy, bits) in rows.iter().enumerate() {
                for gx in 0..glyphs::GLYPH_WIDTH {
                    if bits & (0x10 >> gx) == 0 {
                        continue;
                    }
                    // half-pixel sampling leaves no holes when rotated
                    let steps = (scale * 2.0) as u32;
                    for a in 0..steps {
                        for b in 0..steps {
                            let u = (offset + gx as f32) * scale + a as f32 * 0.5;
                            let v = gy as f32 * scale + b as f32 * 0.5;
                            self.plot(
                                origin.0 + along.0 * u + down.0 * v,
                                origin.1 + along.1 * u + down.1 * v,
                            );
                        }
                    }
                }
            }
        }
    }

    /// Draws `text` so that its baseline ends at `anchor`.
    fn text_ending_at(&mut self, text: &str, anchor: (f32, f32), scale: u32, angle: f32) {
        let (sin, cos) = angle.to_radians().sin_cos();
        let length = (glyphs::text_width(text) * scale) as f32;
        let origin = (anchor.0 - cos * length, anchor.1 + sin * length);
        self.text(text, origin, scale, angle);
    }
}
