//! Diagnostic histogram figures
//!
//! A figure is the searched histogram plus vertical markers at the candidate
//! thresholds. Rendering goes through [`DiagnosticPlotSink`]; the bundled
//! [`TiffHistogramSink`] (feature `plot`) rasterizes it to an RGB TIFF.

use crate::change::measure::ThresholdDirection;
use crate::change::search::{SearchReport, ThresholdPair};
use ratchange_core::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a variable's diagnostic figure goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotTarget {
    pub path: PathBuf,
    /// Draw all three candidate pairs instead of the selected one
    #[serde(default)]
    pub show_all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerColor {
    Yellow,
    Red,
    Green,
    Black,
}

impl MarkerColor {
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            MarkerColor::Yellow => [230, 200, 0],
            MarkerColor::Red => [220, 30, 30],
            MarkerColor::Green => [20, 160, 40],
            MarkerColor::Black => [0, 0, 0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdMarker {
    pub label: String,
    pub value: f64,
    pub color: MarkerColor,
}

/// Histogram with threshold markers, ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramFigure {
    pub title: String,
    pub centers: Vec<f64>,
    pub counts: Vec<u64>,
    pub bin_width: f64,
    pub markers: Vec<ThresholdMarker>,
    pub path: PathBuf,
}

impl HistogramFigure {
    /// Figure for a finished search.
    ///
    /// Only searched bounds get markers: the fixed bound of a one-sided
    /// search is the sample extreme and is not drawn.
    pub fn from_report(title: impl Into<String>, report: &SearchReport, target: &PlotTarget) -> Self {
        let direction = report.candidates.direction;
        let mut markers = Vec::new();
        let mut push = |name: &str, pair: ThresholdPair, color| {
            if direction != ThresholdDirection::Upper {
                markers.push(ThresholdMarker {
                    label: format!("{} lower", name),
                    value: pair.lower,
                    color,
                });
            }
            if direction != ThresholdDirection::Lower {
                markers.push(ThresholdMarker {
                    label: format!("{} upper", name),
                    value: pair.upper,
                    color,
                });
            }
        };

        if target.show_all {
            push("kurtosis", report.candidates.kurtosis, MarkerColor::Yellow);
            push("skewness", report.candidates.skewness, MarkerColor::Red);
            push("combined", report.candidates.combined, MarkerColor::Green);
        } else {
            push(report.measure.as_str(), report.thresholds, MarkerColor::Red);
        }

        Self {
            title: title.into(),
            centers: report.histogram.centers(),
            counts: report.histogram.counts.clone(),
            bin_width: report.histogram.bin_width,
            markers,
            path: target.path.clone(),
        }
    }

    /// Value range covered by the bins
    pub fn x_range(&self) -> (f64, f64) {
        let half = self.bin_width / 2.0;
        match (self.centers.first(), self.centers.last()) {
            (Some(&first), Some(&last)) => (first - half, last + half),
            _ => (0.0, 1.0),
        }
    }
}

/// Renders diagnostic figures
pub trait DiagnosticPlotSink {
    fn render(&self, figure: &HistogramFigure) -> Result<()>;
}

#[cfg(feature = "plot")]
pub use tiff_sink::TiffHistogramSink;

#[cfg(feature = "plot")]
mod tiff_sink {
    use super::{DiagnosticPlotSink, HistogramFigure};
    use ratchange_core::{Error, Result};
    use std::fs::File;
    use std::io::BufWriter;
    use tiff::encoder::colortype::RGB8;
    use tiff::encoder::TiffEncoder;
    use tracing::info;

    const BACKGROUND: [u8; 3] = [255, 255, 255];
    const BAR: [u8; 3] = [70, 110, 170];
    const AXIS: [u8; 3] = [0, 0, 0];

    /// Writes figures as RGB TIFF images to the figure path
    #[derive(Debug, Clone)]
    pub struct TiffHistogramSink {
        pub width: u32,
        pub height: u32,
        /// Blank border around the plot area, in pixels
        pub margin: u32,
    }

    impl Default for TiffHistogramSink {
        fn default() -> Self {
            Self {
                width: 800,
                height: 480,
                margin: 20,
            }
        }
    }

    impl TiffHistogramSink {
        /// Rasterize a figure to interleaved RGB bytes, row 0 at the top
        pub fn rasterize(&self, figure: &HistogramFigure) -> Vec<u8> {
            let (w, h) = (self.width as usize, self.height as usize);
            let mut pixels = vec![0u8; w * h * 3];
            for px in pixels.chunks_exact_mut(3) {
                px.copy_from_slice(&BACKGROUND);
            }

            let m = (self.margin as usize).min(w / 4).min(h / 4);
            let (x0, x1) = (m, w - m);
            let (y_top, y_base) = (m, h - m);
            let plot_w = (x1 - x0).max(1) as f64;
            let plot_h = (y_base - y_top).max(1) as f64;

            let mut put = |x: usize, y: usize, rgb: [u8; 3]| {
                if x < w && y < h {
                    let i = (y * w + x) * 3;
                    pixels[i..i + 3].copy_from_slice(&rgb);
                }
            };

            let (lo, hi) = figure.x_range();
            let span = (hi - lo).max(f64::MIN_POSITIVE);
            let to_x = |v: f64| x0 as f64 + (v - lo) / span * plot_w;
            let max_count = figure.counts.iter().copied().max().unwrap_or(0).max(1) as f64;

            for (&center, &count) in figure.centers.iter().zip(&figure.counts) {
                if count == 0 {
                    continue;
                }
                let left = to_x(center - figure.bin_width / 2.0).floor() as usize;
                let right = (to_x(center + figure.bin_width / 2.0).ceil() as usize).max(left + 1);
                let bar_h = (count as f64 / max_count * plot_h).round().max(1.0) as usize;
                for x in left..right.min(x1) {
                    for y in (y_base - bar_h)..y_base {
                        put(x, y, BAR);
                    }
                }
            }

            for x in x0..x1 {
                put(x, y_base, AXIS);
            }

            for marker in &figure.markers {
                if !(marker.value >= lo && marker.value <= hi) {
                    continue;
                }
                let x = to_x(marker.value).round() as usize;
                for y in y_top..=y_base {
                    put(x, y, marker.color.rgb());
                }
            }

            pixels
        }
    }

    impl DiagnosticPlotSink for TiffHistogramSink {
        fn render(&self, figure: &HistogramFigure) -> Result<()> {
            let pixels = self.rasterize(figure);
            let file = File::create(&figure.path)?;
            let mut encoder = TiffEncoder::new(BufWriter::new(file))
                .map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;
            encoder
                .write_image::<RGB8>(self.width, self.height, &pixels)
                .map_err(|e| Error::Other(format!("Cannot write TIFF image: {}", e)))?;
            info!("Wrote histogram '{}' to {}", figure.title, figure.path.display());
            Ok(())
        }
    }
}
