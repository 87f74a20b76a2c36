//! Sensor bar chart: three single-bar panels (temperature, pressure,
//! vibration) rendered with `plotters` into an in-memory RGB raster.
//!
//! Text needs a TTF registered through `install_font`; the service installs
//! the report font at startup. Without it panels are drawn untitled.

use std::io::Cursor;
use std::sync::OnceLock;

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use plotters::prelude::*;
use plotters::style::FontStyle;
use thiserror::Error;

use crate::wells::SensorRecord;

pub const CHART_WIDTH: u32 = 1500;
pub const CHART_HEIGHT: u32 = 400;

const FONT_FAMILY: &str = "scada-sans";
const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);

static FONT_INSTALLED: OnceLock<()> = OnceLock::new();

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("Chart font rejected: {0}")]
    Font(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Register the TTF used for panel titles and axis labels.
///
/// Plotters keeps registered fonts for the life of the process, so the
/// bytes are leaked once. Later calls are no-ops.
pub fn install_font(bytes: Vec<u8>) -> Result<(), ChartError> {
    if FONT_INSTALLED.get().is_some() {
        return Ok(());
    }
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| ChartError::Font("invalid font data".into()))?;
    let _ = FONT_INSTALLED.set(());
    tracing::debug!("Chart font installed");
    Ok(())
}

fn font_installed() -> bool {
    FONT_INSTALLED.get().is_some()
}

/// One panel of the figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: &'static str,
    pub value: f64,
}

/// The fixed three panels for a record.
pub fn panels_for(record: &SensorRecord) -> [Panel; 3] {
    [
        Panel {
            title: "Temperature (°F)",
            value: record.temperature,
        },
        Panel {
            title: "Pressure (PSI)",
            value: record.pressure,
        },
        Panel {
            title: "Vibration (Hz)",
            value: record.vibration,
        },
    ]
}

/// Y axis range always containing zero, with 10% headroom.
fn value_range(value: f64) -> std::ops::Range<f64> {
    if !value.is_finite() || value == 0.0 {
        return 0.0..1.0;
    }
    let low = value.min(0.0) * 1.1;
    let high = value.max(0.0) * 1.1;
    low..high
}

/// Rendered chart raster.
#[derive(Debug, Clone)]
pub struct ChartImage {
    raster: RgbImage,
}

impl ChartImage {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn raster(&self) -> &RgbImage {
        &self.raster
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.raster.clone())
    }

    pub fn to_png(&self) -> Result<Vec<u8>, ChartError> {
        let mut buf = Vec::new();
        self.to_dynamic()
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)?;
        Ok(buf)
    }
}

/// Render the 1×3 bar figure for `record`.
pub fn render_sensor_chart(record: &SensorRecord) -> Result<ChartImage, ChartError> {
    render(record, font_installed())
}

fn render(record: &SensorRecord, titled: bool) -> Result<ChartImage, ChartError> {
    let panels = panels_for(record);
    let mut buf = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];

    draw_panels(&mut buf, &panels, titled).map_err(|e| ChartError::Render(e.to_string()))?;

    let raster = RgbImage::from_raw(CHART_WIDTH, CHART_HEIGHT, buf)
        .ok_or_else(|| ChartError::Render("raster buffer size mismatch".into()))?;
    Ok(ChartImage { raster })
}

fn draw_panels(
    buf: &mut [u8],
    panels: &[Panel; 3],
    titled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::with_buffer(buf, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    for (area, panel) in root.split_evenly((1, 3)).iter().zip(panels.iter()) {
        let mut builder = ChartBuilder::on(area);
        builder.margin(15).y_label_area_size(if titled { 60 } else { 0 });
        if titled {
            builder.caption(panel.title, (FONT_FAMILY, 22));
        }
        let mut chart = builder.build_cartesian_2d(0f64..1f64, value_range(panel.value))?;

        if titled {
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_x_axis()
                .label_style((FONT_FAMILY, 14))
                .draw()?;
        }

        // A missing reading leaves the panel empty.
        if panel.value.is_finite() {
            chart.draw_series(std::iter::once(Rectangle::new(
                [(0.25, 0.0), (0.75, panel.value)],
                BAR_COLOR.filled(),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}
