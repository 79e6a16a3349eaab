use std::fs;
use std::io::Cursor;
use std::path::Path;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::*;
use crate::drivers::axis::time_label;
use crate::drivers::buffer::PlotFrame;
use crate::drivers::error::PlotError;
use crate::drivers::view::split_trace;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub signal: RGBColor,
    pub derivative: RGBColor,
    pub signal_tail: RGBColor,
    pub derivative_tail: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 700,
            background: WHITE,
            signal: BLUE,
            derivative: RGBColor(128, 0, 128),
            signal_tail: RED,
            derivative_tail: GREEN,
        }
    }
}
struct Panel<'a> {
    caption: &'a str,
    y_desc: &'a str,
    y: &'a [f64],
    bounds: (f64, f64),
    line: RGBColor,
    tail: RGBColor,
}
/// Renders the signal and derivative panels of a frame to PNG bytes.
pub fn render_frame_png(frame: &PlotFrame, style: &PlotStyle) -> Result<Vec<u8>, PlotError> {
    if frame.is_empty() {
        return Err(PlotError::EmptyFrame);
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let (upper, lower) = root.split_vertically(style.height / 2);
        draw_panel(
            &upper,
            frame,
            &Panel {
                caption: "Endpoint Signal vs. Time",
                y_desc: "Signal (V)",
                y: &frame.signal,
                bounds: frame.signal_bounds,
                line: style.signal,
                tail: style.signal_tail,
            },
        )?;
        draw_panel(
            &lower,
            frame,
            &Panel {
                caption: "Derivative",
                y_desc: "Derivative (V)",
                y: &frame.derivative,
                bounds: frame.derivative_bounds,
                line: style.derivative,
                tail: style.derivative_tail,
            },
        )?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    frame: &PlotFrame,
    panel: &Panel<'_>,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let x_max = frame.x_max.max(1.0);
    let (y_min, y_max) = if panel.bounds.1 > panel.bounds.0 {
        panel.bounds
    } else {
        (panel.bounds.0 - 1.0, panel.bounds.0 + 1.0)
    };
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(panel.caption, ("sans-serif", 18).into_font())
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 35)
        .build_cartesian_2d(0f64..x_max, y_min..y_max)?;
    let label_x_max = frame.x_max;
    chart
        .configure_mesh()
        .x_labels(frame.ticks.len().max(2))
        .x_desc("Time (s)")
        .y_desc(panel.y_desc)
        .x_label_formatter(&|x: &f64| time_label(*x, label_x_max))
        .light_line_style(&BLACK.mix(0.05))
        .draw()?;
    let segments = split_trace(&frame.x, panel.y);
    chart.draw_series(LineSeries::new(
        segments.body.iter().map(|p| (p[0], p[1])),
        &panel.line,
    ))?;
    chart.draw_series(LineSeries::new(
        segments.tail.iter().map(|p| (p[0], p[1])),
        panel.tail.stroke_width(2),
    ))?;
    if let Some([x, y]) = segments.head {
        chart.draw_series(std::iter::once(Circle::new((x, y), 4, panel.tail.filled())))?;
    }
    Ok(())
}
/// Renders a frame and writes it to `path` as PNG.
pub fn save_frame_png(frame: &PlotFrame, style: &PlotStyle, path: &Path) -> Result<(), PlotError> {
    let png = render_frame_png(frame, style)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, png)?;
    Ok(())
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PlotError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| PlotError::Render("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
