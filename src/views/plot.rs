use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb as ImageRgb};
use plotters::prelude::*;

use crate::palette::{DensityColorMap, Palette, Rgb};
use crate::views::error::ViewerError;
use crate::views::{finite_min_max, ContinuousFrame, DensityFrame, PolarFrame, XorFrame};

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub foreground: RGBColor,
    pub accent: RGBColor,
    /// Captions and legends need a system font; headless callers can turn them off.
    pub show_text: bool,
}

impl PlotStyle {
    pub fn from_palette(palette: &Palette) -> Self {
        Self {
            background: rgb(palette.background),
            foreground: rgb(palette.foreground),
            accent: rgb(palette.accent),
            ..Self::default()
        }
    }
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(10, 10, 10),
            foreground: WHITE,
            accent: YELLOW,
            show_text: true,
        }
    }
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

pub fn render_continuous_png(
    frame: &ContinuousFrame,
    style: &PlotStyle,
) -> Result<Vec<u8>, ViewerError> {
    if frame.bands.is_empty() {
        return Err(ViewerError::Plot("continuous frame has no channels".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.show_text {
            builder
                .caption("Continuous", ("sans-serif", 20).into_font().color(&style.foreground))
                .set_label_area_size(LabelAreaPosition::Left, 45)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(0f64..frame.viewport_seconds, 0f64..1f64)?;
        if style.show_text {
            chart
                .configure_mesh()
                .light_line_style(&style.foreground.mix(0.1))
                .draw()?;
        }
        for band in &frame.bands {
            let color = rgb(band.color);
            let series = band.points.iter().map(|p| (p[0], p[1]));
            let drawn = chart.draw_series(LineSeries::new(series, &color))?;
            if style.show_text {
                drawn
                    .label(band.label.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
            }
        }
        // Sweep marker at the newest sample.
        chart.draw_series(LineSeries::new(
            vec![(frame.sweep_x, 0.0), (frame.sweep_x, 1.0)],
            style.accent.stroke_width(2),
        ))?;
        if style.show_text {
            chart
                .configure_series_labels()
                .border_style(&style.foreground.mix(0.2))
                .background_style(&style.background)
                .draw()?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

pub fn render_xor_png(frame: &XorFrame, style: &PlotStyle) -> Result<Vec<u8>, ViewerError> {
    if frame.difference.is_empty() {
        return Err(ViewerError::Plot("comparison has no samples".into()));
    }
    let all: Vec<f64> = frame
        .first
        .iter()
        .chain(&frame.second)
        .chain(&frame.difference)
        .copied()
        .collect();
    let (lo, hi) = finite_min_max(&all).unwrap_or((0.0, 1.0));
    let (lo, hi) = if (hi - lo).abs() < f64::EPSILON {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    };
    let span = frame.difference.len() as f64 / frame.sample_rate_hz;
    let to_series = |values: &[f64]| -> Vec<(f64, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64 / frame.sample_rate_hz, *v))
            .collect()
    };
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.show_text {
            builder
                .caption(
                    format!("{} | {}", frame.label, frame.comparison_label),
                    ("sans-serif", 20).into_font().color(&style.foreground),
                )
                .set_label_area_size(LabelAreaPosition::Left, 45)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(0f64..span, lo..hi)?;
        if style.show_text {
            chart
                .configure_mesh()
                .light_line_style(&style.foreground.mix(0.1))
                .draw()?;
        }
        let faded = style.foreground.mix(0.35);
        chart.draw_series(LineSeries::new(to_series(&frame.first), &faded))?;
        chart.draw_series(LineSeries::new(to_series(&frame.second), &faded))?;
        chart.draw_series(LineSeries::new(
            to_series(&frame.difference),
            style.accent.stroke_width(2),
        ))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

pub fn render_polar_png(frame: &PolarFrame, style: &PlotStyle) -> Result<Vec<u8>, ViewerError> {
    if frame.traces.is_empty() {
        return Err(ViewerError::Plot("polar frame has no traces".into()));
    }
    let side = style.width.min(style.height);
    let mut buffer = vec![0u8; (side * side * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (side, side)).into_drawing_area();
        root.fill(&style.background)?;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.show_text {
            builder.caption(
                frame.mode.label(),
                ("sans-serif", 20).into_font().color(&style.foreground),
            );
        }
        let mut chart = builder.build_cartesian_2d(-1.1f64..1.1f64, -1.1f64..1.1f64)?;
        let grid = style.foreground.mix(0.15);
        for radius in [0.25, 0.5, 0.75, 1.0] {
            let ring = (0..=128).map(move |i| {
                let theta = i as f64 / 128.0 * std::f64::consts::TAU;
                (radius * theta.cos(), radius * theta.sin())
            });
            chart.draw_series(LineSeries::new(ring, &grid))?;
        }
        for trace in &frame.traces {
            let color = rgb(trace.color);
            let split = trace.highlight_start.min(trace.points.len());
            if split > 0 {
                let faded = color.mix(0.3);
                let history = trace.points[..=split.min(trace.points.len() - 1)]
                    .iter()
                    .map(|p| (p.x, p.y));
                chart.draw_series(LineSeries::new(history, &faded))?;
            }
            let recent = trace.points[split..].iter().map(|p| (p.x, p.y));
            chart.draw_series(LineSeries::new(recent, color.stroke_width(2)))?;
        }
        root.present()?;
    }
    encode_png(&buffer, side, side)
}

pub fn render_density_png(
    frame: &DensityFrame,
    colors: &DensityColorMap,
    style: &PlotStyle,
) -> Result<Vec<u8>, ViewerError> {
    let size = frame.grid.size();
    let side = style.width.min(style.height);
    let mut buffer = vec![0u8; (side * side * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (side, side)).into_drawing_area();
        root.fill(&style.background)?;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.show_text {
            builder.caption(
                format!("{} vs {}", frame.y_label, frame.x_label),
                ("sans-serif", 20).into_font().color(&style.foreground),
            );
        }
        let mut chart = builder.build_cartesian_2d(0f64..size as f64, 0f64..size as f64)?;
        let cells = frame
            .grid
            .counts()
            .indexed_iter()
            .filter_map(|((row, col), &count)| {
                colors.color(count, frame.normalizer).map(|c| {
                    Rectangle::new(
                        [(col as f64, row as f64), (col as f64 + 1.0, row as f64 + 1.0)],
                        rgb(c).filled(),
                    )
                })
            });
        chart.draw_series(cells)?;
        root.present()?;
    }
    encode_png(&buffer, side, side)
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ViewerError> {
    let image = ImageBuffer::<ImageRgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ViewerError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeWindow;
    use crate::palette::DensityScale;
    use crate::recording::Recording;
    use crate::types::SignalKind;
    use crate::views::{ContinuousView, PolarMode, PolarView, RecurrenceView, XorView};

    fn headless() -> PlotStyle {
        PlotStyle {
            width: 320,
            height: 200,
            show_text: false,
            ..PlotStyle::default()
        }
    }

    fn recording() -> Recording {
        let x: Vec<f64> = (0..2_000).map(|i| (i as f64 * 0.05).sin()).collect();
        let y: Vec<f64> = (0..2_000).map(|i| (i as f64 * 0.07).cos()).collect();
        Recording::new(
            vec![("ch1".into(), x), ("ch2".into(), y)],
            100.0,
            SignalKind::Eeg,
        )
        .unwrap()
    }

    #[test]
    fn every_view_renders_to_png() {
        let rec = recording();
        let palette = Palette::for_kind(SignalKind::Eeg);
        let selected = vec!["ch1".to_owned(), "ch2".to_owned()];
        let style = headless();

        let mut continuous = ContinuousView::new(TimeWindow::default(), 1.0);
        continuous.advance(&rec, &selected, 3.0);
        let frame = continuous.snapshot(&rec, &selected, palette);
        assert!(!render_continuous_png(frame.ready().unwrap(), &style).unwrap().is_empty());

        let mut xor = XorView::new(1.0);
        xor.update(&rec, Some("ch1"), 5.0);
        let frame = xor.frame(&rec, Some("ch1"), 5.0, true);
        assert!(!render_xor_png(frame.ready().unwrap(), &style).unwrap().is_empty());

        let mut polar = PolarView::new(TimeWindow::default(), 500);
        polar.set_mode(PolarMode::Cumulative);
        let frame = polar.frame(&rec, &selected, 12.0, palette);
        assert!(!render_polar_png(frame.ready().unwrap(), &style).unwrap().is_empty());

        let mut recurrence = RecurrenceView::new(false);
        recurrence.update(&rec, Some(("ch1", "ch2")), 0.0, rec.duration());
        let frame = recurrence.frame(&rec, Some(("ch1", "ch2")), 0.0, false);
        let colors = DensityColorMap::new(palette, DensityScale::Log);
        let png = render_density_png(frame.ready().unwrap(), &colors, &style).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
