//! Chart rendering shared by every plotting command.
//!
//! Commands describe a chart as a [`ChartSpec`] (plain data, testable
//! without a backend) and hand it to [`draw_chart`], which picks the axis
//! scales and draws onto any plotters drawing area.

pub mod benchmark;
pub mod convergence;
pub mod histogram;
pub mod normalized;
pub mod polynomial;
pub mod trajectory;

use std::ops::Range;
use std::path::Path;

use anyhow::{Context, Result, bail};
use plotters::coord::Shift;
use plotters::coord::ranged1d::{Ranged, ValueFormatter};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

pub const CHART_SIZE: (u32, u32) = (1200, 800);
pub const GRID_SIZE: (u32, u32) = (1500, 1200);

const FONT: &str = "sans-serif";
/// Dash length and gap, in pixels.
const DASH: (i32, i32) = (10, 6);

// ---------------------------------------------------------------------------
// Chart description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    #[default]
    Linear,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stroke {
    #[default]
    Solid,
    Dashed,
}

/// A polyline in data coordinates.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
    pub stroke: Stroke,
    pub markers: bool,
}

impl Series {
    pub fn line(label: impl Into<String>, points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self {
            label: Some(label.into()),
            points,
            color,
            stroke: Stroke::Solid,
            markers: false,
        }
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }

    pub fn dashed(mut self) -> Self {
        self.stroke = Stroke::Dashed;
        self
    }
}

/// A single highlighted point, e.g. the start of a trajectory.
#[derive(Debug, Clone)]
pub struct Marker {
    pub label: String,
    pub point: (f64, f64),
    pub color: RGBColor,
}

/// A reference line spanning the whole plot.
#[derive(Debug, Clone)]
pub struct Guide {
    pub label: Option<String>,
    pub orientation: Orientation,
    pub color: RGBColor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    Horizontal(f64),
    Vertical(f64),
}

/// One histogram bar: `[left, right) × [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub left: f64,
    pub right: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ChartSpec {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub x_scale: Scale,
    pub y_scale: Scale,
    /// Same data units per pixel on both axes.
    pub equal_aspect: bool,
    pub legend_upper_left: bool,
    pub series: Vec<Series>,
    pub markers: Vec<Marker>,
    pub guides: Vec<Guide>,
    pub bars: Vec<Bar>,
    pub bar_color: Option<RGBColor>,
}

impl ChartSpec {
    pub fn new(title: impl Into<String>, x_desc: impl Into<String>, y_desc: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_desc: x_desc.into(),
            y_desc: y_desc.into(),
            ..Default::default()
        }
    }

    /// Axis ranges covering every element, padded, restricted to positive
    /// values on log axes. `None` when nothing is drawable.
    pub fn bounds(&self) -> Option<(Range<f64>, Range<f64>)> {
        let mut xs = Vec::new();
        let mut ys = Vec::new();

        for s in &self.series {
            for &(x, y) in &s.points {
                xs.push(x);
                ys.push(y);
            }
        }
        for m in &self.markers {
            xs.push(m.point.0);
            ys.push(m.point.1);
        }
        for b in &self.bars {
            xs.extend([b.left, b.right]);
            ys.extend([0.0, b.height]);
        }
        for g in &self.guides {
            match g.orientation {
                Orientation::Horizontal(y) => ys.push(y),
                Orientation::Vertical(x) => xs.push(x),
            }
        }

        let x = axis_range(&xs, self.x_scale)?;
        let y = axis_range(&ys, self.y_scale)?;
        Some((x, y))
    }
}

fn axis_range(values: &[f64], scale: Scale) -> Option<Range<f64>> {
    let usable: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && (scale == Scale::Linear || *v > 0.0))
        .collect();
    if usable.is_empty() {
        return None;
    }
    let lo = usable.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = usable.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(match scale {
        Scale::Log => lo / 1.5..hi * 1.5,
        Scale::Linear if hi == lo => {
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
            lo - pad..hi + pad
        }
        Scale::Linear => {
            let pad = (hi - lo) * 0.05;
            lo - pad..hi + pad
        }
    })
}

/// Widen one of the ranges so both axes share a data-per-pixel ratio.
pub fn equalize(x: Range<f64>, y: Range<f64>, pixels: (u32, u32)) -> (Range<f64>, Range<f64>) {
    let (w, h) = (pixels.0.max(1) as f64, pixels.1.max(1) as f64);
    let x_span = x.end - x.start;
    let y_span = y.end - y.start;
    let per_px = (x_span / w).max(y_span / h);

    let grow = |r: Range<f64>, span: f64, target: f64| {
        let extra = (target - span) / 2.0;
        r.start - extra..r.end + extra
    };
    (
        grow(x, x_span, per_px * w),
        grow(y, y_span, per_px * h),
    )
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Draw `spec` filling `area`.
pub fn draw_chart<DB>(area: &DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let Some((x_range, y_range)) = spec.bounds() else {
        bail!("chart '{}' has nothing to draw", spec.title);
    };
    let (x_range, y_range) = if spec.equal_aspect {
        equalize(x_range, y_range, area.dim_in_pixel())
    } else {
        (x_range, y_range)
    };

    let mut builder = ChartBuilder::on(area);
    builder
        .caption(&spec.title, (FONT, 22).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(80);

    match (spec.x_scale, spec.y_scale) {
        (Scale::Linear, Scale::Linear) => {
            let mut chart = builder.build_cartesian_2d(x_range, y_range)?;
            draw_elements(&mut chart, spec)
        }
        (Scale::Linear, Scale::Log) => {
            let mut chart = builder.build_cartesian_2d(x_range, y_range.log_scale())?;
            draw_elements(&mut chart, spec)
        }
        (Scale::Log, Scale::Linear) => {
            let mut chart = builder.build_cartesian_2d(x_range.log_scale(), y_range)?;
            draw_elements(&mut chart, spec)
        }
        (Scale::Log, Scale::Log) => {
            let mut chart =
                builder.build_cartesian_2d(x_range.log_scale(), y_range.log_scale())?;
            draw_elements(&mut chart, spec)
        }
    }
}

fn draw_elements<'a, DB, X, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    spec: &ChartSpec,
) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged<ValueType = f64> + ValueFormatter<f64>,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.15))
        .x_desc(spec.x_desc.as_str())
        .y_desc(spec.y_desc.as_str())
        .label_style((FONT, 14).into_font())
        .draw()?;

    let mut labelled = false;

    if !spec.bars.is_empty() {
        let fill = spec.bar_color.unwrap_or(BLUE).mix(0.7).filled();
        chart.draw_series(spec.bars.iter().map(|b| {
            Rectangle::new([(b.left, 0.0), (b.right, b.height)], fill)
        }))?;
        chart.draw_series(spec.bars.iter().map(|b| {
            Rectangle::new([(b.left, 0.0), (b.right, b.height)], BLACK.stroke_width(1))
        }))?;
    }

    let x_bounds = chart.x_range();
    let y_bounds = chart.y_range();
    for guide in &spec.guides {
        let points = match guide.orientation {
            Orientation::Horizontal(y) => vec![(x_bounds.start, y), (x_bounds.end, y)],
            Orientation::Vertical(x) => vec![(x, y_bounds.start), (x, y_bounds.end)],
        };
        let style = guide.color.stroke_width(2);
        let anno = chart.draw_series(DashedLineSeries::new(points, DASH.0, DASH.1, style))?;
        if let Some(label) = &guide.label {
            labelled = true;
            anno.label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
    }

    for series in &spec.series {
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .copied()
            .filter(|&(x, y)| visible(x, spec.x_scale) && visible(y, spec.y_scale))
            .collect();
        if points.is_empty() {
            continue;
        }
        let style = series.color.stroke_width(2);

        let anno = match series.stroke {
            Stroke::Solid => chart.draw_series(LineSeries::new(points.iter().copied(), style))?,
            Stroke::Dashed => chart.draw_series(DashedLineSeries::new(
                points.iter().copied(),
                DASH.0,
                DASH.1,
                style,
            ))?,
        };
        if let Some(label) = &series.label {
            labelled = true;
            anno.label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        if series.markers {
            let fill = series.color.filled();
            chart.draw_series(points.iter().map(|&p| Circle::new(p, 4, fill)))?;
        }
    }

    for marker in &spec.markers {
        let fill = marker.color.filled();
        labelled = true;
        chart
            .draw_series(std::iter::once(Circle::new(marker.point, 8, fill)))?
            .label(marker.label.as_str())
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, fill));
    }

    if labelled {
        chart
            .configure_series_labels()
            .position(if spec.legend_upper_left {
                SeriesLabelPosition::UpperLeft
            } else {
                SeriesLabelPosition::UpperRight
            })
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font((FONT, 14).into_font())
            .draw()?;
    }
    Ok(())
}

fn visible(v: f64, scale: Scale) -> bool {
    v.is_finite() && (scale == Scale::Linear || v > 0.0)
}

// ---------------------------------------------------------------------------
// Output files
// ---------------------------------------------------------------------------

/// Create `dir` (and parents) when absent.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))
}

/// Render a PNG at `path`, overwriting any existing file.
pub fn save_png<F>(path: &Path, size: (u32, u32), draw: F) -> Result<()>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>,
{
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root).with_context(|| format!("rendering {}", path.display()))?;
    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Saved: {}", path.display());
    Ok(())
}

/// Render an SVG at `path`, overwriting any existing file.
pub fn save_svg<F>(path: &Path, size: (u32, u32), draw: F) -> Result<()>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
{
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root).with_context(|| format!("rendering {}", path.display()))?;
    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Saved: {}", path.display());
    Ok(())
}

/// Draw one chart per cell of a `rows × cols` grid under a figure title.
/// Cells past the end of `specs` stay blank.
pub fn draw_grid<DB>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    cols: usize,
    specs: &[ChartSpec],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let cols = cols.max(1);
    let rows = specs.len().div_ceil(cols).max(1);
    let body = area.titled(title, (FONT, 30).into_font())?;
    for (cell, spec) in body.split_evenly((rows, cols)).iter().zip(specs) {
        draw_chart(cell, spec)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_cover_all_elements() {
        let mut spec = ChartSpec::new("t", "x", "y");
        spec.series.push(Series::line("a", vec![(0.0, 1.0), (10.0, 3.0)], RED));
        spec.guides.push(Guide {
            label: None,
            orientation: Orientation::Horizontal(5.0),
            color: BLUE,
        });
        let (x, y) = spec.bounds().unwrap();
        assert!(x.start < 0.0 && x.end > 10.0);
        assert!(y.start < 1.0 && y.end > 5.0);
    }

    #[test]
    fn test_log_bounds_ignore_non_positive() {
        let mut spec = ChartSpec::new("t", "x", "y");
        spec.y_scale = Scale::Log;
        spec.series.push(Series::line("r", vec![(0.0, 0.0), (1.0, 1e-3), (2.0, 10.0)], RED));
        let (_, y) = spec.bounds().unwrap();
        assert!(y.start > 0.0);
        assert!(y.start < 1e-3 && y.end > 10.0);
    }

    #[test]
    fn test_empty_chart_has_no_bounds() {
        assert!(ChartSpec::new("t", "x", "y").bounds().is_none());
    }

    /// Pixels of `color` in `spec` drawn on a 400x300 canvas, or `None`
    /// when no font is available for the captions.
    fn count_pixels(spec: &ChartSpec, color: RGBColor) -> Option<usize> {
        let mut buf = vec![0u8; 400 * 300 * 3];
        {
            let area = BitMapBackend::with_buffer(&mut buf, (400, 300)).into_drawing_area();
            area.fill(&WHITE).ok()?;
            draw_chart(&area, spec).ok()?;
            area.present().ok()?;
        }
        let RGBColor(r, g, b) = color;
        Some(buf.chunks(3).filter(|px| px == &[r, g, b]).count())
    }

    #[test]
    fn test_dashed_series_leaves_gaps() {
        let color = RGBColor(10, 200, 30);
        let mut solid = ChartSpec::new("t", "x", "y");
        solid.series.push(Series {
            label: None,
            points: vec![(0.0, 0.0), (10.0, 10.0)],
            color,
            stroke: Stroke::Solid,
            markers: false,
        });
        let mut dashed = solid.clone();
        dashed.series[0].stroke = Stroke::Dashed;

        let (Some(solid), Some(dashed)) = (count_pixels(&solid, color), count_pixels(&dashed, color))
        else {
            return;
        };
        assert!(dashed > 0);
        assert!(dashed < solid);
    }

    #[test]
    fn test_equalize_matches_pixel_ratio() {
        let (x, y) = equalize(0.0..10.0, 0.0..1.0, (1000, 500));
        let x_per_px = (x.end - x.start) / 1000.0;
        let y_per_px = (y.end - y.start) / 500.0;
        assert!((x_per_px - y_per_px).abs() < 1e-12);
        assert!(x.start.abs() < 1e-9 && (x.end - 10.0).abs() < 1e-9);
        assert!(y.start < 0.0 && y.end > 1.0);
    }
}
