use std::{ops::Range, path::PathBuf};

use plotters::{
    backend::BitMapBackend,
    chart::{ChartBuilder, SeriesLabelPosition},
    coord::{ranged1d::Ranged, types::RangedCoordf64, Shift},
    drawing::DrawingArea,
    element::{Circle, PathElement},
    series::LineSeries,
    style::{Color, IntoFont, RGBColor, BLACK, WHITE},
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    dataset::Dataset,
    error::{Error, Result},
    format::Formatter,
    utils::round_significant,
};

mod drawable;

pub use drawable::{DrawableChart, FIGURE_SIZE};

/// Upper bound on ticks per axis.
pub const MAX_TICKS: usize = 10;

/// Fraction of the data span added on each side of an axis.
const AXIS_PADDING: f64 = 0.05;

/// matplotlib's default color cycle
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Everything one render call needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartSpec {
    /// column whose values split the rows into lines
    pub group: String,
    pub x: String,
    pub y: String,
    pub output: PathBuf,
    #[serde(default)]
    pub title: String,
    /// defaults to the x column name
    #[serde(default)]
    pub x_label: Option<String>,
    /// defaults to the y column name
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default)]
    pub x_format: Formatter,
    #[serde(default)]
    pub y_format: Formatter,
}

impl ChartSpec {
    pub fn new(
        group: impl Into<String>,
        x: impl Into<String>,
        y: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            group: group.into(),
            x: x.into(),
            y: y.into(),
            output: output.into(),
            title: String::new(),
            x_label: None,
            y_label: None,
            x_format: Formatter::AsIs,
            y_format: Formatter::AsIs,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = Some(x_label.into());
        self.y_label = Some(y_label.into());
        self
    }

    pub fn with_formatters(mut self, x_format: Formatter, y_format: Formatter) -> Self {
        self.x_format = x_format;
        self.y_format = y_format;
        self
    }

    pub fn x_desc(&self) -> &str {
        self.x_label.as_deref().unwrap_or(&self.x)
    }

    pub fn y_desc(&self) -> &str {
        self.y_label.as_deref().unwrap_or(&self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

/// One line of the chart. Points keep the row order of their group, a point with a
/// missing coordinate breaks the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn plotted(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied().filter(|p| is_plotted(*p))
    }

    fn segments(&self) -> impl Iterator<Item = &[(f64, f64)]> {
        self.points
            .split(|p| !is_plotted(*p))
            .filter(|s| !s.is_empty())
    }
}

fn is_plotted((x, y): (f64, f64)) -> bool {
    x.is_finite() && y.is_finite()
}

/// Structure of a chart: what gets drawn, and what a render call hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    /// legend order
    pub series: Vec<Series>,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
}

impl RenderedChart {
    /// Validates `spec` against `dataset` and lays the chart out without drawing it.
    pub fn plan(dataset: &Dataset, spec: &ChartSpec) -> Result<Self> {
        for column in [&spec.group, &spec.x, &spec.y] {
            dataset.column_index(column)?;
        }
        spec.x_format.validate()?;
        spec.y_format.validate()?;
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let groups = dataset.group_by(&spec.group)?;
        if groups.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let xs = dataset.numeric_column(&spec.x)?;
        let ys = dataset.numeric_column(&spec.y)?;
        let series: Vec<Series> = groups
            .into_iter()
            .map(|g| Series {
                points: g.rows.iter().map(|&row| (xs[row], ys[row])).collect(),
                label: g.label,
            })
            .collect();

        let x_range = axis_range(&spec.x, series.iter().flat_map(|s| s.plotted().map(|p| p.0)))?;
        let y_range = axis_range(&spec.y, series.iter().flat_map(|s| s.plotted().map(|p| p.1)))?;
        Ok(Self {
            title: spec.title.clone(),
            x_desc: spec.x_desc().to_owned(),
            y_desc: spec.y_desc().to_owned(),
            x_ticks: ticks(&x_range, &spec.x_format),
            y_ticks: ticks(&y_range, &spec.y_format),
            series,
            x_range,
            y_range,
        })
    }

    pub fn line_count(&self) -> usize {
        self.series.len()
    }

    pub fn legend(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.label.as_str()).collect()
    }
}

/// Data span with padding on both sides; a single value gets a window of at least one
/// unit. Falls back to the bare span when padding would overflow.
fn axis_range(column: &str, values: impl Iterator<Item = f64>) -> Result<Range<f64>> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    });
    if min > max {
        return Ok(0.0..1.0);
    }
    let pad = if min == max {
        (min.abs() * AXIS_PADDING).max(0.5)
    } else {
        (max - min) * AXIS_PADDING
    };
    let spans = |r: &Range<f64>| {
        let width = r.end - r.start;
        width.is_finite() && width > 0.
    };
    let padded = min - pad..max + pad;
    if spans(&padded) {
        return Ok(padded);
    }
    let bare = min..max;
    if spans(&bare) {
        return Ok(bare);
    }
    Err(Error::AxisOverflow(column.to_owned()))
}

fn ticks(range: &Range<f64>, formatter: &Formatter) -> Vec<Tick> {
    let mut ticks: Vec<Tick> = RangedCoordf64::from(range.clone())
        .key_points(MAX_TICKS)
        .into_iter()
        .map(round_significant)
        .filter(|v| range.contains(v))
        .map(|value| Tick {
            value,
            label: formatter.format(value),
        })
        .collect();
    // tiny spans round several key points onto one value
    ticks.dedup_by(|a, b| a.value == b.value);
    ticks
}

/// Label the mesh draws for a raw key point, matching the rounded tick values.
fn axis_label(ticks: &[Tick], value: f64) -> String {
    let value = round_significant(value);
    ticks
        .iter()
        .find(|t| t.value == value)
        .map(|t| t.label.clone())
        .unwrap_or_else(|| value.to_string())
}

fn series_color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

impl DrawableChart for RenderedChart {
    fn define_chart(
        &self,
        root: &DrawingArea<BitMapBackend, Shift>,
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut builder = ChartBuilder::on(root);
        builder
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70);
        if !self.title.is_empty() {
            builder.caption(&self.title, ("sans-serif", 28).into_font());
        }
        let mut chart =
            builder.build_cartesian_2d(self.x_range.clone(), self.y_range.clone())?;

        let x_label = |v: &f64| axis_label(&self.x_ticks, *v);
        let y_label = |v: &f64| axis_label(&self.y_ticks, *v);
        chart
            .configure_mesh()
            .x_labels(MAX_TICKS)
            .y_labels(MAX_TICKS)
            .label_style(("sans-serif", 15))
            .x_desc(self.x_desc.as_str())
            .y_desc(self.y_desc.as_str())
            .x_label_formatter(&x_label)
            .y_label_formatter(&y_label)
            .draw()?;

        for (idx, series) in self.series.iter().enumerate() {
            let color = series_color(idx);
            let mut segments = series.segments();
            // the first segment carries the legend entry, even when the group has no points
            let first = segments.next().unwrap_or(&[]);
            chart
                .draw_series(LineSeries::new(first.iter().copied(), color.stroke_width(2)))?
                .label(series.label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            for segment in segments {
                chart.draw_series(LineSeries::new(
                    segment.iter().copied(),
                    color.stroke_width(2),
                ))?;
            }
            chart.draw_series(series.plotted().map(|p| Circle::new(p, 4, color.filled())))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        Ok(())
    }
}

/// One render call: lay out, draw, save.
#[instrument(name = "chart", skip_all, fields(output = %spec.output.display()))]
pub fn render(dataset: &Dataset, spec: &ChartSpec) -> Result<RenderedChart> {
    let chart = RenderedChart::plan(dataset, spec)?;
    chart.draw(&spec.output)?;
    Ok(chart)
}
