//! Data-driven figure descriptions rendered with Plotters.
//!
//! All series, regions and text are prepared by the analyses; the code here
//! only lays out panels and draws them, so any Plotters backend works.

use std::error::Error;
use std::f64::consts::PI;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

pub type DrawResult = Result<(), Box<dyn Error>>;

pub const TAB_BLUE: RGBColor = RGBColor(31, 119, 180);
pub const TAB_ORANGE: RGBColor = RGBColor(255, 127, 14);
pub const TAB_GREEN: RGBColor = RGBColor(44, 160, 44);
pub const TAB_RED: RGBColor = RGBColor(214, 39, 40);
pub const TAB_PURPLE: RGBColor = RGBColor(148, 103, 189);
pub const TAB_GREY: RGBColor = RGBColor(127, 127, 127);

pub const LIGHT_BLUE: RGBColor = RGBColor(173, 216, 230);
pub const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
pub const LIGHT_YELLOW: RGBColor = RGBColor(255, 255, 224);
pub const LIGHT_CORAL: RGBColor = RGBColor(240, 128, 128);
pub const WHEAT: RGBColor = RGBColor(245, 222, 179);

/// Pastel fills for phase-map regions.
const REGION_PALETTE: [RGBColor; 10] = [
    RGBColor(198, 219, 239),
    RGBColor(199, 233, 192),
    RGBColor(253, 208, 162),
    RGBColor(218, 218, 235),
    RGBColor(252, 187, 161),
    RGBColor(255, 255, 204),
    RGBColor(204, 235, 197),
    RGBColor(222, 203, 228),
    RGBColor(254, 217, 166),
    RGBColor(229, 216, 189),
];

pub fn region_color(i: usize) -> RGBColor {
    REGION_PALETTE[i % REGION_PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    /// Points only.
    Scatter,
}

#[derive(Debug, Clone)]
pub struct Series {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
    pub width: u32,
    pub style: LineStyle,
    pub markers: bool,
}

impl Series {
    pub fn line(points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Series {
            label: None,
            points,
            color,
            width: 2,
            style: LineStyle::Solid,
            markers: false,
        }
    }

    pub fn scatter(points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Series {
            style: LineStyle::Scatter,
            markers: true,
            ..Series::line(points, color)
        }
    }

    pub fn hline(y: f64, x0: f64, x1: f64, color: RGBColor) -> Self {
        Series::line(vec![(x0, y), (x1, y)], color)
    }

    pub fn vline(x: f64, y0: f64, y1: f64, color: RGBColor) -> Self {
        Series::line(vec![(x, y0), (x, y1)], color)
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn dashed(mut self) -> Self {
        self.style = LineStyle::Dashed;
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }
}

/// A filled point with an optional text label beside it.
#[derive(Debug, Clone)]
pub struct Marker {
    pub at: (f64, f64),
    pub color: RGBColor,
    pub size: u32,
    pub label: Option<String>,
}

impl Marker {
    pub fn new(at: (f64, f64), color: RGBColor) -> Self {
        Marker {
            at,
            color,
            size: 6,
            label: None,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Centered text in data coordinates.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub at: (f64, f64),
    pub text: String,
    pub size: u32,
    pub color: RGBColor,
    pub background: Option<RGBColor>,
}

impl Annotation {
    pub fn new(at: (f64, f64), text: impl Into<String>) -> Self {
        Annotation {
            at,
            text: text.into(),
            size: 14,
            color: BLACK,
            background: None,
        }
    }

    pub fn boxed(mut self, background: RGBColor) -> Self {
        self.background = Some(background);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn color(mut self, color: RGBColor) -> Self {
        self.color = color;
        self
    }
}

/// Axis-aligned filled rectangle, grouped in the legend by `label`.
#[derive(Debug, Clone)]
pub struct Region {
    pub label: String,
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub color: RGBColor,
}

#[derive(Debug, Clone)]
pub struct ChartPanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub regions: Vec<Region>,
    pub series: Vec<Series>,
    pub markers: Vec<Marker>,
    pub annotations: Vec<Annotation>,
    /// Draw mesh, ticks and axis labels.
    pub axes: bool,
    pub legend: bool,
}

impl ChartPanel {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> Self {
        ChartPanel {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            x_range,
            y_range,
            regions: Vec::new(),
            series: Vec::new(),
            markers: Vec::new(),
            annotations: Vec::new(),
            axes: true,
            legend: true,
        }
    }

    /// A chart without axes, for diagrams drawn in their own coordinates.
    pub fn bare(title: impl Into<String>, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        ChartPanel {
            axes: false,
            ..ChartPanel::new(title, "", "", x_range, y_range)
        }
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }

    pub fn without_legend(mut self) -> Self {
        self.legend = false;
        self
    }
}

#[derive(Debug, Clone)]
pub struct TextPanel {
    pub title: Option<String>,
    pub lines: Vec<String>,
    pub font_size: u32,
}

impl TextPanel {
    pub fn new(title: Option<&str>, lines: Vec<String>) -> Self {
        TextPanel {
            title: title.map(str::to_string),
            lines,
            font_size: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PiePanel {
    pub title: String,
    pub slices: Vec<(String, f64, RGBColor)>,
}

#[derive(Debug, Clone)]
pub enum Panel {
    Chart(ChartPanel),
    Text(TextPanel),
    Pie(PiePanel),
}

/// Weighted panel arrangement.
#[derive(Debug, Clone)]
pub enum Layout {
    Panel(Box<Panel>),
    Row(Vec<(u32, Layout)>),
    Column(Vec<(u32, Layout)>),
}

impl From<Panel> for Layout {
    fn from(panel: Panel) -> Self {
        Layout::Panel(Box::new(panel))
    }
}

impl From<ChartPanel> for Layout {
    fn from(panel: ChartPanel) -> Self {
        Panel::Chart(panel).into()
    }
}

impl From<TextPanel> for Layout {
    fn from(panel: TextPanel) -> Self {
        Panel::Text(panel).into()
    }
}

impl From<PiePanel> for Layout {
    fn from(panel: PiePanel) -> Self {
        Panel::Pie(panel).into()
    }
}

#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub layout: Layout,
}

impl Figure {
    pub fn new(title: impl Into<String>, size: (u32, u32), layout: impl Into<Layout>) -> Self {
        Figure {
            title: title.into(),
            width: size.0,
            height: size.1,
            layout: layout.into(),
        }
    }

    pub fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let body = if self.title.is_empty() {
            root.clone()
        } else {
            root.titled(
                &self.title,
                ("sans-serif", 26).into_font().style(FontStyle::Bold),
            )?
        };
        self.layout.draw(&body)
    }
}

impl Layout {
    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        match self {
            Layout::Panel(panel) => panel.draw(area),
            Layout::Row(children) => draw_children(area, children, true),
            Layout::Column(children) => draw_children(area, children, false),
        }
    }
}

fn draw_children<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    children: &[(u32, Layout)],
    horizontal: bool,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let weights: Vec<u32> = children.iter().map(|(w, _)| *w).collect();
    let (w, h) = area.dim_in_pixel();
    let breaks = breakpoints(&weights, if horizontal { w } else { h });

    let parts = if horizontal {
        area.split_by_breakpoints(breaks, Vec::<i32>::new())
    } else {
        area.split_by_breakpoints(Vec::<i32>::new(), breaks)
    };
    for ((_, child), part) in children.iter().zip(&parts) {
        child.draw(part)?;
    }
    Ok(())
}

/// Pixel offsets that split `extent` in proportion to `weights`.
pub fn breakpoints(weights: &[u32], extent: u32) -> Vec<i32> {
    let total: u64 = weights.iter().map(|&w| u64::from(w)).sum::<u64>().max(1);
    let mut acc = 0u64;
    weights
        .iter()
        .take(weights.len().saturating_sub(1))
        .map(|&w| {
            acc += u64::from(w);
            (u64::from(extent) * acc / total) as i32
        })
        .collect()
}

impl Panel {
    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        match self {
            Panel::Chart(chart) => draw_chart(chart, area),
            Panel::Text(text) => draw_text(text, area),
            Panel::Pie(pie) => draw_pie(pie, area),
        }
    }
}

fn draw_chart<DB: DrawingBackend>(panel: &ChartPanel, area: &DrawingArea<DB, Shift>) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let (x0, x1) = panel.x_range;
    let (y0, y1) = panel.y_range;
    let finite = x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite();
    if !finite || x1 <= x0 || y1 <= y0 {
        return Err(format!("invalid chart bounds for '{}'", panel.title).into());
    }

    let mut builder = ChartBuilder::on(area);
    builder.margin(12).caption(&panel.title, ("sans-serif", 18));
    if panel.axes {
        builder.x_label_area_size(42).y_label_area_size(64);
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    if panel.axes {
        chart
            .configure_mesh()
            .x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .light_line_style(RGBColor(238, 238, 238).stroke_width(1))
            .bold_line_style(RGBColor(210, 210, 210).stroke_width(1))
            .axis_desc_style(("sans-serif", 15))
            .label_style(("sans-serif", 13))
            .draw()?;
    }

    let mut labelled = false;

    // Regions first so lines and text stay visible.
    let mut region_labels: Vec<&str> = Vec::new();
    for r in &panel.regions {
        if !region_labels.contains(&r.label.as_str()) {
            region_labels.push(&r.label);
        }
    }
    for label in region_labels {
        let group: Vec<&Region> = panel.regions.iter().filter(|r| r.label == label).collect();
        let color = group[0].color;
        let anno = chart.draw_series(
            group
                .iter()
                .map(|r| Rectangle::new([(r.x.0, r.y.0), (r.x.1, r.y.1)], r.color.filled())),
        )?;
        if panel.legend {
            anno.label(label).legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 14, y + 5)], color.filled())
            });
            labelled = true;
        }
    }

    let span = ((x1 - x0), (y1 - y0));
    let inside = |p: &(f64, f64)| (x0..=x1).contains(&p.0) && (y0..=y1).contains(&p.1);
    for s in &panel.series {
        let style = s.color.stroke_width(s.width);
        let runs = visible_runs(&s.points, panel.x_range, panel.y_range);
        let segments: Vec<Vec<(f64, f64)>> = match s.style {
            LineStyle::Solid => runs,
            LineStyle::Dashed => runs.iter().flat_map(|run| dashes(run, span)).collect(),
            LineStyle::Scatter => Vec::new(),
        };
        let anno = chart
            .draw_series(segments.into_iter().map(|segment| PathElement::new(segment, style)))?;
        if let (Some(label), true) = (&s.label, panel.legend) {
            let color = s.color;
            let width = s.width;
            if s.style == LineStyle::Scatter {
                anno.label(label.clone())
                    .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
            } else {
                anno.label(label.clone()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width))
                });
            }
            labelled = true;
        }
        if s.markers {
            chart.draw_series(
                s.points
                    .iter()
                    .filter(|p| inside(*p))
                    .map(|&p| Circle::new(p, 4, s.color.filled())),
            )?;
        }
    }

    for m in &panel.markers {
        chart.draw_series(std::iter::once(Circle::new(m.at, m.size, m.color.filled())))?;
        if let Some(label) = &m.label {
            chart.draw_series(std::iter::once(
                EmptyElement::at(m.at)
                    + Text::new(
                        label.clone(),
                        (m.size as i32 + 4, -(m.size as i32) - 14),
                        ("sans-serif", 14).into_font().color(&BLACK),
                    ),
            ))?;
        }
    }

    for a in &panel.annotations {
        let style = ("sans-serif", a.size)
            .into_font()
            .color(&a.color)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let lines: Vec<&str> = a.text.lines().collect();
        let line_h = (a.size as f64 * 1.2) as i32;
        let top = -(line_h * (lines.len() as i32 - 1)) / 2;

        if let Some(bg) = a.background {
            let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
            let half_w = (widest as f64 * a.size as f64 * 0.30) as i32 + 6;
            let half_h = (line_h * lines.len() as i32) / 2 + 4;
            chart.draw_series(std::iter::once(
                EmptyElement::at(a.at)
                    + Rectangle::new([(-half_w, -half_h), (half_w, half_h)], bg.mix(0.8).filled()),
            ))?;
        }
        chart.draw_series(lines.iter().enumerate().map(|(i, line)| {
            let offset = (0, top + line_h * i as i32);
            EmptyElement::at(a.at) + Text::new(line.to_string(), offset, style.clone())
        }))?;
    }

    if labelled {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", 13))
            .background_style(WHITE.mix(0.85).filled())
            .border_style(BLACK.stroke_width(1))
            .draw()?;
    }

    Ok(())
}

/// Maximal runs of consecutive points inside the plot bounds.
fn visible_runs(points: &[(f64, f64)], x: (f64, f64), y: (f64, f64)) -> Vec<Vec<(f64, f64)>> {
    let inside = |p: &(f64, f64)| p.0 >= x.0 && p.0 <= x.1 && p.1 >= y.0 && p.1 <= y.1;
    let mut out = Vec::new();
    let mut current = Vec::new();
    for p in points {
        if inside(p) {
            current.push(*p);
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out.retain(|run| run.len() > 1);
    out
}

/// Split a polyline into dash segments about 1.5 % of the plot diagonal long.
fn dashes(points: &[(f64, f64)], span: (f64, f64)) -> Vec<Vec<(f64, f64)>> {
    let dash = 0.015;
    let norm = |a: (f64, f64), b: (f64, f64)| {
        (((b.0 - a.0) / span.0).powi(2) + ((b.1 - a.1) / span.1).powi(2)).sqrt()
    };

    let mut out = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut travelled = 0.0;
    let mut on = true;

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = norm(a, b);
        if length == 0.0 {
            continue;
        }
        let mut t = 0.0;
        while t < 1.0 {
            let remaining = (dash - travelled) / length;
            let t_next = (t + remaining).min(1.0);
            let p = |s: f64| (a.0 + (b.0 - a.0) * s, a.1 + (b.1 - a.1) * s);
            if on {
                if current.is_empty() {
                    current.push(p(t));
                }
                current.push(p(t_next));
            }
            travelled += (t_next - t) * length;
            t = t_next;
            if travelled >= dash - 1e-12 {
                if on && !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                on = !on;
                travelled = 0.0;
            }
        }
    }
    if current.len() > 1 {
        out.push(current);
    }
    out
}

fn draw_text<DB: DrawingBackend>(panel: &TextPanel, area: &DrawingArea<DB, Shift>) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let inner = area.margin(12, 12, 12, 12);
    inner.fill(&RGBColor(250, 248, 240))?;
    let (w, h) = inner.dim_in_pixel();
    inner.draw(&Rectangle::new(
        [(0, 0), (w as i32 - 1, h as i32 - 1)],
        TAB_GREY.stroke_width(1),
    ))?;

    let size = panel.font_size as i32;
    let mut y = 12;
    if let Some(title) = &panel.title {
        inner.draw(&Text::new(
            title.clone(),
            (12, y),
            ("sans-serif", panel.font_size + 3)
                .into_font()
                .style(FontStyle::Bold)
                .color(&BLACK),
        ))?;
        y += size + 14;
    }
    for line in &panel.lines {
        if y + size > h as i32 {
            break;
        }
        inner.draw(&Text::new(
            line.clone(),
            (12, y),
            ("sans-serif", panel.font_size).into_font().color(&BLACK),
        ))?;
        y += size + 6;
    }
    Ok(())
}

fn draw_pie<DB: DrawingBackend>(panel: &PiePanel, area: &DrawingArea<DB, Shift>) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let area = area.titled(&panel.title, ("sans-serif", 18).into_font())?;
    let total: f64 = panel.slices.iter().map(|(_, v, _)| v.max(0.0)).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let (w, h) = area.dim_in_pixel();
    let radius = f64::from(w.min(h)) * 0.32;
    let (cx, cy) = (f64::from(w) / 2.0, f64::from(h) / 2.0);
    let at = |angle: f64, r: f64| {
        (
            (cx + r * angle.cos()).round() as i32,
            (cy + r * angle.sin()).round() as i32,
        )
    };

    let mut start = -PI / 2.0;
    for (label, value, color) in &panel.slices {
        let share = value.max(0.0) / total;
        if share <= 0.0 {
            continue;
        }
        let sweep = share * 2.0 * PI;
        let steps = ((sweep / 0.02).ceil() as usize).max(2);

        let mut outline = vec![at(0.0, 0.0)];
        outline.extend((0..=steps).map(|i| at(start + sweep * i as f64 / steps as f64, radius)));
        area.draw(&Polygon::new(outline.clone(), color.filled()))?;
        area.draw(&PathElement::new(outline, WHITE.stroke_width(2)))?;

        let mid = start + sweep / 2.0;
        let centered = Pos::new(HPos::Center, VPos::Center);
        area.draw(&Text::new(
            format!("{:.1}%", share * 100.0),
            at(mid, radius * 0.6),
            ("sans-serif", 15).into_font().style(FontStyle::Bold).color(&BLACK).pos(centered),
        ))?;
        area.draw(&Text::new(
            label.clone(),
            at(mid, radius * 1.22),
            ("sans-serif", 15).into_font().color(&BLACK).pos(centered),
        ))?;

        start += sweep;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_follow_weights() {
        assert_eq!(breakpoints(&[1, 1], 100), vec![50]);
        assert_eq!(breakpoints(&[1, 2, 1], 400), vec![100, 300]);
        assert!(breakpoints(&[3], 100).is_empty());
        assert!(breakpoints(&[], 100).is_empty());
    }

    #[test]
    fn dashes_alternate_along_the_line() {
        let segs = dashes(&[(0.0, 0.0), (1.0, 0.0)], (1.0, 1.0));
        // 1.0 / 0.015 ≈ 66 pieces, half of them drawn.
        assert!((32..=35).contains(&segs.len()), "{}", segs.len());
        assert!(segs.iter().all(|s| s.len() >= 2));
        assert!(segs.windows(2).all(|w| w[0].last().unwrap().0 < w[1][0].0));
    }

    #[test]
    fn runs_break_where_the_curve_leaves_the_frame() {
        let pts = vec![(0.0, 0.5), (0.5, 0.5), (1.0, 2.0), (1.5, 0.5), (2.0, 0.5), (2.5, 0.5)];
        let runs = visible_runs(&pts, (0.0, 3.0), (0.0, 1.0));
        assert_eq!(
            runs,
            vec![vec![(0.0, 0.5), (0.5, 0.5)], vec![(1.5, 0.5), (2.0, 0.5), (2.5, 0.5)]]
        );
        // A lone visible point cannot make a line.
        assert!(visible_runs(&[(0.5, 0.5), (9.0, 9.0)], (0.0, 1.0), (0.0, 1.0)).is_empty());
    }

    #[test]
    fn builders_set_fields() {
        let s = Series::hline(1000.0, 0.0, 7.0, TAB_RED).labelled("eutectoid").dashed();
        assert_eq!(s.points, vec![(0.0, 1000.0), (7.0, 1000.0)]);
        assert_eq!(s.style, LineStyle::Dashed);

        let dots = Series::scatter(vec![(0.1, 990.0)], TAB_RED);
        assert_eq!(dots.style, LineStyle::Scatter);
        assert!(dots.markers);

        let panel = ChartPanel::bare("t", (0.0, 1.0), (0.0, 1.0)).series(s);
        assert!(!panel.axes);
        assert_eq!(panel.series.len(), 1);
    }
}
