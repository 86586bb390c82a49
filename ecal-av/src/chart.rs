//! Bar chart of per-group totals (SVG)
//!
//! Bars follow the order of the totals, so a descending aggregation gives a
//! descending chart. The first bar is highlighted.

use crate::client::DateRange;
use crate::error::{Error, Result};
use chrono::Datelike;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_CHART_PATH: &str = "./output/emissions_by_facility.svg";
pub const Y_AXIS_LABEL: &str = "Emissions (tons of CO2e)";

const HIGHLIGHT: RGBColor = RED;
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);

/// Chart layout and labels
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub size: (u32, u32),
}

impl ChartSpec {
    /// Labels for totals grouped by `group_field` over `range`
    pub fn for_range(group_field: &str, range: &DateRange) -> Self {
        Self {
            title: chart_title(group_field, range),
            x_label: group_field.to_string(),
            y_label: Y_AXIS_LABEL.to_string(),
            size: (1200, 800),
        }
    }
}

/// `Emission Distribution by <group> in <year> (...)`, or `from .. to ..`
/// when the range crosses a year boundary
pub fn chart_title(group_field: &str, range: &DateRange) -> String {
    let period = if range.start().year() == range.end().year() {
        format!("in {}", range.start().year())
    } else {
        format!("from {} to {}", range.start(), range.end())
    };
    format!(
        "Emission Distribution by {} {} (Sorted in Descending Order)",
        group_field, period
    )
}

fn chart_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Chart(e.to_string())
}

/// Draw one bar per `(label, total)` into an SVG file at `path`
///
/// Parent directories are created. An empty `groups` slice is an error;
/// callers decide whether to skip the chart instead.
pub fn render_bar_chart(groups: &[(String, f64)], spec: &ChartSpec, path: &Path) -> Result<PathBuf> {
    if groups.is_empty() {
        return Err(Error::Chart("no groups to plot".to_string()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let max = groups.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let min = groups.iter().map(|(_, v)| *v).fold(0.0_f64, f64::min);
    // Headroom for the value labels
    let y_top = if max > 0.0 { max * 1.1 } else { 1.0 };
    let y_bottom = if min < 0.0 { min * 1.1 } else { 0.0 };
    let labels: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();

    let root = SVGBackend::new(path, spec.size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d((0..groups.len()).into_segmented(), y_bottom..y_top)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .x_labels(groups.len())
        .x_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(i) => labels.get(*i).map(|s| s.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(groups.iter().enumerate().map(|(i, (_, value))| {
            let color = if i == 0 { HIGHLIGHT } else { SKY_BLUE };
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
                color.filled(),
            );
            bar.set_margin(0, 0, 10, 10);
            bar
        }))
        .map_err(chart_err)?;

    let label_style = TextStyle::from(("sans-serif", 14).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart
        .draw_series(groups.iter().enumerate().map(|(i, (_, value))| {
            Text::new(
                format!("{:.2}", value),
                (SegmentValue::CenterOf(i), *value),
                label_style.clone(),
            )
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!(path = %path.display(), bars = groups.len(), "Chart written");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_title_single_year() {
        let title = chart_title("Facility", &range((2022, 1, 1), (2022, 12, 31)));
        assert_eq!(
            title,
            "Emission Distribution by Facility in 2022 (Sorted in Descending Order)"
        );
    }

    #[test]
    fn test_title_spanning_years() {
        let title = chart_title("Site", &range((2022, 7, 1), (2023, 6, 30)));
        assert_eq!(
            title,
            "Emission Distribution by Site from 2022-07-01 to 2023-06-30 (Sorted in Descending Order)"
        );
    }

    #[test]
    fn test_render_writes_svg() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("charts").join("totals.svg");
        let groups = vec![("Paris".to_string(), 12.345), ("Lyon".to_string(), 3.0)];
        let spec = ChartSpec::for_range("Facility", &range((2022, 1, 1), (2022, 12, 31)));

        let written = render_bar_chart(&groups, &spec, &path).unwrap();

        assert_eq!(written, path);
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("12.35") || svg.contains("12.34"));
        assert!(svg.contains("3.00"));
        assert!(svg.contains("Paris"));
    }

    #[test]
    fn test_render_empty_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.svg");
        let spec = ChartSpec::for_range("Facility", &range((2022, 1, 1), (2022, 12, 31)));

        assert!(matches!(render_bar_chart(&[], &spec, &path), Err(Error::Chart(_))));
        assert!(!path.exists());
    }
}
