//! ASCII/Unicode charts for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual checks in a terminal or a piped log
//! - deterministic output (helpful for golden tests)
//!
//! Line charts draw each series with its own marker (`*`, `+`, `o`, `x`);
//! bar charts scale `#` runs to the largest value.

use chrono::NaiveDate;

use crate::report::format::{ValueFormat, truncate};
use crate::report::Series;

const MARKERS: [char; 4] = ['*', '+', 'o', 'x'];

/// Render date series on a shared grid.
pub fn render_line_chart(series: &[Series], width: usize, height: usize, format: ValueFormat) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((d_min, d_max)) = date_range(series) else {
        return "(no data)\n".to_string();
    };
    let (y_min, y_max) = y_range(series).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let x_span = (d_max - d_min).num_days().max(1) as f64;
    let mut grid = vec![vec![' '; width]; height];

    for (i, s) in series.iter().enumerate() {
        let marker = MARKERS[i % MARKERS.len()];
        let mut prev = None;
        for &(date, v) in &s.points {
            let x = map_x((date - d_min).num_days() as f64, x_span, width);
            let y = map_y(v, y_min, y_max, height);
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, x, y, '.');
            }
            grid[y][x] = marker;
            prev = Some((x, y));
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} - {} | y=[{}, {}]\n",
        d_min.format("%Y/%m/%d"),
        d_max.format("%Y/%m/%d"),
        format.format(y_min),
        format.format(y_max),
    ));
    for row in grid {
        let line: String = row.into_iter().collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    if series.len() > 1 {
        let legend: Vec<String> = series
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{} {}", MARKERS[i % MARKERS.len()], s.name))
            .collect();
        out.push_str(&legend.join("  "));
        out.push('\n');
    }
    out
}

/// Render labelled horizontal bars; negative values are drawn as empty bars.
pub fn render_bar_chart(bars: &[(String, f64)], width: usize, format: ValueFormat) -> String {
    if bars.is_empty() {
        return "(no data)\n".to_string();
    }

    let label_width = bars
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0)
        .min(20);
    let bar_width = width.saturating_sub(label_width + 14).max(10);
    let max = bars
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    let mut out = String::new();
    for (name, v) in bars {
        let len = if max > 0.0 && v.is_finite() && *v > 0.0 {
            ((v / max) * bar_width as f64).round().max(1.0) as usize
        } else {
            0
        };
        let label = truncate(name, label_width);
        let pad = label_width.saturating_sub(label.chars().count());
        out.push_str(&format!(
            "{label}{} |{} {}\n",
            " ".repeat(pad),
            "#".repeat(len),
            format.format(*v)
        ));
    }
    out
}

fn date_range(series: &[Series]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

fn y_range(series: &[Series]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in series.iter().flat_map(|s| s.points.iter()) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        // Flat series: give it some room so it renders mid-chart.
        Some((min_y - 1.0, min_y + 1.0))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(offset: f64, span: f64, width: usize) -> usize {
    let u = (offset / span).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish); never overwrites markers.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn line_chart_golden_snapshot_small() {
        let s = Series::new("Visitors", vec![(d(1), 100.0), (d(10), 120.0)]);
        let txt = render_line_chart(&[s], 10, 5, ValueFormat::Count);
        let expected = concat!(
            "Plot: 2025/01/01 - 2025/01/10 | y=[99, 121]\n",
            "        .*\n",
            "      ..\n",
            "    ..\n",
            "  ..\n",
            "*.\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn line_chart_without_points_says_so() {
        assert_eq!(render_line_chart(&[], 40, 8, ValueFormat::Count), "(no data)\n");
    }

    #[test]
    fn bar_chart_scales_to_largest_value() {
        let bars = vec![("Desktop".to_string(), 600.0), ("Mobile".to_string(), 300.0)];
        let txt = render_bar_chart(&bars, 41, ValueFormat::Count);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], format!("Desktop |{} 600", "#".repeat(20)));
        assert_eq!(lines[1], format!("Mobile  |{} 300", "#".repeat(10)));
    }
}
