//! Plotters-powered trend chart widget for Ratatui.
//!
//! Plotters gives us axes and line rendering without hand-placing cells; the
//! output is drawn into the Ratatui buffer via `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Line colors, in series order.
pub const PALETTE: [(u8, u8, u8); 4] = [(0, 255, 255), (255, 255, 0), (0, 255, 0), (255, 0, 255)];

/// Ratatui color matching `PALETTE[i]` (used for the legend).
pub fn legend_color(i: usize) -> Color {
    let (r, g, b) = PALETTE[i % PALETTE.len()];
    Color::Rgb(r, g, b)
}

/// A render-only chart description.
///
/// X values are day offsets from the first date of the range; all bounds are
/// computed outside the render call.
pub struct TrendChart<'a> {
    /// One `(x, y)` polyline per series.
    pub lines: &'a [Vec<(f64, f64)>],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for TrendChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 6 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            // Tick labels are drawn by the caller in terminal cells, so Plotters
            // only needs the plotting area itself.
            let mut chart = ChartBuilder::on(&root).margin(0).build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(0)
                .y_labels(0)
                .axis_style(&WHITE)
                .draw()?;

            for (i, line) in self.lines.iter().enumerate() {
                let (r, g, b) = PALETTE[i % PALETTE.len()];
                let color = RGBColor(r, g, b);
                if line.len() == 1 {
                    // A lone point draws nothing as a line.
                    chart.draw_series(line.iter().map(|&(x, y)| Pixel::new((x, y), color)))?;
                } else {
                    chart.draw_series(LineSeries::new(line.iter().copied(), &color))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
