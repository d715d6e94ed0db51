//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - actual weekly values: `o`
//! - expected values: `-` line (broken where there is no forecast)

use crate::domain::YearlySeries;
use crate::report::ExcessPoint;

/// Render actual vs expected, one column position per week.
pub fn render_excess_plot(points: &[ExcessPoint], unit: &str, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return "Plot: no data\n".to_string();
    };

    let (y_min, y_max) = y_range(points).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);
    let x_max = (points.len() - 1).max(1) as f64;

    let mut grid = vec![vec![' '; width]; height];

    // Expected first, so actual points overlay it.
    let mut prev = None;
    for (i, p) in points.iter().enumerate() {
        let Some(expected) = p.expected else {
            prev = None;
            continue;
        };
        let x = map_x(i as f64, 0.0, x_max, width);
        let y = map_y(expected, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, y, '-'),
            None => grid[y][x] = '-',
        }
        prev = Some((x, y));
    }

    for (i, p) in points.iter().enumerate() {
        let x = map_x(i as f64, 0.0, x_max, width);
        let y = map_y(p.actual, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} .. {} | y=[{y_min:.2}, {y_max:.2}] {unit}\n",
        first.week, last.week
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// Horizontal bars, one line per year.
pub fn render_yearly_bars(totals: &YearlySeries, width: usize, decimals: usize) -> String {
    let bar_width = width.saturating_sub(24).max(10);
    let max = totals.iter().map(|(_, v)| v).fold(0.0_f64, f64::max);

    let mut out = String::new();
    for (year, total) in totals.iter() {
        let len = if max > 0.0 {
            ((total / max) * bar_width as f64).round().max(0.0) as usize
        } else {
            0
        };
        out.push_str(&format!("{year} | {} {total:.decimals$}\n", "#".repeat(len)));
    }
    out
}

fn y_range(points: &[ExcessPoint]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for p in points {
        for v in std::iter::once(p.actual).chain(p.expected) {
            min_y = min_y.min(v);
            max_y = max_y.max(v);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() && max_y.is_finite() {
        // Flat series: center it.
        Some((min_y - 1.0, max_y + 1.0))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills empty cells.
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
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
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
