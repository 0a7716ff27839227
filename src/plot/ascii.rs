//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed monthly averages: `o`
//! - predicted price: `-` line
//! - uncertainty band: `.`

use chrono::NaiveDate;

use crate::domain::{ForecastPoint, MonthlyPoint};
use crate::models::epoch_day;

/// Render one commodity's history with its forecast line and band.
pub fn render_forecast_plot(
    commodity: &str,
    history: &[MonthlyPoint],
    forecast: &[ForecastPoint],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let observed: Vec<(f64, f64)> = history
        .iter()
        .map(|p| (epoch_day(p.month.first_day()), p.value))
        .collect();
    let predicted: Vec<(f64, f64)> = forecast
        .iter()
        .map(|p| (epoch_day(p.date), p.predicted_price))
        .collect();

    let dates = history
        .iter()
        .map(|p| p.month.first_day())
        .chain(forecast.iter().map(|p| p.date));
    let (first, last) = date_range(dates);

    let (x_min, x_max) = x_range(&observed, &predicted).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(history, forecast).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first, then band into the gaps, then observations on top.
    draw_curve(&mut grid, &predicted, x_min, x_max, y_min, y_max);
    for p in forecast {
        let x = map_x(epoch_day(p.date), x_min, x_max, width);
        let top = map_y(p.upper_bound, y_min, y_max, height);
        let bottom = map_y(p.lower_bound, y_min, y_max, height);
        for row in grid.iter_mut().take(bottom + 1).skip(top) {
            if row[x] == ' ' {
                row[x] = '.';
            }
        }
    }
    for &(d, v) in &observed {
        let x = map_x(d, x_min, x_max, width);
        let y = map_y(v, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    let span = match (first, last) {
        (Some(a), Some(b)) => format!("{a} to {b}"),
        _ => "no data".to_string(),
    };
    out.push_str(&format!("Plot: {commodity} | {span} | price=[{y_min:.2}, {y_max:.2}]\n"));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn date_range(dates: impl Iterator<Item = NaiveDate>) -> (Option<NaiveDate>, Option<NaiveDate>) {
    dates.fold((None, None), |(lo, hi), d| {
        (
            Some(lo.map_or(d, |x: NaiveDate| x.min(d))),
            Some(hi.map_or(d, |x: NaiveDate| x.max(d))),
        )
    })
}

fn x_range(a: &[(f64, f64)], b: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for &(x, _) in a.iter().chain(b) {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(history: &[MonthlyPoint], forecast: &[ForecastPoint]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for p in history {
        min_y = min_y.min(p.value);
        max_y = max_y.max(p.value);
    }
    for p in forecast {
        min_y = min_y.min(p.lower_bound).min(p.predicted_price);
        max_y = max_y.max(p.upper_bound).max(p.predicted_price);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.is_empty() {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let xx = map_x(x, x_min, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, xx, yy, '-');
        } else {
            grid[yy][xx] = '-';
        }
        prev = Some((xx, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
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
