//! Renders a [`Metrics`] record into a PNG summary card.
//!
//! The canvas is composed in-memory with plotters and encoded to PNG bytes,
//! so the delivery stage never touches the filesystem. The generation
//! timestamp is injected by the caller, which keeps the output byte-identical
//! for identical inputs.

use chrono::{DateTime, Utc};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use report_core::{Metrics, RenderError, Trade};

const WIDTH: u32 = 900;
const HEIGHT: u32 = 600;

const BACKGROUND: RGBColor = RGBColor(0x0f, 0x17, 0x2a);
const FOREGROUND: RGBColor = RGBColor(0xf8, 0xfa, 0xfc);
const MUTED: RGBColor = RGBColor(0x94, 0xa3, 0xb8);
const GREEN: RGBColor = RGBColor(0x22, 0xc5, 0x5e);
const RED: RGBColor = RGBColor(0xef, 0x44, 0x44);

const PREFERRED_FONT: &str = "DejaVu Sans";
const FALLBACK_FONT: &str = "sans-serif";

const MARGIN: i32 = 40;
const SUMMARY_TOP: i32 = 104;
const LINE_HEIGHT: i32 = 36;
const TRADE_LINE_HEIGHT: i32 = 26;
const FOOTER_Y: i32 = 562;

/// Render the metrics card and serialize it as PNG bytes.
pub fn render(metrics: &Metrics, generated_at: DateTime<Utc>) -> Result<Vec<u8>, RenderError> {
    let mut pixels = vec![0u8; (WIDTH * HEIGHT * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut pixels, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&BACKGROUND)
            .map_err(|e| RenderError::Drawing(e.to_string()))?;

        compose(&root, metrics, generated_at)?;

        root.present()
            .map_err(|e| RenderError::Drawing(e.to_string()))?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, WIDTH, HEIGHT, ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Encoding(e.to_string()))?;

    Ok(png)
}

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

fn compose(
    root: &Canvas<'_>,
    metrics: &Metrics,
    generated_at: DateTime<Utc>,
) -> Result<(), RenderError> {
    let title = format!("Trading Report ({})", metrics.period);
    draw_line(root, &title, 30, &FOREGROUND, (MARGIN, 40))?;

    let summary: [(String, RGBColor); 5] = [
        (
            format!("Total Trades: {}", group_thousands(metrics.total_trades)),
            FOREGROUND,
        ),
        (
            format!("Winning Trades: {}", group_thousands(metrics.winning_trades)),
            GREEN,
        ),
        (
            format!("Losing Trades: {}", group_thousands(metrics.losing_trades)),
            RED,
        ),
        (format!("Win Rate: {:.1}%", metrics.win_rate), FOREGROUND),
        (
            format!("Net Profit: {} pips", format_signed(metrics.net_result)),
            profit_color(metrics.net_result),
        ),
    ];

    for (i, (line, color)) in summary.iter().enumerate() {
        let y = SUMMARY_TOP + i as i32 * LINE_HEIGHT;
        draw_line(root, line, 22, color, (MARGIN, y))?;
    }

    if !metrics.trades.is_empty() {
        draw_trade_block(root, &metrics.trades)?;
    }

    let footer = format!("Generated {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    draw_line(root, &footer, 16, &MUTED, (MARGIN, FOOTER_Y))?;

    Ok(())
}

fn draw_trade_block(root: &Canvas<'_>, trades: &[Trade]) -> Result<(), RenderError> {
    let top = SUMMARY_TOP + 5 * LINE_HEIGHT + 18;
    draw_line(root, "Trades", 22, &MUTED, (MARGIN, top))?;

    let rows_top = top + LINE_HEIGHT;
    let max_rows = ((FOOTER_Y - TRADE_LINE_HEIGHT - rows_top) / TRADE_LINE_HEIGHT).max(0) as usize;

    let shown = trades.len().min(max_rows);
    for (i, trade) in trades[..shown].iter().enumerate() {
        let y = rows_top + i as i32 * TRADE_LINE_HEIGHT;
        draw_line(
            root,
            &trade_row(trade),
            18,
            &profit_color(trade.profit),
            (MARGIN, y),
        )?;
    }

    if shown < trades.len() {
        let y = rows_top + shown as i32 * TRADE_LINE_HEIGHT;
        let overflow = format!("... and {} more", trades.len() - shown);
        draw_line(root, &overflow, 18, &MUTED, (MARGIN, y))?;
    }

    Ok(())
}

/// Draw one text run, preferring the bundled-quality face and falling back
/// to the generic family when the preferred one cannot be loaded.
fn draw_line(
    root: &Canvas<'_>,
    text: &str,
    size: u32,
    color: &RGBColor,
    pos: (i32, i32),
) -> Result<(), RenderError> {
    let anchor = Pos::new(HPos::Left, VPos::Top);

    let preferred = (PREFERRED_FONT, size).into_font().color(color).pos(anchor);
    if root
        .draw(&Text::new(text.to_string(), pos, preferred))
        .is_ok()
    {
        return Ok(());
    }

    tracing::debug!(font = PREFERRED_FONT, "font unavailable, using fallback");
    let fallback = (FALLBACK_FONT, size).into_font().color(color).pos(anchor);
    root.draw(&Text::new(text.to_string(), pos, fallback))
        .map_err(|e| RenderError::Drawing(e.to_string()))
}

fn profit_color(value: f64) -> RGBColor {
    if value < 0.0 {
        RED
    } else {
        GREEN
    }
}

/// Row text for one trade, e.g. `#42: SELL GBPUSD | Profit: -3.0 pips`
fn trade_row(trade: &Trade) -> String {
    format!(
        "#{}: {} {} | Profit: {} pips",
        trade.order_id,
        trade.side,
        trade.symbol,
        format_signed(trade.profit)
    )
}

/// Signed fixed-precision formatting: one decimal place, thousands-grouped
/// integer part, e.g. -12345.67 -> "-12,345.7"
fn format_signed(value: f64) -> String {
    let raw = format!("{value:+.1}");
    let (sign, rest) = raw.split_at(1);
    match rest.split_once('.') {
        Some((int_part, frac)) => format!("{sign}{}.{frac}", group_digits(int_part)),
        None => format!("{sign}{}", group_digits(rest)),
    }
}

/// Thousands grouping for counts, e.g. 1234567 -> "1,234,567"
fn group_thousands(value: u32) -> String {
    group_digits(&value.to_string())
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
