//! Tolerant extraction of trading metrics from uploaded report text.
//!
//! Reports arrive as semi-structured text (often with HTML-ish markup from
//! the terminal that produced them). Each scalar field has its own labeled
//! pattern so a format drift in one field cannot break the others.

use lazy_static::lazy_static;
use regex::Regex;

use report_core::{ExtractionError, Metrics, Trade, TradeSide};

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref PERIOD_RE: Regex = Regex::new(r"Daily Report \((\d+ hours?)\)").unwrap();
    static ref WINNING_RE: Regex = Regex::new(r"Winning Trades:\s*([\d,]+)").unwrap();
    static ref LOSING_RE: Regex = Regex::new(r"Losing Trades:\s*([\d,]+)").unwrap();
    static ref TOTAL_RE: Regex = Regex::new(r"Total Trades:\s*([\d,]+)").unwrap();
    static ref WIN_RATE_RE: Regex =
        Regex::new(r"Win Rate:\s*([+-]?[\d,]+(?:\.\d+)?)\s*%").unwrap();
    static ref NET_PROFIT_RE: Regex =
        Regex::new(r"Net Profit:\s*([+-]?)\s*[$€£]?\s*([\d,]+(?:\.\d+)?)").unwrap();
    static ref TRADE_RE: Regex = Regex::new(
        r"Order\s*#(\w+):\s*(\w+)\s+(\S+)\s*\|\s*Profit:\s*([+-]?[\d,]+(?:\.\d+)?)"
    )
    .unwrap();
}

/// Default reporting window when the report header is absent
const DEFAULT_PERIOD: &str = "1 hour";

/// Extract a [`Metrics`] record from raw report text.
///
/// `Winning Trades`, `Losing Trades`, and `Net Profit` are required;
/// `Total Trades` and `Win Rate` are derived when the report omits them.
/// Trade-detail lines are optional, and lines that don't match the expected
/// shape are skipped.
pub fn extract(raw: &str) -> Result<Metrics, ExtractionError> {
    let text = strip_markup(raw);

    let period = PERIOD_RE
        .captures(&text)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| DEFAULT_PERIOD.to_string());

    let winning_trades = required_u32(&text, &WINNING_RE, "Winning Trades")?;
    let losing_trades = required_u32(&text, &LOSING_RE, "Losing Trades")?;
    let net_result = required_signed(&text, &NET_PROFIT_RE, "Net Profit")?;

    // Explicit totals win over derivation; derivation covers report
    // generations that omit them.
    let total_trades = match optional_u32(&text, &TOTAL_RE, "Total Trades")? {
        Some(total) => total,
        None => winning_trades + losing_trades,
    };
    let win_rate = match optional_f64(&text, &WIN_RATE_RE, "Win Rate")? {
        Some(rate) => rate.clamp(0.0, 100.0),
        None => Metrics::derive_win_rate(winning_trades, total_trades),
    };

    let trades = scan_trades(&text);

    Ok(Metrics {
        period,
        winning_trades,
        losing_trades,
        total_trades,
        win_rate,
        net_result,
        trades,
    })
}

/// Remove tag-like markup and collapse whitespace runs to single spaces.
fn strip_markup(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, " ");
    WHITESPACE_RE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

fn required_u32(
    text: &str,
    pattern: &Regex,
    field: &'static str,
) -> Result<u32, ExtractionError> {
    optional_u32(text, pattern, field)?.ok_or(ExtractionError::MissingField { field })
}

fn optional_u32(
    text: &str,
    pattern: &Regex,
    field: &'static str,
) -> Result<Option<u32>, ExtractionError> {
    match pattern.captures(text) {
        Some(caps) => {
            let cleaned = caps[1].replace(',', "");
            let value = cleaned
                .parse::<u32>()
                .map_err(|_| ExtractionError::MalformedValue {
                    field,
                    value: caps[1].to_string(),
                })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn optional_f64(
    text: &str,
    pattern: &Regex,
    field: &'static str,
) -> Result<Option<f64>, ExtractionError> {
    match pattern.captures(text) {
        Some(caps) => {
            let value = parse_number(&caps[1]).ok_or_else(|| ExtractionError::MalformedValue {
                field,
                value: caps[1].to_string(),
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn required_signed(
    text: &str,
    pattern: &Regex,
    field: &'static str,
) -> Result<f64, ExtractionError> {
    let caps = pattern
        .captures(text)
        .ok_or(ExtractionError::MissingField { field })?;

    let raw = format!("{}{}", &caps[1], &caps[2]);
    parse_number(&raw).ok_or_else(|| ExtractionError::MalformedValue {
        field,
        value: raw,
    })
}

/// Locale-invariant numeric parse: thousands commas stripped, sign kept.
fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// Scan for per-trade detail lines. Lines that don't match the pattern or
/// carry an unknown side token are skipped, so the accepted count may be
/// lower than the stated total.
fn scan_trades(text: &str) -> Vec<Trade> {
    let mut trades = Vec::new();

    for caps in TRADE_RE.captures_iter(text) {
        let side = match TradeSide::from_token(&caps[2]) {
            Some(side) => side,
            None => {
                tracing::debug!(order_id = &caps[1], token = &caps[2], "skipping unknown side");
                continue;
            }
        };
        let profit = match parse_number(&caps[4]) {
            Some(profit) => profit,
            None => {
                tracing::debug!(order_id = &caps[1], "skipping unparseable profit");
                continue;
            }
        };

        trades.push(Trade {
            order_id: caps[1].to_string(),
            side,
            symbol: caps[3].to_string(),
            profit,
        });
    }

    trades
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_REPORT: &str = "Daily Report (24 hours) Winning Trades: 7 \
        Losing Trades: 3 Total Trades: 10 Win Rate: 70.0% Net Profit: 45.5 pips \
        Order #1: BUY EURUSD | Profit: 12 pips";

    #[test]
    fn full_report_round_trip() {
        let metrics = extract(FULL_REPORT).unwrap();

        assert_eq!(metrics.period, "24 hours");
        assert_eq!(metrics.winning_trades, 7);
        assert_eq!(metrics.losing_trades, 3);
        assert_eq!(metrics.total_trades, 10);
        assert_eq!(metrics.win_rate, 70.0);
        assert_eq!(metrics.net_result, 45.5);
        assert_eq!(metrics.trades.len(), 1);

        let trade = &metrics.trades[0];
        assert_eq!(trade.order_id, "1");
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.symbol, "EURUSD");
        assert_eq!(trade.profit, 12.0);
    }

    #[test]
    fn extraction_is_idempotent() {
        let first = extract(FULL_REPORT).unwrap();
        let second = extract(FULL_REPORT).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn markup_is_stripped_before_matching() {
        let report = "<html><b>Daily Report (24 hours)</b>\n\
            <p>Winning Trades: 2</p>\n<p>Losing Trades: 2</p>\n\
            <p>Net Profit: -10.5 pips</p></html>";
        let metrics = extract(report).unwrap();

        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 2);
        assert_eq!(metrics.net_result, -10.5);
    }

    #[test]
    fn totals_and_win_rate_are_derived_when_absent() {
        let report = "Winning Trades: 7 Losing Trades: 3 Net Profit: 45.5 pips";
        let metrics = extract(report).unwrap();

        assert_eq!(metrics.total_trades, 10);
        assert_eq!(metrics.win_rate, 70.0);
        assert_eq!(metrics.period, "1 hour");
    }

    #[test]
    fn zero_trades_yields_zero_win_rate() {
        let report = "Winning Trades: 0 Losing Trades: 0 Net Profit: 0.0 pips";
        let metrics = extract(report).unwrap();

        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.win_rate, 0.0);
        assert!(metrics.trades.is_empty());
    }

    #[test]
    fn explicit_total_wins_over_derivation() {
        let report = "Winning Trades: 7 Losing Trades: 3 Total Trades: 12 \
            Win Rate: 58.3% Net Profit: 45.5 pips";
        let metrics = extract(report).unwrap();

        assert_eq!(metrics.total_trades, 12);
        assert_eq!(metrics.win_rate, 58.3);
    }

    #[test]
    fn missing_required_field_names_the_field() {
        let report = "Winning Trades: 7 Losing Trades: 3";
        let err = extract(report).unwrap_err();
        assert_eq!(err, ExtractionError::MissingField { field: "Net Profit" });

        let report = "Losing Trades: 3 Net Profit: 1.0";
        let err = extract(report).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingField { field: "Winning Trades" }
        );
    }

    #[test]
    fn overflowing_count_is_malformed_not_a_panic() {
        let report = "Winning Trades: 99999999999 Losing Trades: 3 Net Profit: 1.0";
        let err = extract(report).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::MalformedValue { field: "Winning Trades", .. }
        ));
    }

    #[test]
    fn unknown_side_token_skips_the_line_only() {
        let report = "Winning Trades: 2 Losing Trades: 1 Net Profit: 8 pips \
            Order #1: BUY EURUSD | Profit: 12 pips \
            Order #2: HOLD GBPUSD | Profit: 3 pips \
            Order #3: SELL USDJPY | Profit: -4 pips";
        let metrics = extract(report).unwrap();

        assert_eq!(metrics.trades.len(), 2);
        assert_eq!(metrics.trades[0].order_id, "1");
        assert_eq!(metrics.trades[1].order_id, "3");
        assert_eq!(metrics.trades[1].side, TradeSide::Sell);
        assert_eq!(metrics.trades[1].profit, -4.0);
    }

    #[test]
    fn garbage_between_fields_is_ignored() {
        let report = "noise Winning Trades: 1 more noise Losing Trades: 0 \
            Order nonsense Net Profit: +3.25 pips trailing";
        let metrics = extract(report).unwrap();

        assert_eq!(metrics.winning_trades, 1);
        assert_eq!(metrics.net_result, 3.25);
        assert!(metrics.trades.is_empty());
    }

    #[test]
    fn thousands_separators_and_currency_prefixes() {
        let report = "Winning Trades: 1,024 Losing Trades: 976 Net Profit: -$1,234.50";
        let metrics = extract(report).unwrap();

        assert_eq!(metrics.winning_trades, 1024);
        assert_eq!(metrics.losing_trades, 976);
        assert_eq!(metrics.total_trades, 2000);
        assert_eq!(metrics.net_result, -1234.5);
    }

    #[test]
    fn single_hour_period_variant() {
        let report = "Daily Report (1 hour) Winning Trades: 1 Losing Trades: 0 \
            Net Profit: 2.0 pips";
        let metrics = extract(report).unwrap();
        assert_eq!(metrics.period, "1 hour");
    }
}
