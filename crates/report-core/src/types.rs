use serde::{Deserialize, Serialize};

/// Direction of a single trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Parse a side token from report text. Anything other than BUY/SELL
    /// is rejected, which causes the surrounding trade line to be skipped.
    pub fn from_token(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BUY" => Some(TradeSide::Buy),
            "SELL" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// One trade line from the report, in encounter order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub order_id: String,
    pub side: TradeSide,
    pub symbol: String,
    pub profit: f64,
}

/// Structured metrics extracted from one uploaded report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Free-text reporting window, e.g. "24 hours"
    pub period: String,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub total_trades: u32,
    /// Percentage in [0, 100]
    pub win_rate: f64,
    pub net_result: f64,
    #[serde(default)]
    pub trades: Vec<Trade>,
}

impl Metrics {
    /// Win rate implied by a win/total pair, as a percentage. Zero when
    /// there are no trades to rate.
    pub fn derive_win_rate(winning: u32, total: u32) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (f64::from(winning) / f64::from(total) * 100.0).clamp(0.0, 100.0)
    }
}
