use tracing::debug;

use crate::models::{FundamentalMetrics, RawFundamentals};

const BILLION: f64 = 1_000_000_000.0;
const PERCENT: f64 = 100.0;

/// Rescale provider fields into the stored units.
///
/// Revenue becomes billions; margin, ROE and dividend yield become percentages;
/// debt/equity and beta pass through. A field the provider did not report is 0.0.
pub fn normalize_fundamentals(symbol: &str, raw: &RawFundamentals) -> FundamentalMetrics {
    let field = |name: &'static str, value: Option<f64>| {
        value.unwrap_or_else(|| {
            debug!("{}: {} not reported, storing 0", symbol, name);
            0.0
        })
    };
    let percent = |value: Option<f64>| value.map(|v| v * PERCENT);

    FundamentalMetrics {
        symbol: symbol.to_string(),
        revenue_billions: field("totalRevenue", raw.total_revenue.map(|v| v / BILLION)),
        profit_margin: field("profitMargins", percent(raw.profit_margins)),
        de_ratio: field("debtToEquity", raw.debt_to_equity),
        roe: field("returnOnEquity", percent(raw.return_on_equity)),
        beta: field("beta", raw.beta),
        div_yield: field("dividendYield", percent(raw.dividend_yield)),
    }
}
