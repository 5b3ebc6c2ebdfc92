//! Money and duration rounding

/// Decimal places kept on billed amounts
pub const CURRENCY_DECIMALS: u32 = 2;

/// Decimal places kept on recorded session durations (minutes)
pub const DURATION_DECIMALS: u32 = 1;

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Round a monetary amount to currency precision.
pub fn round_currency(value: f64) -> f64 {
    round_to(value, CURRENCY_DECIMALS)
}

/// Round a duration in minutes to the precision stored on session records.
pub fn round_minutes(value: f64) -> f64 {
    round_to(value, DURATION_DECIMALS)
}

/// Render an amount with its currency symbol, e.g. `₹4.50`.
pub fn format_amount(symbol: &str, value: f64) -> String {
    format!("{}{:.2}", symbol, value)
}

/// Compare two rates. Rates come from config and the wire as decimals with
/// one or two places, so a tight tolerance is enough.
pub fn rates_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
