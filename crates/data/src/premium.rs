use kimchi_core::UpstreamError;

/// Premiums derived from one set of prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Premiums {
    /// `upbit_krw / (binance_usd * usd_krw) - 1`
    pub kimchi: f64,
    /// `coinbase_usd / binance_usd - 1`
    pub coinbase: f64,
}

/// Combine the three spot prices and the FX rate into premiums.
///
/// A zero or otherwise degenerate input that makes either ratio non-finite
/// is reported as an invalid upstream field.
pub fn compute_premium(
    upbit_krw: f64,
    binance_usd: f64,
    coinbase_usd: f64,
    usd_krw: f64,
) -> Result<Premiums, UpstreamError> {
    let kimchi = upbit_krw / (binance_usd * usd_krw) - 1.0;
    if !kimchi.is_finite() {
        return Err(UpstreamError::invalid_field(
            "kimchiPremium",
            format!("{upbit_krw} / ({binance_usd} * {usd_krw})"),
        ));
    }

    let coinbase = coinbase_usd / binance_usd - 1.0;
    if !coinbase.is_finite() {
        return Err(UpstreamError::invalid_field(
            "coinbasePremium",
            format!("{coinbase_usd} / {binance_usd}"),
        ));
    }

    Ok(Premiums { kimchi, coinbase })
}
