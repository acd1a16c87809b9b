use kimchi_core::{RiskAssessment, RiskLevel};

/// Absolute funding rate at or above which funding is considered elevated (5 bps).
pub const FUNDING_RATE_WARN: f64 = 0.0005;

/// Relative open-interest increase at or above which OI is considered to have jumped.
pub const OPEN_INTEREST_JUMP_WARN: f64 = 0.10;

pub const FUNDING_REASON: &str = "Funding rate is elevated";
pub const OPEN_INTEREST_REASON: &str = "Open interest jumped >= 10%";

/// Check the funding rate.
fn check_funding(funding_rate: f64) -> Option<&'static str> {
    (funding_rate.abs() >= FUNDING_RATE_WARN).then_some(FUNDING_REASON)
}

/// Check the open-interest delta. Skipped without a usable previous value.
fn check_open_interest(open_interest: f64, prev_open_interest: Option<f64>) -> Option<&'static str> {
    let prev = prev_open_interest.filter(|p| p.is_finite() && *p > 0.0)?;
    ((open_interest - prev) / prev >= OPEN_INTEREST_JUMP_WARN).then_some(OPEN_INTEREST_REASON)
}

/// Classify funding and open-interest conditions.
///
/// `DANGER` when both checks warn, `WARN` when one does, `OK` otherwise.
/// The funding reason always comes before the open-interest reason.
pub fn compute_risk(
    funding_rate: f64,
    open_interest: f64,
    prev_open_interest: Option<f64>,
) -> RiskAssessment {
    let reasons: Vec<String> = [
        check_funding(funding_rate),
        check_open_interest(open_interest, prev_open_interest),
    ]
    .into_iter()
    .flatten()
    .map(str::to_string)
    .collect();

    let level = match reasons.len() {
        0 => RiskLevel::Ok,
        1 => RiskLevel::Warn,
        _ => RiskLevel::Danger,
    };

    RiskAssessment { level, reasons }
}
