use chrono::{DateTime, Duration, Utc};
use kimchi_core::RiskLevel;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

/// Default window during which an identical alert is suppressed.
pub const DEFAULT_COOLDOWN_SECS: i64 = 600;

/// Rate-limits risk alerts per distinct (level, reasons) combination.
///
/// Expired entries are swept whenever an alert fires. An expired entry
/// and a missing one both let the next alert through, so sweeping does
/// not change which alerts fire.
#[derive(Debug)]
pub struct AlertCooldown {
    window: Duration,
    last_fired: HashMap<String, DateTime<Utc>>,
    last_alert_at: Option<DateTime<Utc>>,
}

impl Default for AlertCooldown {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS))
    }
}

impl AlertCooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: HashMap::new(),
            last_alert_at: None,
        }
    }

    /// Stable key over the level and the ordered reasons.
    pub fn key(level: RiskLevel, reasons: &[String]) -> String {
        let raw = format!("{}:{}", level.as_str(), reasons.join("|"));
        hex::encode(Sha256::digest(raw.as_bytes()))
    }

    /// Decide whether to alert, recording `now` if so.
    pub fn should_alert(&mut self, level: RiskLevel, reasons: &[String], now: DateTime<Utc>) -> bool {
        if !level.is_alertable() {
            return false;
        }

        let key = Self::key(level, reasons);
        if let Some(last) = self.last_fired.get(&key) {
            if now - *last < self.window {
                debug!(%level, "Alert suppressed by cooldown");
                return false;
            }
        }

        self.sweep(now);
        self.last_fired.insert(key, now);
        self.last_alert_at = Some(now);
        true
    }

    /// Time of the most recent alert of any kind.
    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.last_alert_at
    }

    pub fn tracked_keys(&self) -> usize {
        self.last_fired.len()
    }

    fn sweep(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.last_fired.retain(|_, last| now - *last < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn reasons(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cooldown_window() {
        let mut cooldown = AlertCooldown::default();
        let r = reasons(&["Funding rate is elevated"]);

        assert!(cooldown.should_alert(RiskLevel::Warn, &r, t0()));
        assert!(!cooldown.should_alert(RiskLevel::Warn, &r, t0() + Duration::minutes(1)));
        assert!(cooldown.should_alert(RiskLevel::Warn, &r, t0() + Duration::minutes(11)));
        assert_eq!(cooldown.last_alert_at(), Some(t0() + Duration::minutes(11)));
    }

    #[test]
    fn test_ok_never_alerts() {
        let mut cooldown = AlertCooldown::default();
        assert!(!cooldown.should_alert(RiskLevel::Ok, &[], t0()));
        assert_eq!(cooldown.last_alert_at(), None);
        assert_eq!(cooldown.tracked_keys(), 0);
    }

    #[test]
    fn test_distinct_reasons_have_separate_windows() {
        let mut cooldown = AlertCooldown::default();
        let funding = reasons(&["Funding rate is elevated"]);
        let both = reasons(&["Funding rate is elevated", "Open interest jumped >= 10%"]);

        assert!(cooldown.should_alert(RiskLevel::Warn, &funding, t0()));
        assert!(cooldown.should_alert(RiskLevel::Danger, &both, t0() + Duration::seconds(30)));
        assert!(!cooldown.should_alert(RiskLevel::Danger, &both, t0() + Duration::minutes(2)));
    }

    #[test]
    fn test_key_is_order_sensitive() {
        let a = reasons(&["a", "b"]);
        let b = reasons(&["b", "a"]);
        assert_ne!(AlertCooldown::key(RiskLevel::Warn, &a), AlertCooldown::key(RiskLevel::Warn, &b));
        assert_eq!(AlertCooldown::key(RiskLevel::Warn, &a), AlertCooldown::key(RiskLevel::Warn, &a));
        assert_eq!(AlertCooldown::key(RiskLevel::Warn, &a).len(), 64);
    }

    #[test]
    fn test_expired_entries_are_swept() {
        let mut cooldown = AlertCooldown::default();
        assert!(cooldown.should_alert(RiskLevel::Warn, &reasons(&["a"]), t0()));
        assert!(cooldown.should_alert(RiskLevel::Warn, &reasons(&["b"]), t0()));
        assert_eq!(cooldown.tracked_keys(), 2);

        assert!(cooldown.should_alert(RiskLevel::Danger, &reasons(&["a", "b"]), t0() + Duration::minutes(15)));
        assert_eq!(cooldown.tracked_keys(), 1);
    }
}
