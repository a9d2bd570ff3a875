//! Analytics time windows.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of trailing days an analytics query covers.
///
/// Only the presets offered in the dashboard are representable; anything
/// else falls back to [`AnalyticsWindow::default`] (30 days).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct AnalyticsWindow(u32);

impl AnalyticsWindow {
    /// Window sizes offered to users.
    pub const PRESETS: [u32; 4] = [7, 30, 60, 90];

    /// Build a window from a preset day count.
    #[must_use]
    pub fn from_days(days: u32) -> Option<Self> {
        Self::PRESETS.contains(&days).then_some(Self(days))
    }

    /// Parse a user-supplied value, falling back to the default window.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse::<u32>().ok())
            .and_then(Self::from_days)
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn days(self) -> u32 {
        self.0
    }

    /// All presets, in display order.
    pub fn presets() -> impl Iterator<Item = Self> {
        Self::PRESETS.into_iter().map(Self)
    }
}

impl Default for AnalyticsWindow {
    fn default() -> Self {
        Self(30)
    }
}

impl fmt::Display for AnalyticsWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.0)
    }
}

impl TryFrom<u32> for AnalyticsWindow {
    type Error = String;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        Self::from_days(days).ok_or_else(|| format!("unsupported analytics window: {days} days"))
    }
}

impl From<AnalyticsWindow> for u32 {
    fn from(window: AnalyticsWindow) -> Self {
        window.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_accepted() {
        for days in [7, 30, 60, 90] {
            assert_eq!(AnalyticsWindow::from_days(days).map(AnalyticsWindow::days), Some(days));
        }
        assert!(AnalyticsWindow::from_days(14).is_none());
    }

    #[test]
    fn test_from_query_falls_back_to_thirty_days() {
        assert_eq!(AnalyticsWindow::from_query(None).days(), 30);
        assert_eq!(AnalyticsWindow::from_query(Some("abc")).days(), 30);
        assert_eq!(AnalyticsWindow::from_query(Some("45")).days(), 30);
        assert_eq!(AnalyticsWindow::from_query(Some(" 90 ")).days(), 90);
    }

    #[test]
    fn test_display() {
        assert_eq!(AnalyticsWindow::default().to_string(), "30d");
    }
}
