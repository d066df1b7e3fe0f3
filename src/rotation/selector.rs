//! Active slot selection under a rotation window.
//!
//! The indicator secret names the slot that was promoted last. Right after a
//! promotion, the proxy and connection caches in front of the database may
//! still hold the previous password for that slot, so for the length of the
//! rotation window the selector reads the *other* slot, which has not been
//! touched by the latest rotation.

use chrono::{DateTime, Duration, Utc};

use super::slot::{ActiveSlotSecret, Slot};

/// Default length of the rotation window: 90 minutes.
pub const DEFAULT_ROTATION_WINDOW_MINUTES: i64 = 90;

/// Time span after a promotion during which the promoted slot is avoided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationWindow(Duration);

impl RotationWindow {
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn from_minutes(minutes: i64) -> Self {
        Self(Duration::minutes(minutes))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }
}

impl Default for RotationWindow {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_ROTATION_WINDOW_MINUTES)
    }
}

/// Picks the credential slot to read for one resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationSelector {
    window: RotationWindow,
}

impl RotationSelector {
    pub fn new(window: RotationWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> RotationWindow {
        self.window
    }

    /// Returns the slot to use at `now`.
    ///
    /// `now - timestamp < window` selects the opposite of the indicated slot,
    /// anything else selects the indicated slot. A promotion timestamp in the
    /// future counts as inside the window.
    pub fn select_slot(&self, indicator: &ActiveSlotSecret, now: DateTime<Utc>) -> Slot {
        let elapsed_ms = now.timestamp_millis().saturating_sub(indicator.timestamp);

        if elapsed_ms < self.window.duration().num_milliseconds() {
            indicator.active_slot.flip()
        } else {
            indicator.active_slot
        }
    }

    /// Whether the indicator was promoted within the window at `now`.
    pub fn recently_rotated(&self, indicator: &ActiveSlotSecret, now: DateTime<Utc>) -> bool {
        self.select_slot(indicator, now) != indicator.active_slot
    }
}
