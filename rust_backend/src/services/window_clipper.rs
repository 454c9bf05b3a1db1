//! Meridian window clipping.
//!
//! Restricts a `[rise, set]` interval to `windowMinutes` either side of
//! transit. Pure interval arithmetic.

use chrono::{DateTime, Duration, Utc};

use super::target_window::TargetWindowResult;
use crate::core::domain::Period;

pub struct WindowClipper;

impl WindowClipper {
    /// Intersection of `[rise, set]` with `[transit - minutes, transit + minutes]`.
    ///
    /// Without a transit the interval is returned unchanged. Returns `None`
    /// when the two intervals do not overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use tsi_visibility::services::WindowClipper;
    ///
    /// let at = |h| Utc.with_ymd_and_hms(2024, 1, 16, h, 0, 0).unwrap();
    /// let clipped = WindowClipper::clip(at(1), Some(at(3)), at(5), 60).unwrap();
    /// assert_eq!((clipped.start, clipped.stop), (at(2), at(4)));
    /// ```
    pub fn clip(
        rise: DateTime<Utc>,
        transit: Option<DateTime<Utc>>,
        set: DateTime<Utc>,
        window_minutes: u32,
    ) -> Option<Period> {
        let transit = match transit {
            Some(t) => t,
            None => return Some(Period::new(rise, set)),
        };

        let half_width = Duration::minutes(i64::from(window_minutes));
        let start = rise.max(transit - half_width);
        let stop = set.min(transit + half_width);
        if start >= stop {
            return None;
        }
        Some(Period::new(start, stop))
    }

    /// [`WindowClipper::clip`] over a computed window.
    ///
    /// `None` when rise or set is [`Circumstance::Never`](super::Circumstance::Never).
    pub fn clip_result(result: &TargetWindowResult, window_minutes: u32) -> Option<Period> {
        let rise = result.rise.time()?;
        let set = result.set.time()?;
        Self::clip(rise, result.transit.time(), set, window_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::target_window::Circumstance;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 16, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_window_inside_rise_set() {
        let clipped = WindowClipper::clip(at(1, 0), Some(at(3, 0)), at(5, 0), 60).unwrap();
        assert_eq!(clipped, Period::new(at(2, 0), at(4, 0)));
    }

    #[test]
    fn test_rise_after_window_end_rejected() {
        assert!(WindowClipper::clip(at(4, 30), Some(at(3, 0)), at(6, 0), 60).is_none());
        // touching at a single instant is no overlap either
        assert!(WindowClipper::clip(at(4, 0), Some(at(3, 0)), at(6, 0), 60).is_none());
    }

    #[test]
    fn test_set_before_window_start_rejected() {
        assert!(WindowClipper::clip(at(0, 0), Some(at(5, 0)), at(3, 30), 60).is_none());
    }

    #[test]
    fn test_partial_overlaps() {
        // rise inside the window, window end inside [rise, set]
        let late_rise = WindowClipper::clip(at(2, 30), Some(at(3, 0)), at(6, 0), 60).unwrap();
        assert_eq!(late_rise, Period::new(at(2, 30), at(4, 0)));

        // early set
        let early_set = WindowClipper::clip(at(0, 0), Some(at(3, 0)), at(3, 20), 60).unwrap();
        assert_eq!(early_set, Period::new(at(2, 0), at(3, 20)));

        // window wider than rise-set on both sides
        let wide = WindowClipper::clip(at(2, 30), Some(at(3, 0)), at(3, 30), 60).unwrap();
        assert_eq!(wide, Period::new(at(2, 30), at(3, 30)));
    }

    #[test]
    fn test_transit_outside_rise_set() {
        // transit before rise but its window still reaches in
        let clipped = WindowClipper::clip(at(2, 0), Some(at(1, 30)), at(5, 0), 60).unwrap();
        assert_eq!(clipped, Period::new(at(2, 0), at(2, 30)));
    }

    #[test]
    fn test_unknown_transit_keeps_interval() {
        let clipped = WindowClipper::clip(at(1, 0), None, at(5, 0), 60).unwrap();
        assert_eq!(clipped, Period::new(at(1, 0), at(5, 0)));
    }

    #[test]
    fn test_clip_result() {
        let result = TargetWindowResult {
            rise: Circumstance::ClippedToWindowStart(at(1, 0)),
            transit: Circumstance::At(at(3, 0)),
            set: Circumstance::At(at(5, 0)),
        };
        assert_eq!(
            WindowClipper::clip_result(&result, 30),
            Some(Period::new(at(2, 30), at(3, 30)))
        );

        let never = TargetWindowResult {
            set: Circumstance::Never,
            ..result
        };
        assert!(WindowClipper::clip_result(&never, 30).is_none());

        let no_transit = TargetWindowResult {
            transit: Circumstance::Never,
            ..result
        };
        assert_eq!(
            WindowClipper::clip_result(&no_transit, 30),
            Some(Period::new(at(1, 0), at(5, 0)))
        );
    }
}
