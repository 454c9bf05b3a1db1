//! Rise, transit and set of a target inside an imaging window.
//!
//! The window is sampled every `target_window.sample_minutes` (10 by
//! default) and scanned for crossings of the horizon profile. Transit is
//! solved separately over the noon-to-noon day containing the window start,
//! so a culmination outside the window is still reported.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithms::{CircumstanceSolver, EventKind};
use crate::config::VisibilityConfig;
use crate::core::domain::{Location, Period, Target};
use crate::core::horizon::HorizonProfile;
use crate::error::{VisibilityError, VisibilityResult};
use crate::sources::{AltitudeSource, TargetAltitudes};

/// Outcome of one event search inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "time", rename_all = "snake_case")]
pub enum Circumstance {
    /// The event happens at this instant.
    At(DateTime<Utc>),
    /// Already above the horizon when the window opens.
    ClippedToWindowStart(DateTime<Utc>),
    /// Still above the horizon when the window closes.
    ClippedToWindowEnd(DateTime<Utc>),
    /// Does not happen in this window.
    Never,
}

impl Circumstance {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        match self {
            Circumstance::At(t)
            | Circumstance::ClippedToWindowStart(t)
            | Circumstance::ClippedToWindowEnd(t) => Some(*t),
            Circumstance::Never => None,
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Circumstance::Never)
    }

    pub fn is_clipped(&self) -> bool {
        matches!(
            self,
            Circumstance::ClippedToWindowStart(_) | Circumstance::ClippedToWindowEnd(_)
        )
    }
}

/// Rise, transit and set of one target for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetWindowResult {
    pub rise: Circumstance,
    pub transit: Circumstance,
    pub set: Circumstance,
}

impl TargetWindowResult {
    pub fn never() -> Self {
        Self {
            rise: Circumstance::Never,
            transit: Circumstance::Never,
            set: Circumstance::Never,
        }
    }

    /// The `[rise, set]` interval, when both ends resolve inside the window.
    pub fn visible_period(&self) -> Option<Period> {
        match (self.rise.time(), self.set.time()) {
            (Some(start), Some(stop)) if start < stop => Some(Period::new(start, stop)),
            _ => None,
        }
    }
}

/// Computes [`TargetWindowResult`]s for one site and horizon.
#[derive(Debug, Clone)]
pub struct TargetWindow<'a> {
    location: &'a Location,
    horizon: &'a HorizonProfile,
    config: &'a VisibilityConfig,
}

impl<'a> TargetWindow<'a> {
    pub fn new(
        location: &'a Location,
        horizon: &'a HorizonProfile,
        config: &'a VisibilityConfig,
    ) -> Self {
        Self {
            location,
            horizon,
            config,
        }
    }

    /// Rise, transit and set of whatever `source` tracks during `window`.
    ///
    /// # Errors
    ///
    /// Precondition violations only: an empty window, an invalid solver
    /// configuration or a source that cannot be sampled. A target that does
    /// not rise is reported as [`Circumstance::Never`].
    pub fn compute<S: AltitudeSource + ?Sized>(
        &self,
        source: &S,
        window: Period,
    ) -> VisibilityResult<TargetWindowResult> {
        if window.stop <= window.start {
            return Err(VisibilityError::InvalidArgument(format!(
                "imaging window {} .. {} is empty",
                window.start, window.stop
            )));
        }
        let solver = CircumstanceSolver::with_settings(source, &self.config.solver)?;

        if !source.ever_rises_at_location() {
            log::debug!("target never rises at this location");
            return Ok(TargetWindowResult::never());
        }

        let transit = self.transit(&solver, source, window.start)?;
        if source.is_circumpolar_at_location() {
            log::debug!("circumpolar target, transit {:?}", transit);
            return Ok(TargetWindowResult {
                rise: Circumstance::Never,
                transit,
                set: Circumstance::Never,
            });
        }

        let step = Duration::minutes(i64::from(self.config.target_window.sample_minutes));
        let series = source.samples_between(window.start, window.stop, step)?;
        let above_minimum = EventKind::AboveMinimum(self.horizon);

        let rise = if above_minimum.excess(series.first()) >= 0.0 {
            Circumstance::ClippedToWindowStart(window.start)
        } else {
            match solver.find_rise_above_minimum(&series, self.horizon)? {
                Some(t) => Circumstance::At(t),
                None => Circumstance::Never,
            }
        };

        let set = match solver.find_set_below_minimum(&series, self.horizon)? {
            Some(t) => Circumstance::At(t),
            None if above_minimum.excess(series.last()) >= 0.0 => {
                Circumstance::ClippedToWindowEnd(window.stop)
            }
            None => Circumstance::Never,
        };

        let result = TargetWindowResult { rise, transit, set };
        log::debug!(
            "window {} .. {}: rise {:?}, transit {:?}, set {:?}",
            window.start,
            window.stop,
            result.rise,
            result.transit,
            result.set
        );
        Ok(result)
    }

    /// Convenience over [`TargetWindow::compute`] using [`SiderustEphemeris`](crate::astrometry::SiderustEphemeris).
    pub fn compute_for_target(
        &self,
        target: &Target,
        window: Period,
    ) -> VisibilityResult<TargetWindowResult> {
        let source = TargetAltitudes::with_default_ephemeris(*self.location, target.clone())?;
        self.compute(&source, window)
    }

    fn transit<S: AltitudeSource + ?Sized>(
        &self,
        solver: &CircumstanceSolver<'_, S>,
        source: &S,
        window_start: DateTime<Utc>,
    ) -> VisibilityResult<Circumstance> {
        let day = source.hourly_samples_from(self.noon_before(window_start))?;
        match solver.find_transit(&day) {
            Ok(t) => Ok(Circumstance::At(t)),
            Err(e) => {
                log::warn!("transit unavailable, reporting never: {}", e);
                Ok(Circumstance::Never)
            }
        }
    }

    /// Latest local noon at or before `time`.
    fn noon_before(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        let noon = self.location.local_noon(self.location.local_date(time));
        if noon > time {
            noon - Duration::days(1)
        } else {
            noon
        }
    }
}
