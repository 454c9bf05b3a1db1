//! Iterative refinement of event brackets.
//!
//! The solver takes a two-sample bracket known to contain an event and
//! repeatedly asks its [`AltitudeSource`] for denser samples inside it,
//! re-locating the event each round, until the bracket is no wider than the
//! configured tolerance. Round widths default to 10 min, 1 min, 10 s, 2 s
//! and 1 s.

use chrono::{DateTime, Duration, Utc};

use crate::algorithms::bracket::{self, EventKind, SeriesShape};
use crate::config::SolverSettings;
use crate::core::horizon::HorizonProfile;
use crate::core::samples::SampleSeries;
use crate::error::{VisibilityError, VisibilityResult};
use crate::sources::AltitudeSource;

/// Rise, set, horizon-crossing and transit solver over one altitude source.
pub struct CircumstanceSolver<'a, S: AltitudeSource + ?Sized> {
    source: &'a S,
    tolerance_seconds: u32,
    round_seconds: Vec<u32>,
}

impl<'a, S: AltitudeSource + ?Sized> CircumstanceSolver<'a, S> {
    /// Solver with the default refinement rounds.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `tolerance_seconds` is zero.
    pub fn new(source: &'a S, tolerance_seconds: u32) -> VisibilityResult<Self> {
        let settings = SolverSettings {
            tolerance_seconds,
            ..SolverSettings::default()
        };
        Self::with_settings(source, &settings)
    }

    pub fn with_settings(source: &'a S, settings: &SolverSettings) -> VisibilityResult<Self> {
        if settings.tolerance_seconds < 1 {
            return Err(VisibilityError::InvalidArgument(format!(
                "solver tolerance must be at least 1 second, got {}",
                settings.tolerance_seconds
            )));
        }
        if settings.round_seconds.iter().any(|&r| r == 0) {
            return Err(VisibilityError::InvalidArgument(
                "refinement round widths must be positive".to_string(),
            ));
        }

        Ok(Self {
            source,
            tolerance_seconds: settings.tolerance_seconds,
            round_seconds: settings.round_seconds.clone(),
        })
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn tolerance_seconds(&self) -> u32 {
        self.tolerance_seconds
    }

    /// Width of a two-sample bracket in seconds.
    pub fn get_step_interval(&self, bracket: &SampleSeries) -> VisibilityResult<f64> {
        if !bracket.is_bracket() {
            return Err(VisibilityError::InvalidArgument(format!(
                "step interval needs exactly 2 samples, got {}",
                bracket.len()
            )));
        }
        Ok(bracket.interval_seconds())
    }

    /// First upward crossing of the geometric horizon in a day series.
    pub fn find_rising(&self, series: &SampleSeries) -> VisibilityResult<Option<DateTime<Utc>>> {
        self.find(series, &EventKind::Rising, SeriesShape::Cyclic)
    }

    /// Downward crossing of the geometric horizon in a day series.
    pub fn find_setting(&self, series: &SampleSeries) -> VisibilityResult<Option<DateTime<Utc>>> {
        self.find(series, &EventKind::Setting, SeriesShape::Cyclic)
    }

    /// First instant the object climbs above `horizon` inside a window.
    pub fn find_rise_above_minimum(
        &self,
        series: &SampleSeries,
        horizon: &HorizonProfile,
    ) -> VisibilityResult<Option<DateTime<Utc>>> {
        self.find(series, &EventKind::AboveMinimum(horizon), SeriesShape::Open)
    }

    /// Instant the object drops below `horizon` inside a window.
    pub fn find_set_below_minimum(
        &self,
        series: &SampleSeries,
        horizon: &HorizonProfile,
    ) -> VisibilityResult<Option<DateTime<Utc>>> {
        self.find(series, &EventKind::BelowMinimum(horizon), SeriesShape::Open)
    }

    /// Instant of maximum altitude in a day series.
    ///
    /// # Errors
    ///
    /// `InvalidSeries` for fewer than three samples and `DegenerateGeometry`
    /// when no sample is above the horizon.
    pub fn find_transit(&self, series: &SampleSeries) -> VisibilityResult<DateTime<Utc>> {
        if series.len() < 3 {
            return Err(VisibilityError::InvalidSeries(format!(
                "transit needs at least 3 samples, got {}",
                series.len()
            )));
        }
        let (_, highest) = series.find_max_altitude();
        if highest.altitude() <= 0.0 {
            return Err(VisibilityError::DegenerateGeometry(format!(
                "object never rises (highest sample {:.2}°), transit is undefined",
                highest.altitude()
            )));
        }

        self.find(series, &EventKind::Transit, SeriesShape::Cyclic)?
            .ok_or_else(|| VisibilityError::DegenerateGeometry("no transit bracket".to_string()))
    }

    fn find(
        &self,
        series: &SampleSeries,
        kind: &EventKind,
        shape: SeriesShape,
    ) -> VisibilityResult<Option<DateTime<Utc>>> {
        match bracket::locate(series, kind, shape)? {
            Some(found) => self.solve(found, kind).map(Some),
            None => Ok(None),
        }
    }

    /// Refines `bracket` until it is within tolerance and returns the event time.
    ///
    /// Crossing times are interpolated linearly inside the final bracket;
    /// transit is its midpoint.
    pub fn solve(&self, bracket: SampleSeries, kind: &EventKind) -> VisibilityResult<DateTime<Utc>> {
        let refined = self.refine_bracket(bracket, kind)?;
        Ok(event_time(&refined, kind))
    }

    /// Narrows `bracket` round by round until it spans at most the tolerance.
    pub fn refine_bracket(
        &self,
        bracket: SampleSeries,
        kind: &EventKind,
    ) -> VisibilityResult<SampleSeries> {
        let tolerance = f64::from(self.tolerance_seconds);
        let mut current = bracket;
        let mut round = 0usize;

        loop {
            let width = self.get_step_interval(&current)?;
            if width <= tolerance {
                log::debug!(
                    "{} converged after {} rounds: {} .. {}",
                    kind.name(),
                    round,
                    current.start(),
                    current.end()
                );
                return Ok(current);
            }

            let target = self.round_target(width).max(tolerance);
            // transit keeps the two flanks of the peak, i.e. two sub-intervals
            let spans = if matches!(kind, EventKind::Transit) { 2.0 } else { 1.0 };
            let points = ((spans * width / target).ceil() as usize).saturating_sub(1).max(1);

            let dense = self.source.refine(&current, points)?;
            let next = bracket::locate(&dense, kind, SeriesShape::Open)?.ok_or_else(|| {
                VisibilityError::DegenerateGeometry(format!(
                    "{} bracket lost while refining {} .. {}",
                    kind.name(),
                    current.start(),
                    current.end()
                ))
            })?;

            let next_width = next.interval_seconds();
            if next_width >= width {
                return Err(VisibilityError::DegenerateGeometry(format!(
                    "{} refinement stalled at {:.3} s",
                    kind.name(),
                    width
                )));
            }

            round += 1;
            log::debug!(
                "{} round {}: {} points, {:.1} s -> {:.1} s",
                kind.name(),
                round,
                points,
                width,
                next_width
            );
            current = next;
        }
    }

    fn round_target(&self, width: f64) -> f64 {
        self.round_seconds
            .iter()
            .map(|&r| f64::from(r))
            .find(|&r| r < width)
            .unwrap_or(f64::from(self.tolerance_seconds))
    }
}

fn event_time(bracket: &SampleSeries, kind: &EventKind) -> DateTime<Utc> {
    let (a, b) = (bracket.first(), bracket.last());
    let fraction = match kind.direction() {
        Some(_) => {
            let (ea, eb) = (kind.excess(a), kind.excess(b));
            if ea == eb {
                0.5
            } else {
                (ea / (ea - eb)).clamp(0.0, 1.0)
            }
        }
        None => 0.5,
    };
    let span_ms = (b.time() - a.time()).num_milliseconds() as f64;
    a.time() + Duration::milliseconds((span_ms * fraction).round() as i64)
}
