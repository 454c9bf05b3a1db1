//! Altitude sources.
//!
//! An [`AltitudeSource`] is the only way the solver learns anything about
//! the sky: it produces coarse day samples, densifies a bracket and answers
//! the cheap closed-form "does it ever rise" questions. Production code uses
//! an ephemeris-backed source; solver tests use [`LinearAltitudes`].

pub mod linear;
pub mod solar;
pub mod target;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::core::samples::{Sample, SampleSeries};
use crate::error::{VisibilityError, VisibilityResult};

pub use linear::LinearAltitudes;
pub use solar::SolarAltitudes;
pub use target::TargetAltitudes;

/// Number of samples in a coarse day series.
pub const HOURS_PER_DAY: i64 = 24;

/// Pluggable evaluator of altitude samples.
pub trait AltitudeSource {
    /// Altitude and azimuth at `time`.
    fn sample_at(&self, time: DateTime<Utc>) -> VisibilityResult<Sample>;

    /// Densifies a two-sample bracket with `points` interior samples.
    ///
    /// The interior instants split the bracket evenly; the original endpoints
    /// are kept as they are and never re-evaluated.
    fn refine(&self, bracket: &SampleSeries, points: usize) -> VisibilityResult<SampleSeries> {
        let instants = interior_instants(bracket, points)?;
        let mut samples = Vec::with_capacity(points + 2);
        samples.push(*bracket.first());
        for time in instants {
            samples.push(self.sample_at(time)?);
        }
        samples.push(*bracket.last());
        SampleSeries::new(samples)
    }

    /// Samples from `start` to `end` inclusive, spaced at most `step` apart.
    ///
    /// Built by refining the two boundary samples.
    fn samples_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
    ) -> VisibilityResult<SampleSeries> {
        if end <= start {
            return Err(VisibilityError::InvalidArgument(format!(
                "sampling span {} .. {} is empty",
                start, end
            )));
        }
        if step <= Duration::zero() {
            return Err(VisibilityError::InvalidArgument(
                "sampling step must be positive".to_string(),
            ));
        }

        let bracket = SampleSeries::bracket(self.sample_at(start)?, self.sample_at(end)?)?;
        self.refine(&bracket, interior_points_for_step(&bracket, step))
    }

    /// Twenty-four samples, one per hour, starting at `start`.
    fn hourly_samples_from(&self, start: DateTime<Utc>) -> VisibilityResult<SampleSeries> {
        let samples = (0..HOURS_PER_DAY)
            .map(|hour| self.sample_at(start + Duration::hours(hour)))
            .collect::<VisibilityResult<Vec<_>>>()?;
        SampleSeries::new(samples)
    }

    /// Twenty-four hourly samples from local midnight of `date`.
    fn hourly_samples_for_day(&self, date: NaiveDate) -> VisibilityResult<SampleSeries>;

    /// `true` if the object reaches a positive altitude at some point of the day.
    fn ever_rises_at_location(&self) -> bool;

    /// `true` if the object never sets.
    fn is_circumpolar_at_location(&self) -> bool;
}

/// Interior points needed so that samples end up at most `step` apart.
pub(crate) fn interior_points_for_step(bracket: &SampleSeries, step: Duration) -> usize {
    let span_ms = (bracket.end() - bracket.start()).num_milliseconds();
    let step_ms = step.num_milliseconds().max(1);
    let intervals = ((span_ms + step_ms - 1) / step_ms).max(1);
    (intervals - 1) as usize
}

/// Evenly spaced instants strictly inside a bracket.
pub(crate) fn interior_instants(
    bracket: &SampleSeries,
    points: usize,
) -> VisibilityResult<Vec<DateTime<Utc>>> {
    if !bracket.is_bracket() {
        return Err(VisibilityError::InvalidArgument(format!(
            "refine expects a two-sample bracket, got {} samples",
            bracket.len()
        )));
    }

    let span = bracket.end() - bracket.start();
    let span_ns = span
        .num_nanoseconds()
        .ok_or_else(|| VisibilityError::InvalidArgument("bracket span is too long".to_string()))?;
    let divisions = points as i64 + 1;
    if span_ns < divisions {
        return Err(VisibilityError::InvalidArgument(format!(
            "cannot place {} points inside a {} ns bracket",
            points, span_ns
        )));
    }

    Ok((1..=points as i64)
        .map(|k| {
            // k * span / divisions without overflowing i64 for long spans
            let offset = (i128::from(span_ns) * i128::from(k) / i128::from(divisions)) as i64;
            bracket.start() + Duration::nanoseconds(offset)
        })
        .collect())
}

/// Highest altitude an object of declination `dec` reaches at latitude `lat`.
pub(crate) fn culmination_altitude(latitude: f64, declination: f64) -> f64 {
    90.0 - (latitude - declination).abs()
}

/// Lowest altitude an object of declination `dec` reaches at latitude `lat`.
pub(crate) fn anticulmination_altitude(latitude: f64, declination: f64) -> f64 {
    (latitude + declination).abs() - 90.0
}
