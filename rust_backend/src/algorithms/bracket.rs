//! Bracket location for rise, set, horizon crossings and transit.
//!
//! Every strategy is a variant of [`EventKind`] and goes through [`locate`].
//! Crossing events share one scan parameterised by direction and threshold;
//! transit brackets the highest sample.
//!
//! A full day of samples is a closed loop, so a [`SeriesShape::Cyclic`]
//! series also considers the interval between its last and first sample.
//! That interval is represented by a synthetic sample: the first (or last)
//! sample moved one sample interval past the end (or before the start).

use crate::core::horizon::HorizonProfile;
use crate::core::samples::{Sample, SampleSeries};
use crate::error::{VisibilityError, VisibilityResult};

/// Event a bracket is searched for.
#[derive(Debug, Clone, Copy)]
pub enum EventKind<'a> {
    /// Upward crossing of the geometric horizon.
    Rising,
    /// Downward crossing of the geometric horizon.
    Setting,
    /// Upward crossing of a horizon profile.
    AboveMinimum(&'a HorizonProfile),
    /// Downward crossing of a horizon profile.
    BelowMinimum(&'a HorizonProfile),
    /// Maximum altitude.
    Transit,
}

/// Whether the series wraps around (a full day) or is an open interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesShape {
    Cyclic,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Up,
    Down,
}

impl<'a> EventKind<'a> {
    pub(crate) fn direction(&self) -> Option<Direction> {
        match self {
            EventKind::Rising | EventKind::AboveMinimum(_) => Some(Direction::Up),
            EventKind::Setting | EventKind::BelowMinimum(_) => Some(Direction::Down),
            EventKind::Transit => None,
        }
    }

    /// Altitude threshold at `azimuth`. Zero for transit and plain rise/set.
    pub fn threshold_at(&self, azimuth: f64) -> f64 {
        match self {
            EventKind::AboveMinimum(profile) | EventKind::BelowMinimum(profile) => {
                profile.threshold_at(azimuth)
            }
            _ => 0.0,
        }
    }

    /// Signed distance of a sample above this event's threshold.
    pub fn excess(&self, sample: &Sample) -> f64 {
        sample.altitude() - self.threshold_at(sample.azimuth())
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Rising => "rising",
            EventKind::Setting => "setting",
            EventKind::AboveMinimum(_) => "rise above minimum",
            EventKind::BelowMinimum(_) => "set below minimum",
            EventKind::Transit => "transit",
        }
    }
}

/// The last sample, moved to one sample interval before the first.
pub fn wrap_before_first(series: &SampleSeries) -> Sample {
    series
        .last()
        .shifted_to(series.start() - series.sample_interval())
}

/// The first sample, moved to one sample interval after the last.
pub fn wrap_after_last(series: &SampleSeries) -> Sample {
    series
        .first()
        .shifted_to(series.end() + series.sample_interval())
}

/// Finds the two-sample bracket containing `kind`, if any.
///
/// # Errors
///
/// `InvalidSeries` when transit is requested on fewer than three samples.
pub fn locate(
    series: &SampleSeries,
    kind: &EventKind,
    shape: SeriesShape,
) -> VisibilityResult<Option<SampleSeries>> {
    let found = match kind.direction() {
        Some(direction) => locate_crossing(series, kind, direction, shape)?,
        None => Some(locate_transit(series, shape)?),
    };

    if let Some(bracket) = &found {
        log::trace!(
            "{} bracket {} .. {} in {} samples",
            kind.name(),
            bracket.start(),
            bracket.end(),
            series.len()
        );
    }
    Ok(found)
}

fn crosses(kind: &EventKind, direction: Direction, a: &Sample, b: &Sample) -> bool {
    let (ea, eb) = (kind.excess(a), kind.excess(b));
    match direction {
        Direction::Up => ea < 0.0 && eb >= 0.0,
        Direction::Down => ea >= 0.0 && eb < 0.0,
    }
}

fn locate_crossing(
    series: &SampleSeries,
    kind: &EventKind,
    direction: Direction,
    shape: SeriesShape,
) -> VisibilityResult<Option<SampleSeries>> {
    let samples = series.samples();
    let n = samples.len();
    let crossing_at = |i: usize| crosses(kind, direction, &samples[i], &samples[i + 1]);

    // Earliest crossing in either direction: a target that sets, climbs back
    // and sets again must report the first set
    let index = (0..n - 1).find(|&i| crossing_at(i));

    if let Some(i) = index {
        return Ok(Some(series.pair_at(i)));
    }

    if shape == SeriesShape::Cyclic {
        let synthetic = wrap_after_last(series);
        if crosses(kind, direction, series.last(), &synthetic) {
            return SampleSeries::bracket(*series.last(), synthetic).map(Some);
        }
    }
    Ok(None)
}

fn locate_transit(series: &SampleSeries, shape: SeriesShape) -> VisibilityResult<SampleSeries> {
    let n = series.len();
    if n < 3 {
        return Err(VisibilityError::InvalidSeries(format!(
            "transit needs at least 3 samples, got {}",
            n
        )));
    }

    let samples = series.samples();
    let (max_index, _) = series.find_max_altitude();
    match (max_index, shape) {
        (0, SeriesShape::Cyclic) => SampleSeries::bracket(wrap_before_first(series), samples[1]),
        (0, SeriesShape::Open) => Ok(series.pair_at(0)),
        (i, SeriesShape::Cyclic) if i == n - 1 => {
            SampleSeries::bracket(samples[n - 2], wrap_after_last(series))
        }
        (i, SeriesShape::Open) if i == n - 1 => Ok(series.pair_at(n - 2)),
        (i, _) => SampleSeries::bracket(samples[i - 1], samples[i + 1]),
    }
}
