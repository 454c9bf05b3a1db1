//! Time-ordered altitude samples.
//!
//! A [`SampleSeries`] is the unit every bracket strategy and the solver work
//! on. Construction enforces strictly increasing time, so every downstream
//! scan can assume a well-formed, ordered series.

use std::ops::Range;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VisibilityError, VisibilityResult};

/// A single altitude/azimuth observation at an instant.
///
/// Deserialization goes through [`Sample::new`], so out-of-range values are
/// rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SampleRecord")]
pub struct Sample {
    altitude: f64,
    azimuth: f64,
    time: DateTime<Utc>,
}

#[derive(Deserialize)]
struct SampleRecord {
    altitude: f64,
    azimuth: f64,
    time: DateTime<Utc>,
}

impl TryFrom<SampleRecord> for Sample {
    type Error = VisibilityError;

    fn try_from(record: SampleRecord) -> Result<Self, Self::Error> {
        Sample::new(record.altitude, record.azimuth, record.time)
    }
}

impl Sample {
    /// Creates a sample, validating altitude in [-90, 90] and azimuth in [0, 360].
    pub fn new(altitude: f64, azimuth: f64, time: DateTime<Utc>) -> VisibilityResult<Self> {
        if !altitude.is_finite() || !(-90.0..=90.0).contains(&altitude) {
            return Err(VisibilityError::InvalidSample(format!(
                "altitude {} is outside [-90, 90]",
                altitude
            )));
        }
        if !azimuth.is_finite() || !(0.0..=360.0).contains(&azimuth) {
            return Err(VisibilityError::InvalidSample(format!(
                "azimuth {} is outside [0, 360]",
                azimuth
            )));
        }
        Ok(Self {
            altitude,
            azimuth,
            time,
        })
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn azimuth(&self) -> f64 {
        self.azimuth
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Same altitude and azimuth, observed at another instant.
    ///
    /// Used to close a cyclic day: the last sample of a day stands in for the
    /// one preceding the first sample, and vice versa.
    pub fn shifted_to(&self, time: DateTime<Utc>) -> Self {
        Self { time, ..*self }
    }
}

/// Ordered list of at least two samples with strictly increasing time.
///
/// A series of exactly two samples is a *bracket*: the smallest interval the
/// solver still needs to refine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSeries {
    samples: Vec<Sample>,
}

impl SampleSeries {
    /// Builds a validated series.
    ///
    /// # Errors
    ///
    /// `InvalidSeries` if fewer than two samples are given or if any two
    /// consecutive samples do not strictly increase in time.
    pub fn new(samples: Vec<Sample>) -> VisibilityResult<Self> {
        if samples.len() < 2 {
            return Err(VisibilityError::InvalidSeries(format!(
                "a series needs at least 2 samples, got {}",
                samples.len()
            )));
        }

        for (i, pair) in samples.windows(2).enumerate() {
            if pair[1].time <= pair[0].time {
                return Err(VisibilityError::InvalidSeries(format!(
                    "sample {} at {} does not follow sample {} at {}",
                    i + 1,
                    pair[1].time,
                    i,
                    pair[0].time
                )));
            }
        }

        Ok(Self { samples })
    }

    /// Two-sample series.
    pub fn bracket(first: Sample, second: Sample) -> VisibilityResult<Self> {
        Self::new(vec![first, second])
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`: a series holds at least two samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_bracket(&self) -> bool {
        self.samples.len() == 2
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn first(&self) -> &Sample {
        &self.samples[0]
    }

    pub fn last(&self) -> &Sample {
        &self.samples[self.samples.len() - 1]
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.first().time
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.last().time
    }

    /// Span of the series in seconds.
    pub fn interval_seconds(&self) -> f64 {
        (self.end() - self.start()).num_milliseconds() as f64 / 1000.0
    }

    /// Spacing between the first two samples, taken as the series' step.
    pub fn sample_interval(&self) -> Duration {
        self.samples[1].time - self.samples[0].time
    }

    /// First sample holding the highest altitude, with its index.
    pub fn find_max_altitude(&self) -> (usize, &Sample) {
        self.find_extreme(|candidate, best| candidate > best)
    }

    /// First sample holding the lowest altitude, with its index.
    pub fn find_min_altitude(&self) -> (usize, &Sample) {
        self.find_extreme(|candidate, best| candidate < best)
    }

    // Strict comparison keeps the earliest index on ties
    fn find_extreme(&self, better: impl Fn(f64, f64) -> bool) -> (usize, &Sample) {
        let mut best = 0;
        for (i, sample) in self.samples.iter().enumerate().skip(1) {
            if better(sample.altitude, self.samples[best].altitude) {
                best = i;
            }
        }
        (best, &self.samples[best])
    }

    /// Drops a leading strictly-ascending run so the series starts at its
    /// first local maximum.
    ///
    /// # Errors
    ///
    /// `InvalidSeries` if the whole series is strictly ascending.
    pub fn clip_ascending_start(&self) -> VisibilityResult<SampleSeries> {
        let turn = self
            .samples
            .windows(2)
            .position(|pair| pair[1].altitude <= pair[0].altitude)
            .ok_or_else(|| {
                VisibilityError::InvalidSeries(
                    "series is monotonically ascending; nothing left after clipping".to_string(),
                )
            })?;

        if turn == 0 {
            return Ok(self.clone());
        }
        log::trace!("clipping {} leading ascending samples", turn);
        self.slice(turn..self.samples.len())
    }

    /// First bracket crossing `target_altitude`.
    ///
    /// With `descending` the walk starts at the first sample and looks for a
    /// downward crossing; otherwise it starts at the lowest sample and looks
    /// for an upward crossing. Returns `None` when the extremum on that side
    /// never reaches the target.
    pub fn find_span(&self, target_altitude: f64, descending: bool) -> Option<SampleSeries> {
        let (min_index, min_sample) = self.find_min_altitude();
        if min_sample.altitude >= target_altitude {
            return None;
        }

        if descending {
            self.samples
                .windows(2)
                .position(|pair| {
                    pair[0].altitude >= target_altitude && pair[1].altitude < target_altitude
                })
                .map(|i| self.pair_at(i))
        } else {
            self.samples[min_index..]
                .windows(2)
                .position(|pair| {
                    pair[0].altitude < target_altitude && pair[1].altitude >= target_altitude
                })
                .map(|i| self.pair_at(min_index + i))
        }
    }

    /// Bracket made of samples `index` and `index + 1`.
    ///
    /// Panics if `index + 1` is out of bounds; callers derive `index` from
    /// scans over `windows(2)`.
    pub(crate) fn pair_at(&self, index: usize) -> SampleSeries {
        SampleSeries {
            samples: vec![self.samples[index], self.samples[index + 1]],
        }
    }

    /// Sub-series over `range`.
    pub fn slice(&self, range: Range<usize>) -> VisibilityResult<SampleSeries> {
        let samples = self.samples.get(range.clone()).ok_or_else(|| {
            VisibilityError::InvalidArgument(format!(
                "range {:?} is outside a series of {} samples",
                range,
                self.samples.len()
            ))
        })?;
        SampleSeries::new(samples.to_vec())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

impl<'de> Deserialize<'de> for SampleSeries {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            samples: Vec<Sample>,
        }
        let raw = Raw::deserialize(deserializer)?;
        SampleSeries::new(raw.samples).map_err(serde::de::Error::custom)
    }
}
