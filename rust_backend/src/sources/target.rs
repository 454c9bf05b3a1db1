//! Ephemeris-backed altitude source for a fixed target.

use chrono::{DateTime, NaiveDate, Utc};

use super::{anticulmination_altitude, culmination_altitude, AltitudeSource};
use crate::astrometry::{Ephemeris, SiderustEphemeris};
use crate::core::domain::{Location, Target};
use crate::core::samples::{Sample, SampleSeries};
use crate::error::VisibilityResult;

/// Altitudes of a deep-sky target seen from one location.
#[derive(Debug, Clone)]
pub struct TargetAltitudes<E = SiderustEphemeris> {
    location: Location,
    target: Target,
    ephemeris: E,
}

impl TargetAltitudes<SiderustEphemeris> {
    /// Source backed by [`SiderustEphemeris`].
    pub fn with_default_ephemeris(location: Location, target: Target) -> VisibilityResult<Self> {
        Self::new(location, target, SiderustEphemeris)
    }
}

impl<E: Ephemeris> TargetAltitudes<E> {
    pub fn new(location: Location, target: Target, ephemeris: E) -> VisibilityResult<Self> {
        location.validate()?;
        Ok(Self {
            location,
            target,
            ephemeris,
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

impl<E: Ephemeris> AltitudeSource for TargetAltitudes<E> {
    fn sample_at(&self, time: DateTime<Utc>) -> VisibilityResult<Sample> {
        let h = self
            .ephemeris
            .target_horizontal(&self.location, &self.target, time);
        Sample::new(h.altitude, h.azimuth, time)
    }

    fn hourly_samples_for_day(&self, date: NaiveDate) -> VisibilityResult<SampleSeries> {
        self.hourly_samples_from(self.location.local_midnight(date))
    }

    fn ever_rises_at_location(&self) -> bool {
        culmination_altitude(
            self.location.latitude.value(),
            self.target.coordinates.dec.value(),
        ) > 0.0
    }

    fn is_circumpolar_at_location(&self) -> bool {
        anticulmination_altitude(
            self.location.latitude.value(),
            self.target.coordinates.dec.value(),
        ) > 0.0
    }
}
