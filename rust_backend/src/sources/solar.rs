//! Ephemeris-backed altitude source for the Sun.

use chrono::{DateTime, NaiveDate, Utc};

use super::{anticulmination_altitude, culmination_altitude, AltitudeSource};
use crate::astrometry::{Ephemeris, SiderustEphemeris};
use crate::core::domain::Location;
use crate::core::samples::{Sample, SampleSeries};
use crate::error::VisibilityResult;

/// Altitudes of the Sun's centre seen from one location.
///
/// The closed-form checks use the solar declination at `reference`, since
/// unlike a fixed target the Sun's declination changes through the year.
#[derive(Debug, Clone)]
pub struct SolarAltitudes<E = SiderustEphemeris> {
    location: Location,
    ephemeris: E,
    reference: DateTime<Utc>,
}

impl<E: Ephemeris> SolarAltitudes<E> {
    pub fn new(location: Location, ephemeris: E, reference: DateTime<Utc>) -> VisibilityResult<Self> {
        location.validate()?;
        Ok(Self {
            location,
            ephemeris,
            reference,
        })
    }

    fn declination(&self) -> f64 {
        self.ephemeris.sun_declination(self.reference)
    }
}

impl<E: Ephemeris> AltitudeSource for SolarAltitudes<E> {
    fn sample_at(&self, time: DateTime<Utc>) -> VisibilityResult<Sample> {
        let h = self.ephemeris.sun_horizontal(&self.location, time);
        Sample::new(h.altitude, h.azimuth, time)
    }

    fn hourly_samples_for_day(&self, date: NaiveDate) -> VisibilityResult<SampleSeries> {
        self.hourly_samples_from(self.location.local_midnight(date))
    }

    fn ever_rises_at_location(&self) -> bool {
        culmination_altitude(self.location.latitude.value(), self.declination()) > 0.0
    }

    fn is_circumpolar_at_location(&self) -> bool {
        anticulmination_altitude(self.location.latitude.value(), self.declination()) > 0.0
    }
}
