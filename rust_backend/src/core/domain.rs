//! Domain values shared by the solver and the composition layers.
//!
//! This module provides the observer location, the observed target and the
//! plain time interval used to report visibility windows.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use qtty::{Degrees, Meters};
use serde::{Deserialize, Serialize};

use crate::error::{VisibilityError, VisibilityResult};

/// Latitude of the polar circles. Observers beyond it are not supported.
pub const POLAR_CIRCLE_LATITUDE: f64 = 66.56;

/// Geographic location of an observer.
///
/// # Examples
///
/// ```
/// use tsi_visibility::core::domain::Location;
///
/// let site = Location::new(28.7624, -17.8892, 2396.0).unwrap();
/// assert_eq!(site.latitude.value(), 28.7624);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LocationRecord")]
pub struct Location {
    pub latitude: Degrees,
    pub longitude: Degrees,
    pub elevation: Meters,
}

#[derive(Deserialize)]
struct LocationRecord {
    latitude: Degrees,
    longitude: Degrees,
    elevation: Meters,
}

impl TryFrom<LocationRecord> for Location {
    type Error = VisibilityError;

    fn try_from(record: LocationRecord) -> Result<Self, Self::Error> {
        let location = Location {
            latitude: record.latitude,
            longitude: record.longitude,
            elevation: record.elevation,
        };
        location.validate()?;
        Ok(location)
    }
}

impl Location {
    /// Creates a validated location.
    ///
    /// # Arguments
    ///
    /// * `latitude` - Degrees north, must lie between the polar circles
    /// * `longitude` - Degrees east, within ±180
    /// * `elevation_m` - Height above sea level in meters
    pub fn new(latitude: f64, longitude: f64, elevation_m: f64) -> VisibilityResult<Self> {
        let location = Self {
            latitude: Degrees::new(latitude),
            longitude: Degrees::new(longitude),
            elevation: Meters::new(elevation_m),
        };
        location.validate()?;
        Ok(location)
    }

    /// Checks the ranges enforced by [`Location::new`] and by deserialization.
    ///
    /// The fields are public, so locations assembled by hand should be
    /// validated before use.
    pub fn validate(&self) -> VisibilityResult<()> {
        let lat = self.latitude.value();
        let lon = self.longitude.value();

        if !lat.is_finite() || lat.abs() > 90.0 {
            return Err(VisibilityError::InvalidArgument(format!(
                "latitude {} is outside [-90, 90]",
                lat
            )));
        }
        if lat.abs() > POLAR_CIRCLE_LATITUDE {
            return Err(VisibilityError::InvalidArgument(format!(
                "latitude {} is beyond the polar circle; such locations are not supported",
                lat
            )));
        }
        if !lon.is_finite() || lon.abs() > 180.0 {
            return Err(VisibilityError::InvalidArgument(format!(
                "longitude {} is outside [-180, 180]",
                lon
            )));
        }
        if !self.elevation.value().is_finite() {
            return Err(VisibilityError::InvalidArgument(
                "elevation must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Offset of local mean solar time from UTC (longitude / 15 hours).
    pub fn local_offset(&self) -> FixedOffset {
        let seconds = (self.longitude.value() * 240.0).round() as i32;
        // |longitude| <= 180 keeps this within ±12 h, so the fallback is unreachable
        FixedOffset::east_opt(seconds).unwrap_or(Utc.fix())
    }

    /// Local mean midnight at the start of `date`, as a UTC instant.
    pub fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        self.local_instant(date, NaiveTime::MIN)
    }

    /// Local mean noon of `date`, as a UTC instant.
    pub fn local_noon(&self, date: NaiveDate) -> DateTime<Utc> {
        self.local_midnight(date) + Duration::hours(12)
    }

    /// Calendar date at `time` in local mean solar time.
    pub fn local_date(&self, time: DateTime<Utc>) -> NaiveDate {
        time.with_timezone(&self.local_offset()).date_naive()
    }

    fn local_instant(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        let offset_seconds = i64::from(self.local_offset().local_minus_utc());
        Utc.from_utc_datetime(&naive) - Duration::seconds(offset_seconds)
    }
}

/// Equatorial coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinatesRecord")]
pub struct EquatorialCoordinates {
    pub ra: Degrees,
    pub dec: Degrees,
}

#[derive(Deserialize)]
struct CoordinatesRecord {
    ra: Degrees,
    dec: Degrees,
}

impl TryFrom<CoordinatesRecord> for EquatorialCoordinates {
    type Error = VisibilityError;

    fn try_from(record: CoordinatesRecord) -> Result<Self, Self::Error> {
        EquatorialCoordinates::new(record.ra.value(), record.dec.value())
    }
}

impl EquatorialCoordinates {
    /// Creates coordinates, validating `ra` in [0, 360) and `dec` in [-90, 90].
    pub fn new(ra_deg: f64, dec_deg: f64) -> VisibilityResult<Self> {
        if !ra_deg.is_finite() || !(0.0..360.0).contains(&ra_deg) {
            return Err(VisibilityError::InvalidArgument(format!(
                "right ascension {} is outside [0, 360)",
                ra_deg
            )));
        }
        if !dec_deg.is_finite() || dec_deg.abs() > 90.0 {
            return Err(VisibilityError::InvalidArgument(format!(
                "declination {} is outside [-90, 90]",
                dec_deg
            )));
        }
        Ok(Self {
            ra: Degrees::new(ra_deg),
            dec: Degrees::new(dec_deg),
        })
    }

    /// Creates coordinates from right ascension in hours.
    pub fn from_hours(ra_hours: f64, dec_deg: f64) -> VisibilityResult<Self> {
        Self::new(ra_hours * 15.0, dec_deg)
    }
}

/// Equinox the target coordinates refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Epoch {
    J2000,
    OfDate,
}

/// Observed target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub coordinates: EquatorialCoordinates,
    pub epoch: Epoch,
}

impl Target {
    pub fn new(name: impl Into<String>, coordinates: EquatorialCoordinates, epoch: Epoch) -> Self {
        Self {
            name: name.into(),
            coordinates,
            epoch,
        }
    }

    /// Catalog (J2000) target.
    pub fn j2000(name: impl Into<String>, ra_deg: f64, dec_deg: f64) -> VisibilityResult<Self> {
        Ok(Self::new(
            name,
            EquatorialCoordinates::new(ra_deg, dec_deg)?,
            Epoch::J2000,
        ))
    }
}

/// Represents a single time period with start and stop instants.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tsi_visibility::core::domain::Period;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
/// let stop = Utc.with_ymd_and_hms(2024, 1, 16, 8, 0, 0).unwrap();
/// let period = Period::new(start, stop);
///
/// assert_eq!(period.duration_hours(), 12.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        Self { start, stop }
    }

    pub fn duration(&self) -> Duration {
        self.stop - self.start
    }

    /// Returns the duration of this period in hours.
    pub fn duration_hours(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / 3_600_000.0
    }

    /// `true` if `time` lies within `[start, stop]`.
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time <= self.stop
    }

    /// `true` if the two periods share more than a single instant.
    pub fn overlaps(&self, other: &Period) -> bool {
        self.start < other.stop && other.start < self.stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_rejects_polar_latitudes() {
        assert!(Location::new(70.0, 10.0, 0.0).is_err());
        assert!(Location::new(-67.0, 10.0, 0.0).is_err());
        assert!(Location::new(91.0, 10.0, 0.0).is_err());
        assert!(Location::new(56.5, 10.0, 0.0).is_ok());
    }

    #[test]
    fn test_location_rejects_bad_longitude() {
        assert!(Location::new(10.0, 181.0, 0.0).is_err());
        assert!(Location::new(10.0, f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_local_offset_from_longitude() {
        let east = Location::new(0.0, 15.0, 0.0).unwrap();
        assert_eq!(east.local_offset().local_minus_utc(), 3600);

        let west = Location::new(0.0, -90.0, 0.0).unwrap();
        assert_eq!(west.local_offset().local_minus_utc(), -6 * 3600);
    }

    #[test]
    fn test_local_noon_and_midnight() {
        let site = Location::new(35.0, -105.0, 0.0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert_eq!(
            site.local_midnight(date),
            Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap()
        );
        assert_eq!(
            site.local_noon(date),
            Utc.with_ymd_and_hms(2024, 3, 1, 19, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_local_date() {
        let site = Location::new(35.0, -105.0, 0.0).unwrap();
        let time = Utc.with_ymd_and_hms(2024, 3, 2, 3, 0, 0).unwrap();
        assert_eq!(site.local_date(time), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(EquatorialCoordinates::new(360.0, 0.0).is_err());
        assert!(EquatorialCoordinates::new(10.0, -91.0).is_err());

        let c = EquatorialCoordinates::from_hours(5.5, -5.4).unwrap();
        assert_eq!(c.ra.value(), 82.5);
    }

    #[test]
    fn test_period_queries() {
        let a = Period::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap(),
        );
        let b = Period::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 2, 0, 0).unwrap(),
        );
        let c = Period::new(a.stop, b.stop);

        assert_eq!(a.duration_hours(), 3.0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.contains(a.stop));
    }

    #[test]
    fn test_deserialize_checks_ranges() {
        let site = Location::new(28.76, -17.89, 2396.0).unwrap();
        let json = serde_json::to_string(&site).unwrap();
        assert_eq!(serde_json::from_str::<Location>(&json).unwrap(), site);

        let polar = json.replace("28.76", "78.2");
        assert!(serde_json::from_str::<Location>(&polar).is_err());

        let m42 = Target::j2000("M42", 83.82, -5.39).unwrap();
        let json = serde_json::to_string(&m42).unwrap();
        assert_eq!(serde_json::from_str::<Target>(&json).unwrap(), m42);

        let bad_dec = json.replace("-5.39", "-95.0");
        assert!(serde_json::from_str::<Target>(&bad_dec).is_err());
        let bad_ra = json.replace("83.82", "400.0");
        assert!(serde_json::from_str::<Target>(&bad_ra).is_err());
    }
}
