//! Ephemeris seam backed by the `siderust` astronomy library.
//!
//! The solver never talks to siderust directly: it goes through the
//! [`Ephemeris`] trait so that tests and callers can plug in other sources.

use chrono::{DateTime, Utc};
use qtty::{AstronomicalUnit, AstronomicalUnits, Degrees};
use siderust::astro::precession::precess_from_j2000;
use siderust::astro::JulianDate;
use siderust::bodies::solar_system::Sun;
use siderust::coordinates::cartesian;
use siderust::coordinates::centers::{ObserverSite, Topocentric};
use siderust::coordinates::frames;
use siderust::coordinates::spherical::position;
use siderust::coordinates::transform::Transform;

use crate::core::domain::{Epoch, Location, Target};

/// Altitude/azimuth pair in degrees. Azimuth runs from north through east.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalCoordinates {
    pub altitude: f64,
    pub azimuth: f64,
}

/// Evaluates where a target or the Sun stands in an observer's sky.
pub trait Ephemeris: Send + Sync {
    /// Geometric altitude/azimuth of a fixed target at `time`.
    fn target_horizontal(
        &self,
        location: &Location,
        target: &Target,
        time: DateTime<Utc>,
    ) -> HorizontalCoordinates;

    /// Altitude/azimuth of the Sun's centre at `time`.
    fn sun_horizontal(&self, location: &Location, time: DateTime<Utc>) -> HorizontalCoordinates;

    /// Apparent declination of the Sun at `time`, in degrees.
    fn sun_declination(&self, time: DateTime<Utc>) -> f64;
}

/// Ephemeris computed with siderust (VSOP87 Sun, IAU precession and nutation).
///
/// Refraction is not applied; the sunset altitude constant accounts for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiderustEphemeris;

impl SiderustEphemeris {
    fn observer_site(location: &Location) -> ObserverSite {
        ObserverSite::new(location.longitude, location.latitude, location.elevation)
    }
}

impl Ephemeris for SiderustEphemeris {
    fn target_horizontal(
        &self,
        location: &Location,
        target: &Target,
        time: DateTime<Utc>,
    ) -> HorizontalCoordinates {
        let jd = JulianDate::from_utc(time);
        let ra: Degrees = target.coordinates.ra;
        let dec: Degrees = target.coordinates.dec;
        // Fixed targets sit at an arbitrary unit distance; only the direction matters
        let distance = AstronomicalUnits::new(1.0);

        let mean_of_date = match target.epoch {
            Epoch::J2000 => precess_from_j2000(
                position::EquatorialMeanJ2000::<AstronomicalUnit>::new(ra, dec, distance),
                jd,
            ),
            Epoch::OfDate => position::EquatorialMeanOfDate::<AstronomicalUnit>::new(ra, dec, distance),
        };

        let geocentric = mean_of_date.to_cartesian();
        let equatorial =
            cartesian::Position::<Topocentric, frames::EquatorialMeanOfDate, AstronomicalUnit>::new_with_params(
                Self::observer_site(location),
                geocentric.x(),
                geocentric.y(),
                geocentric.z(),
            );
        let horizontal: cartesian::Position<Topocentric, frames::Horizontal, AstronomicalUnit> =
            equatorial.transform(jd);

        // siderust's horizontal frame: x north, y west, z zenith
        let r = horizontal.distance().value();
        let (x, y, z) = (
            horizontal.x().value(),
            horizontal.y().value(),
            horizontal.z().value(),
        );
        HorizontalCoordinates {
            altitude: (z / r).clamp(-1.0, 1.0).asin().to_degrees(),
            azimuth: (-y).atan2(x).to_degrees().rem_euclid(360.0),
        }
    }

    fn sun_horizontal(&self, location: &Location, time: DateTime<Utc>) -> HorizontalCoordinates {
        let jd = JulianDate::from_utc(time);
        let sun = Sun::get_horizontal::<AstronomicalUnit>(jd, Self::observer_site(location));
        HorizontalCoordinates {
            altitude: sun.alt().value(),
            azimuth: sun.az().value(),
        }
    }

    fn sun_declination(&self, time: DateTime<Utc>) -> f64 {
        let jd = JulianDate::from_utc(time);
        Sun::get_apparent_geocentric_equ::<AstronomicalUnit>(jd)
            .dec()
            .value()
    }
}
