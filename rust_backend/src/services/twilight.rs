//! Civil, nautical and astronomical twilight and astronomical night.
//!
//! Each level is the period during which the Sun's centre stays below its
//! altitude threshold: the refraction-adjusted sunset altitude for civil,
//! then −6°, −12° and −18°. Circumstances are anchored on local mean noon so
//! one value describes one dusk-to-dawn night.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::twilight_cache::{TwilightCache, TwilightKey};
use crate::algorithms::{CircumstanceSolver, EventKind};
use crate::astrometry::{Ephemeris, SiderustEphemeris};
use crate::config::VisibilityConfig;
use crate::core::domain::{Location, Period};
use crate::core::horizon::HorizonProfile;
use crate::core::samples::SampleSeries;
use crate::error::{VisibilityError, VisibilityResult};
use crate::sources::{AltitudeSource, SolarAltitudes};

pub const NAUTICAL_ALTITUDE: f64 = -6.0;
pub const ASTRONOMICAL_ALTITUDE: f64 = -12.0;
pub const NIGHT_ALTITUDE: f64 = -18.0;

/// Nested twilight bands, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwilightLevel {
    Civil,
    Nautical,
    Astronomical,
    Night,
}

impl TwilightLevel {
    pub const ALL: [TwilightLevel; 4] = [
        TwilightLevel::Civil,
        TwilightLevel::Nautical,
        TwilightLevel::Astronomical,
        TwilightLevel::Night,
    ];

    /// Solar altitude the level starts below.
    pub fn sun_altitude(&self, sunset_altitude: f64) -> f64 {
        match self {
            TwilightLevel::Civil => sunset_altitude,
            TwilightLevel::Nautical => NAUTICAL_ALTITUDE,
            TwilightLevel::Astronomical => ASTRONOMICAL_ALTITUDE,
            TwilightLevel::Night => NIGHT_ALTITUDE,
        }
    }
}

/// Dusk-to-dawn periods of one night. A level that is not reached is `None`,
/// and so is every level inside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwilightCircumstances {
    pub civil: Option<Period>,
    pub nautical: Option<Period>,
    pub astronomical: Option<Period>,
    pub night: Option<Period>,
}

impl TwilightCircumstances {
    /// Builds circumstances, dropping any level whose enclosing level is absent.
    pub fn nested(
        civil: Option<Period>,
        nautical: Option<Period>,
        astronomical: Option<Period>,
        night: Option<Period>,
    ) -> Self {
        let nautical = civil.and(nautical);
        let astronomical = nautical.and(astronomical);
        let night = astronomical.and(night);
        Self {
            civil,
            nautical,
            astronomical,
            night,
        }
    }

    pub fn civil(&self) -> Option<Period> {
        self.civil
    }

    pub fn nautical(&self) -> Option<Period> {
        self.nautical
    }

    pub fn astronomical(&self) -> Option<Period> {
        self.astronomical
    }

    pub fn night(&self) -> Option<Period> {
        self.night
    }

    pub fn period(&self, level: TwilightLevel) -> Option<Period> {
        match level {
            TwilightLevel::Civil => self.civil,
            TwilightLevel::Nautical => self.nautical,
            TwilightLevel::Astronomical => self.astronomical,
            TwilightLevel::Night => self.night,
        }
    }

    /// Evening instant the Sun drops below `level`.
    pub fn dusk_for(&self, level: TwilightLevel) -> Option<DateTime<Utc>> {
        self.period(level).map(|p| p.start)
    }

    /// Morning instant the Sun climbs back above `level`.
    pub fn dawn_for(&self, level: TwilightLevel) -> Option<DateTime<Utc>> {
        self.period(level).map(|p| p.stop)
    }
}

/// Computes [`TwilightCircumstances`] for a site and date.
pub struct TwilightCalculator<'c, E = SiderustEphemeris> {
    ephemeris: E,
    config: VisibilityConfig,
    cache: &'c dyn TwilightCache,
}

impl<'c> TwilightCalculator<'c, SiderustEphemeris> {
    pub fn new(config: VisibilityConfig, cache: &'c dyn TwilightCache) -> VisibilityResult<Self> {
        Self::with_ephemeris(SiderustEphemeris, config, cache)
    }
}

impl<'c, E: Ephemeris + Clone> TwilightCalculator<'c, E> {
    pub fn with_ephemeris(
        ephemeris: E,
        config: VisibilityConfig,
        cache: &'c dyn TwilightCache,
    ) -> VisibilityResult<Self> {
        config.validate()?;
        Ok(Self {
            ephemeris,
            config,
            cache,
        })
    }

    pub fn config(&self) -> &VisibilityConfig {
        &self.config
    }

    /// Circumstances of the night that starts on the evening of `date`.
    pub fn compute(
        &self,
        location: &Location,
        date: NaiveDate,
    ) -> VisibilityResult<TwilightCircumstances> {
        let key = TwilightKey::new(date, location, &self.config);
        if let Some(hit) = self.cache.get(&key) {
            log::trace!("twilight cache hit for {}", date);
            return Ok(hit);
        }

        let value = self.compute_uncached(location, date)?;
        self.cache.insert(key, value);
        Ok(value)
    }

    /// Like [`TwilightCalculator::compute`], bypassing the cache.
    pub fn compute_uncached(
        &self,
        location: &Location,
        date: NaiveDate,
    ) -> VisibilityResult<TwilightCircumstances> {
        location.validate()?;
        let noon = location.local_noon(date);
        let sun = SolarAltitudes::new(*location, self.ephemeris.clone(), noon + Duration::hours(12))?;
        let solver = CircumstanceSolver::with_settings(&sun, &self.config.solver)?;

        let day = sun.hourly_samples_from(noon)?.clip_ascending_start()?;
        let civil = level_period(&solver, &day, self.config.twilight.sunset_altitude)?;

        let (_, lowest) = day.find_min_altitude();
        let dark = if lowest.altitude() >= NIGHT_ALTITUDE {
            log::debug!(
                "shallow night on {} (sun bottoms at {:.1}°), resampling",
                date,
                lowest.altitude()
            );
            self.resample_dark_span(&sun, &day)?
        } else {
            day
        };

        let result = TwilightCircumstances::nested(
            civil,
            level_period(&solver, &dark, NAUTICAL_ALTITUDE)?,
            level_period(&solver, &dark, ASTRONOMICAL_ALTITUDE)?,
            level_period(&solver, &dark, NIGHT_ALTITUDE)?,
        );
        log::debug!(
            "twilight for {} at ({}, {}): {:?}",
            date,
            location.latitude.value(),
            location.longitude.value(),
            result
        );
        Ok(result)
    }

    /// Circumstances that apply at `at`.
    ///
    /// From noon on, that is the night starting this evening. Before noon it
    /// is the night that started the previous evening, until that night's
    /// civil dawn has passed.
    pub fn adjust_for_reference_time(
        &self,
        location: &Location,
        at: DateTime<Utc>,
    ) -> VisibilityResult<TwilightCircumstances> {
        let date = location.local_date(at);
        if at >= location.local_noon(date) {
            return self.compute(location, date);
        }

        let previous = date.pred_opt().ok_or_else(|| {
            VisibilityError::InvalidArgument(format!("no calendar day before {}", date))
        })?;
        let last_night = self.compute(location, previous)?;
        match last_night.civil {
            Some(civil) if at >= civil.stop => self.compute(location, date),
            _ => Ok(last_night),
        }
    }

    /// Re-samples the part of the day around the Sun's time below the horizon.
    fn resample_dark_span(
        &self,
        sun: &SolarAltitudes<E>,
        day: &SampleSeries,
    ) -> VisibilityResult<SampleSeries> {
        let samples = day.samples();
        let (first, last) = match (
            samples.iter().position(|s| s.altitude() <= 0.0),
            samples.iter().rposition(|s| s.altitude() <= 0.0),
        ) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(day.clone()),
        };

        let from = first.saturating_sub(1);
        let to = (last + 1).min(samples.len() - 1);
        if from == to {
            return Ok(day.clone());
        }
        let step = Duration::minutes(i64::from(self.config.twilight.resample_minutes));
        sun.samples_between(samples[from].time(), samples[to].time(), step)
    }
}

/// Dusk and dawn crossings of `altitude`, solved independently.
fn level_period<S: AltitudeSource + ?Sized>(
    solver: &CircumstanceSolver<'_, S>,
    series: &SampleSeries,
    altitude: f64,
) -> VisibilityResult<Option<Period>> {
    let threshold = HorizonProfile::fixed(altitude)?;
    let dusk = series
        .find_span(altitude, true)
        .map(|bracket| solver.solve(bracket, &EventKind::BelowMinimum(&threshold)))
        .transpose()?;
    let dawn = series
        .find_span(altitude, false)
        .map(|bracket| solver.solve(bracket, &EventKind::AboveMinimum(&threshold)))
        .transpose()?;

    Ok(match (dusk, dawn) {
        (Some(start), Some(stop)) if start < stop => Some(Period::new(start, stop)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::twilight_cache::{MemoryTwilightCache, NoopTwilightCache};
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_nested(tc: &TwilightCircumstances) {
        let levels: Vec<Option<Period>> = TwilightLevel::ALL.iter().map(|l| tc.period(*l)).collect();
        for pair in levels.windows(2) {
            match (pair[0], pair[1]) {
                (Some(outer), Some(inner)) => {
                    assert!(outer.start <= inner.start);
                    assert!(inner.stop <= outer.stop);
                }
                (None, Some(_)) => panic!("inner level present without its outer level"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_nested_drops_orphans() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 18, 0, 0).unwrap();
        let p = Some(Period::new(t, t + Duration::hours(10)));
        let tc = TwilightCircumstances::nested(p, None, p, p);
        assert!(tc.civil.is_some());
        assert!(tc.nautical.is_none());
        assert!(tc.astronomical.is_none());
        assert!(tc.night.is_none());
    }

    #[test]
    fn test_winter_mid_latitude_has_every_level() {
        let cache = NoopTwilightCache;
        let calc = TwilightCalculator::new(VisibilityConfig::default(), &cache).unwrap();
        let site = Location::new(45.0, 0.0, 0.0).unwrap();

        let tc = calc.compute(&site, date(2024, 1, 15)).unwrap();
        assert!(tc.night.is_some());
        assert_nested(&tc);

        let civil = tc.civil.unwrap();
        assert!(civil.duration_hours() > 14.0 && civil.duration_hours() < 16.5);
        // sunset in the evening of the 15th, sunrise on the morning of the 16th
        assert!(civil.start > Utc.with_ymd_and_hms(2024, 1, 15, 16, 0, 0).unwrap());
        assert!(civil.stop < Utc.with_ymd_and_hms(2024, 1, 16, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_dusk_and_dawn_accessors() {
        let cache = NoopTwilightCache;
        let calc = TwilightCalculator::new(VisibilityConfig::default(), &cache).unwrap();
        let site = Location::new(45.0, 0.0, 0.0).unwrap();
        let tc = calc.compute(&site, date(2024, 1, 15)).unwrap();

        let civil_dusk = tc.dusk_for(TwilightLevel::Civil).unwrap();
        let night_dusk = tc.dusk_for(TwilightLevel::Night).unwrap();
        assert!(civil_dusk < night_dusk);
        assert!(tc.dawn_for(TwilightLevel::Night).unwrap() < tc.dawn_for(TwilightLevel::Civil).unwrap());
    }

    #[test]
    fn test_reference_time_before_dawn_uses_previous_evening() {
        let cache = MemoryTwilightCache::new();
        let calc = TwilightCalculator::new(VisibilityConfig::default(), &cache).unwrap();
        let site = Location::new(45.0, 0.0, 0.0).unwrap();

        let jan15 = calc.compute(&site, date(2024, 1, 15)).unwrap();
        let jan16 = calc.compute(&site, date(2024, 1, 16)).unwrap();

        let one_am = Utc.with_ymd_and_hms(2024, 1, 16, 1, 0, 0).unwrap();
        assert_eq!(calc.adjust_for_reference_time(&site, one_am).unwrap(), jan15);

        let nine_am = Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap();
        assert_eq!(calc.adjust_for_reference_time(&site, nine_am).unwrap(), jan16);

        let evening = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
        assert_eq!(calc.adjust_for_reference_time(&site, evening).unwrap(), jan15);
    }

    #[test]
    fn test_results_are_cached() {
        let cache = MemoryTwilightCache::new();
        let calc = TwilightCalculator::new(VisibilityConfig::default(), &cache).unwrap();
        let site = Location::new(45.0, 0.0, 0.0).unwrap();

        let first = calc.compute(&site, date(2024, 3, 1)).unwrap();
        let second = calc.compute(&site, date(2024, 3, 1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_shared_cache_separates_calculator_settings() {
        let cache = MemoryTwilightCache::new();
        let standard = TwilightCalculator::new(VisibilityConfig::default(), &cache).unwrap();
        let mut config = VisibilityConfig::default();
        config.twilight.sunset_altitude = 0.0;
        let geometric = TwilightCalculator::new(config, &cache).unwrap();
        let site = Location::new(45.0, 0.0, 0.0).unwrap();

        let refracted = standard.compute(&site, date(2024, 3, 1)).unwrap();
        let plain = geometric.compute(&site, date(2024, 3, 1)).unwrap();
        assert_eq!(cache.len(), 2);

        // the Sun reaches 0° before -0°50′ in the evening
        let refracted_dusk = refracted.civil.unwrap().start;
        let plain_dusk = plain.civil.unwrap().start;
        assert!(plain_dusk < refracted_dusk);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cache = NoopTwilightCache;
        let mut config = VisibilityConfig::default();
        config.solver.tolerance_seconds = 0;
        assert!(TwilightCalculator::new(config, &cache).is_err());
    }
}
