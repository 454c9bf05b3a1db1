//! Target window computations against the siderust ephemeris.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use tsi_visibility::core::{HorizonProfile, Location, Period, Target};
use tsi_visibility::services::{Circumstance, TargetWindow, WindowClipper};
use tsi_visibility::sources::{AltitudeSource, TargetAltitudes};
use tsi_visibility::VisibilityConfig;

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn between(t: DateTime<Utc>, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    from <= t && t <= to
}

/// New Mexico, about UTC-7 in local mean time.
fn new_mexico() -> Location {
    Location::new(35.0, -105.0, 2000.0).unwrap()
}

#[test]
fn test_circumpolar_target_reports_only_transit() {
    let site = new_mexico();
    // 35 + 60 > 90: never sets at this latitude
    let target = Target::j2000("circumpolar", 150.0, 60.0).unwrap();
    let source = TargetAltitudes::with_default_ephemeris(site, target.clone()).unwrap();
    assert!(source.is_circumpolar_at_location());

    let horizon = HorizonProfile::flat();
    let config = VisibilityConfig::default();
    let night = Period::new(utc(2024, 1, 16, 1, 0), utc(2024, 1, 16, 13, 0));

    let result = TargetWindow::new(&site, &horizon, &config)
        .compute_for_target(&target, night)
        .unwrap();

    assert_eq!(result.rise, Circumstance::Never);
    assert_eq!(result.set, Circumstance::Never);
    assert!(matches!(result.transit, Circumstance::At(_)));
}

#[test]
fn test_orion_nebula_rises_transits_and_sets() {
    let site = new_mexico();
    let m42 = Target::j2000("M42", 83.822, -5.391).unwrap();
    let horizon = HorizonProfile::fixed(20.0).unwrap();
    let config = VisibilityConfig::default();
    // 16:00 to 06:00 local mean time
    let window = Period::new(utc(2024, 1, 15, 23, 0), utc(2024, 1, 16, 13, 0));

    let result = TargetWindow::new(&site, &horizon, &config)
        .compute_for_target(&m42, window)
        .unwrap();

    let rise = match result.rise {
        Circumstance::At(t) => t,
        other => panic!("expected a rise inside the window, got {:?}", other),
    };
    let transit = result.transit.time().unwrap();
    let set = match result.set {
        Circumstance::At(t) => t,
        other => panic!("expected a set inside the window, got {:?}", other),
    };

    assert!(between(rise, utc(2024, 1, 16, 0, 20), utc(2024, 1, 16, 1, 25)));
    assert!(between(transit, utc(2024, 1, 16, 4, 25), utc(2024, 1, 16, 5, 25)));
    assert!(between(set, utc(2024, 1, 16, 8, 25), utc(2024, 1, 16, 9, 30)));

    // roughly symmetric about the meridian
    let before = (transit - rise).num_minutes();
    let after = (set - transit).num_minutes();
    assert!((before - after).abs() < 10);

    let source = TargetAltitudes::with_default_ephemeris(site, m42).unwrap();
    assert!((source.sample_at(rise).unwrap().altitude() - 20.0).abs() < 0.05);
    assert!((source.sample_at(set).unwrap().altitude() - 20.0).abs() < 0.05);

    let clipped = WindowClipper::clip_result(&result, 60).unwrap();
    assert_eq!(clipped.start, transit - Duration::minutes(60));
    assert_eq!(clipped.stop, transit + Duration::minutes(60));
}

#[test]
fn test_window_opening_after_rise_is_clipped() {
    let site = new_mexico();
    let m42 = Target::j2000("M42", 83.822, -5.391).unwrap();
    let horizon = HorizonProfile::fixed(20.0).unwrap();
    let config = VisibilityConfig::default();
    // opens an hour before transit and closes an hour after it
    let window = Period::new(utc(2024, 1, 16, 4, 0), utc(2024, 1, 16, 6, 0));

    let result = TargetWindow::new(&site, &horizon, &config)
        .compute_for_target(&m42, window)
        .unwrap();

    assert_eq!(result.rise, Circumstance::ClippedToWindowStart(window.start));
    assert_eq!(result.set, Circumstance::ClippedToWindowEnd(window.stop));
    assert_eq!(result.visible_period(), Some(window));
}

#[test]
fn test_southern_target_never_rises_from_the_north() {
    let site = new_mexico();
    // 35 - (-60) > 90: always below the horizon
    let target = Target::j2000("deep south", 100.0, -60.0).unwrap();
    let horizon = HorizonProfile::flat();
    let config = VisibilityConfig::default();
    let window = Period::new(utc(2024, 1, 16, 1, 0), utc(2024, 1, 16, 13, 0));

    let result = TargetWindow::new(&site, &horizon, &config)
        .compute_for_target(&target, window)
        .unwrap();
    assert_eq!(result.rise, Circumstance::Never);
    assert_eq!(result.transit, Circumstance::Never);
    assert_eq!(result.set, Circumstance::Never);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_circumpolar_targets_never_rise_or_set(
        latitude in 20.0..60.0f64,
        margin in 1.0..20.0f64,
        ra in 0.0..359.0f64,
        start_hour in 0i64..24,
    ) {
        let site = Location::new(latitude, 10.0, 0.0).unwrap();
        let declination = (90.0 - latitude + margin).min(89.0);
        let target = Target::j2000("p", ra, declination).unwrap();
        let horizon = HorizonProfile::flat();
        let config = VisibilityConfig::default();
        let start = utc(2024, 6, 1, 0, 0) + Duration::hours(start_hour);
        let window = Period::new(start, start + Duration::hours(12));

        let result = TargetWindow::new(&site, &horizon, &config)
            .compute_for_target(&target, window)
            .unwrap();
        prop_assert_eq!(result.rise, Circumstance::Never);
        prop_assert_eq!(result.set, Circumstance::Never);
        prop_assert!(result.transit.time().is_some());
    }
}
