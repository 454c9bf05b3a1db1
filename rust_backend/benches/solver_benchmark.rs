use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tsi_visibility::algorithms::CircumstanceSolver;
use tsi_visibility::core::{HorizonProfile, Location, Period, Target};
use tsi_visibility::services::{NoopTwilightCache, TargetWindow, TwilightCalculator};
use tsi_visibility::sources::{AltitudeSource, TargetAltitudes};
use tsi_visibility::VisibilityConfig;

fn bench_find_rising(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver");

    let site = Location::new(35.0, -105.0, 2000.0).unwrap();
    let m42 = Target::j2000("M42", 83.822, -5.391).unwrap();
    let source = TargetAltitudes::with_default_ephemeris(site, m42).unwrap();
    let day = source
        .hourly_samples_for_day(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        .unwrap();

    for tolerance in [1u32, 10, 60] {
        let solver = CircumstanceSolver::new(&source, tolerance).unwrap();
        group.bench_with_input(
            BenchmarkId::new("find_rising", tolerance),
            &day,
            |b, day| b.iter(|| black_box(solver.find_rising(black_box(day)).unwrap())),
        );
    }

    let solver = CircumstanceSolver::new(&source, 1).unwrap();
    group.bench_function("find_transit", |b| {
        b.iter(|| black_box(solver.find_transit(black_box(&day)).unwrap()))
    });

    group.finish();
}

fn bench_target_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("target_window");

    let site = Location::new(35.0, -105.0, 2000.0).unwrap();
    let m42 = Target::j2000("M42", 83.822, -5.391).unwrap();
    let horizon = HorizonProfile::fixed(20.0).unwrap();
    let config = VisibilityConfig::default();
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 23, 0, 0).unwrap();
    let window = Period::new(start, start + Duration::hours(14));
    let calculator = TargetWindow::new(&site, &horizon, &config);

    group.bench_function("m42_one_night", |b| {
        b.iter(|| black_box(calculator.compute_for_target(&m42, black_box(window)).unwrap()))
    });

    group.finish();
}

fn bench_twilight(c: &mut Criterion) {
    let mut group = c.benchmark_group("twilight");

    let cache = NoopTwilightCache;
    let calculator = TwilightCalculator::new(VisibilityConfig::default(), &cache).unwrap();

    for (name, latitude, month) in [("winter_45n", 45.0, 1), ("summer_56n", 56.5, 6)] {
        let site = Location::new(latitude, 0.0, 0.0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, month, 15).unwrap();
        group.bench_with_input(BenchmarkId::new("compute", name), &date, |b, date| {
            b.iter(|| black_box(calculator.compute(&site, *date).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_find_rising, bench_target_window, bench_twilight);
criterion_main!(benches);
