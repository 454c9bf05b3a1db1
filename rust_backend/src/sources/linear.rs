//! Deterministic piecewise-linear altitude source.
//!
//! Altitude and azimuth are interpolated between knot samples. Brackets that
//! reach past the knots (wrap-around brackets carry a synthetic endpoint one
//! interval beyond the series) are extended linearly towards that endpoint.
//! This keeps solver tests independent of any astronomy.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use super::{interior_instants, interior_points_for_step, AltitudeSource};
use crate::core::samples::{Sample, SampleSeries};
use crate::error::{VisibilityError, VisibilityResult};

#[derive(Debug, Clone)]
pub struct LinearAltitudes {
    knots: SampleSeries,
}

impl LinearAltitudes {
    pub fn new(knots: SampleSeries) -> Self {
        Self { knots }
    }

    pub fn knots(&self) -> &SampleSeries {
        &self.knots
    }
}

fn lerp(a: &Sample, b: &Sample, time: DateTime<Utc>) -> VisibilityResult<Sample> {
    let span = (b.time() - a.time()).num_nanoseconds().unwrap_or(i64::MAX) as f64;
    let elapsed = (time - a.time()).num_nanoseconds().unwrap_or(0) as f64;
    let fraction = if span > 0.0 { elapsed / span } else { 0.0 };
    Sample::new(
        a.altitude() + fraction * (b.altitude() - a.altitude()),
        a.azimuth() + fraction * (b.azimuth() - a.azimuth()),
        time,
    )
}

impl AltitudeSource for LinearAltitudes {
    fn sample_at(&self, time: DateTime<Utc>) -> VisibilityResult<Sample> {
        if time < self.knots.start() || time > self.knots.end() {
            return Err(VisibilityError::InvalidArgument(format!(
                "{} is outside the knot range {} .. {}",
                time,
                self.knots.start(),
                self.knots.end()
            )));
        }

        let samples = self.knots.samples();
        let upper = samples.partition_point(|s| s.time() <= time);
        if upper == samples.len() {
            return Ok(self.knots.last().shifted_to(time));
        }
        lerp(&samples[upper - 1], &samples[upper], time)
    }

    fn refine(&self, bracket: &SampleSeries, points: usize) -> VisibilityResult<SampleSeries> {
        let instants = interior_instants(bracket, points)?;
        let (first, last) = (bracket.first(), bracket.last());

        let mut samples = Vec::with_capacity(points + 2);
        samples.push(*first);
        for time in instants {
            let sample = if time > self.knots.end() {
                lerp(self.knots.last(), last, time)?
            } else if time < self.knots.start() {
                lerp(first, self.knots.first(), time)?
            } else {
                self.sample_at(time)?
            };
            samples.push(sample);
        }
        samples.push(*last);
        SampleSeries::new(samples)
    }

    // Follows the knots rather than a straight line between the two ends
    fn samples_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
    ) -> VisibilityResult<SampleSeries> {
        let bracket = SampleSeries::bracket(self.sample_at(start)?, self.sample_at(end)?)?;
        let mut samples = vec![*bracket.first()];
        for time in interior_instants(&bracket, interior_points_for_step(&bracket, step))? {
            samples.push(self.sample_at(time)?);
        }
        samples.push(*bracket.last());
        SampleSeries::new(samples)
    }

    fn hourly_samples_for_day(&self, date: NaiveDate) -> VisibilityResult<SampleSeries> {
        let midnight = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        self.hourly_samples_from(midnight)
    }

    fn ever_rises_at_location(&self) -> bool {
        self.knots.find_max_altitude().1.altitude() > 0.0
    }

    fn is_circumpolar_at_location(&self) -> bool {
        self.knots.find_min_altitude().1.altitude() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::samples::test_support::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sample_at_interpolates_knots() {
        let source = LinearAltitudes::new(hourly(&[-10.0, 10.0, 30.0]));
        let s = source.sample_at(t0() + Duration::minutes(30)).unwrap();
        assert_abs_diff_eq!(s.altitude(), 0.0, epsilon = 1e-9);

        let s = source.sample_at(t0() + Duration::minutes(90)).unwrap();
        assert_abs_diff_eq!(s.altitude(), 20.0, epsilon = 1e-9);

        let s = source.sample_at(t0() + Duration::hours(2)).unwrap();
        assert_eq!(s.altitude(), 30.0);
    }

    #[test]
    fn test_sample_at_outside_range_fails() {
        let source = LinearAltitudes::new(hourly(&[-10.0, 10.0]));
        assert!(source.sample_at(t0() - Duration::seconds(1)).is_err());
        assert!(source.sample_at(t0() + Duration::hours(2)).is_err());
    }

    #[test]
    fn test_refine_keeps_endpoints_and_interpolates() {
        let source = LinearAltitudes::new(hourly(&[-10.0, 10.0]));
        let bracket = hourly(&[-10.0, 10.0]);
        let refined = source.refine(&bracket, 3).unwrap();

        assert_eq!(refined.len(), 5);
        assert_eq!(refined.first(), bracket.first());
        assert_eq!(refined.last(), bracket.last());
        assert_abs_diff_eq!(refined.samples()[2].altitude(), 0.0, epsilon = 1e-9);
        assert_eq!(refined.samples()[2].time(), t0() + Duration::minutes(30));
    }

    #[test]
    fn test_refine_past_last_knot_extends_to_endpoint() {
        let source = LinearAltitudes::new(hourly(&[-10.0, 10.0]));
        let synthetic = source.knots().first().shifted_to(t0() + Duration::hours(2));
        let bracket = SampleSeries::bracket(*source.knots().last(), synthetic).unwrap();
        let refined = source.refine(&bracket, 1).unwrap();

        assert_abs_diff_eq!(refined.samples()[1].altitude(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_samples_between_spacing() {
        let source = LinearAltitudes::new(hourly(&[-10.0, 10.0, 30.0]));
        let series = source
            .samples_between(t0(), t0() + Duration::hours(2), Duration::minutes(10))
            .unwrap();
        assert_eq!(series.len(), 13);
        assert_eq!(series.sample_interval(), Duration::minutes(10));
        // the middle knot is honoured
        assert_abs_diff_eq!(series.samples()[6].altitude(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_closed_form_answers() {
        let rising = LinearAltitudes::new(hourly(&[-10.0, 10.0]));
        assert!(rising.ever_rises_at_location());
        assert!(!rising.is_circumpolar_at_location());

        let up = LinearAltitudes::new(hourly(&[5.0, 10.0]));
        assert!(up.is_circumpolar_at_location());

        let down = LinearAltitudes::new(hourly(&[-5.0, -10.0]));
        assert!(!down.ever_rises_at_location());
    }
}
