//! Minimum-altitude profiles.
//!
//! A [`HorizonProfile`] answers one question: at a given azimuth, which
//! altitude counts as "above the horizon"? It is either a flat value or a
//! [`CustomHorizon`] curve loaded from the `azimuth altitude` text format,
//! shifted by an offset and optionally floored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{VisibilityError, VisibilityResult};

/// One `azimuth altitude` entry of a custom horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonPoint {
    pub azimuth: f64,
    pub altitude: f64,
}

/// Azimuth-keyed altitude curve, interpolated linearly between entries.
///
/// # Examples
///
/// ```
/// use tsi_visibility::core::horizon::CustomHorizon;
///
/// let horizon = CustomHorizon::parse("0 10\n90 20\n180 10\n270 0\n").unwrap();
/// assert_eq!(horizon.altitude_at(45.0), 15.0);
/// assert_eq!(horizon.altitude_at(315.0), 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HorizonPoint>", into = "Vec<HorizonPoint>")]
pub struct CustomHorizon {
    points: Vec<HorizonPoint>,
}

impl CustomHorizon {
    /// Builds a horizon from points in any order.
    ///
    /// Points are sorted by azimuth; for duplicate azimuths the later point wins.
    pub fn new(points: Vec<HorizonPoint>) -> VisibilityResult<Self> {
        if points.is_empty() {
            return Err(VisibilityError::HorizonParse(
                "a custom horizon needs at least one entry".to_string(),
            ));
        }

        for point in &points {
            if !point.azimuth.is_finite() || !(0.0..=360.0).contains(&point.azimuth) {
                return Err(VisibilityError::HorizonParse(format!(
                    "azimuth {} is outside [0, 360]",
                    point.azimuth
                )));
            }
            if !point.altitude.is_finite() || !(-90.0..=90.0).contains(&point.altitude) {
                return Err(VisibilityError::HorizonParse(format!(
                    "altitude {} is outside [-90, 90]",
                    point.altitude
                )));
            }
        }

        let mut sorted: Vec<HorizonPoint> = Vec::with_capacity(points.len());
        for mut point in points {
            if point.azimuth == 360.0 {
                point.azimuth = 0.0;
            }
            match sorted.iter_mut().find(|p| p.azimuth == point.azimuth) {
                Some(existing) => *existing = point,
                None => sorted.push(point),
            }
        }
        sorted.sort_by(|a, b| a.azimuth.total_cmp(&b.azimuth));

        Ok(Self { points: sorted })
    }

    /// Parses the `azimuth altitude` text format.
    ///
    /// One pair per line, separated by whitespace or a comma. Blank lines and
    /// lines starting with `#` are ignored.
    pub fn parse(text: &str) -> VisibilityResult<Self> {
        let mut points = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|f| !f.is_empty())
                .collect();
            if fields.len() != 2 {
                return Err(VisibilityError::HorizonParse(format!(
                    "line {}: expected 'azimuth altitude', got '{}'",
                    line_no + 1,
                    line
                )));
            }

            let parse = |field: &str| {
                field.parse::<f64>().map_err(|e| {
                    VisibilityError::HorizonParse(format!(
                        "line {}: '{}' is not a number: {}",
                        line_no + 1,
                        field,
                        e
                    ))
                })
            };
            points.push(HorizonPoint {
                azimuth: parse(fields[0])?,
                altitude: parse(fields[1])?,
            });
        }

        Self::new(points)
    }

    /// Reads and parses a horizon file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> VisibilityResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let horizon = Self::parse(&content)?;
        log::debug!(
            "loaded custom horizon with {} entries from {}",
            horizon.points.len(),
            path.as_ref().display()
        );
        Ok(horizon)
    }

    pub fn points(&self) -> &[HorizonPoint] {
        &self.points
    }

    /// Horizon altitude at `azimuth`, wrapping across north.
    pub fn altitude_at(&self, azimuth: f64) -> f64 {
        let az = azimuth.rem_euclid(360.0);
        let n = self.points.len();
        if n == 1 {
            return self.points[0].altitude;
        }

        let upper = self.points.partition_point(|p| p.azimuth <= az);
        let (lo, hi) = if upper == 0 || upper == n {
            (self.points[n - 1], self.points[0])
        } else {
            (self.points[upper - 1], self.points[upper])
        };

        // Unwrap the segment that crosses 360°
        let lo_az = lo.azimuth;
        let mut hi_az = hi.azimuth;
        let mut at = az;
        if hi_az <= lo_az {
            hi_az += 360.0;
            if at < lo_az {
                at += 360.0;
            }
        }

        let fraction = (at - lo_az) / (hi_az - lo_az);
        lo.altitude + fraction * (hi.altitude - lo.altitude)
    }
}

impl TryFrom<Vec<HorizonPoint>> for CustomHorizon {
    type Error = VisibilityError;

    fn try_from(points: Vec<HorizonPoint>) -> Result<Self, Self::Error> {
        CustomHorizon::new(points)
    }
}

impl From<CustomHorizon> for Vec<HorizonPoint> {
    fn from(horizon: CustomHorizon) -> Self {
        horizon.points
    }
}

/// Altitude threshold that counts as "above horizon", per azimuth.
///
/// Deserialized profiles are checked by [`HorizonProfile::fixed`] and
/// [`HorizonProfile::custom`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", try_from = "ProfileRecord")]
pub enum HorizonProfile {
    /// Single minimum altitude for every azimuth.
    Fixed { altitude: f64 },
    /// Custom horizon shifted by `offset`, never below `minimum` when set.
    Custom {
        horizon: CustomHorizon,
        offset: f64,
        minimum: Option<f64>,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ProfileRecord {
    Fixed {
        altitude: f64,
    },
    Custom {
        horizon: CustomHorizon,
        offset: f64,
        minimum: Option<f64>,
    },
}

impl TryFrom<ProfileRecord> for HorizonProfile {
    type Error = VisibilityError;

    fn try_from(record: ProfileRecord) -> Result<Self, Self::Error> {
        match record {
            ProfileRecord::Fixed { altitude } => HorizonProfile::fixed(altitude),
            ProfileRecord::Custom {
                horizon,
                offset,
                minimum,
            } => HorizonProfile::custom(horizon, offset, minimum),
        }
    }
}

impl HorizonProfile {
    pub fn fixed(altitude: f64) -> VisibilityResult<Self> {
        if !altitude.is_finite() || !(-90.0..=90.0).contains(&altitude) {
            return Err(VisibilityError::InvalidArgument(format!(
                "minimum altitude {} is outside [-90, 90]",
                altitude
            )));
        }
        Ok(HorizonProfile::Fixed { altitude })
    }

    pub fn custom(
        horizon: CustomHorizon,
        offset: f64,
        minimum: Option<f64>,
    ) -> VisibilityResult<Self> {
        if !offset.is_finite() {
            return Err(VisibilityError::InvalidArgument(
                "horizon offset must be finite".to_string(),
            ));
        }
        if let Some(floor) = minimum {
            if !floor.is_finite() || !(-90.0..=90.0).contains(&floor) {
                return Err(VisibilityError::InvalidArgument(format!(
                    "horizon floor {} is outside [-90, 90]",
                    floor
                )));
            }
        }
        Ok(HorizonProfile::Custom {
            horizon,
            offset,
            minimum,
        })
    }

    /// The geometric horizon.
    pub fn flat() -> Self {
        HorizonProfile::Fixed { altitude: 0.0 }
    }

    /// Threshold altitude at `azimuth`.
    pub fn threshold_at(&self, azimuth: f64) -> f64 {
        match self {
            HorizonProfile::Fixed { altitude } => *altitude,
            HorizonProfile::Custom {
                horizon,
                offset,
                minimum,
            } => {
                let shifted = horizon.altitude_at(azimuth) + offset;
                match minimum {
                    Some(floor) => shifted.max(*floor),
                    None => shifted,
                }
            }
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, HorizonProfile::Fixed { .. })
    }
}
