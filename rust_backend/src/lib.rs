//! TSI Visibility - rise, transit, set and twilight for telescope scheduling
//!
//! Given an observer location, a target and a horizon profile, this crate
//! finds when the target climbs above the horizon, culminates and sets
//! inside an imaging window, and when the Sun's twilight bands begin and end.
//!
//! # Layout
//!
//! - [`core`]: locations, targets, altitude samples, horizon profiles
//! - [`sources`]: the [`AltitudeSource`](sources::AltitudeSource) seam between the solver and an ephemeris
//! - [`astrometry`]: the [`Ephemeris`](astrometry::Ephemeris) trait and its siderust-backed implementation
//! - [`algorithms`]: bracket location and the iterative circumstance solver
//! - [`services`]: target windows, twilight and meridian clipping
//! - [`config`]: TOML configuration
//!
//! # Example
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use tsi_visibility::core::{HorizonProfile, Location, Period, Target};
//! use tsi_visibility::services::{NoopTwilightCache, TargetWindow, TwilightCalculator};
//! use tsi_visibility::VisibilityConfig;
//!
//! # fn main() -> tsi_visibility::VisibilityResult<()> {
//! let site = Location::new(35.0, -105.0, 2000.0)?;
//! let m42 = Target::j2000("M42", 83.82, -5.39)?;
//! let horizon = HorizonProfile::fixed(20.0)?;
//! let config = VisibilityConfig::default();
//!
//! let cache = NoopTwilightCache;
//! let twilight = TwilightCalculator::new(config.clone(), &cache)?;
//! let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let night = twilight.compute(&site, date)?;
//!
//! if let Some(dark) = night.night {
//!     let window = TargetWindow::new(&site, &horizon, &config)
//!         .compute_for_target(&m42, Period::new(dark.start, dark.stop))?;
//!     println!("{:?}", window.visible_period());
//! }
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod astrometry;
pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod sources;

pub use config::VisibilityConfig;
pub use error::{VisibilityError, VisibilityResult};
