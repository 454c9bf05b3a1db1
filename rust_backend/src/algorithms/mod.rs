//! Event location and refinement.
//!
//! # Components
//!
//! - [`bracket`]: finds the coarse two-sample bracket of an event
//! - [`solver`]: narrows a bracket to the configured tolerance
//!
//! # Example
//!
//! ```ignore
//! use tsi_visibility::algorithms::CircumstanceSolver;
//! use tsi_visibility::sources::{AltitudeSource, TargetAltitudes};
//!
//! # fn example(source: &TargetAltitudes, date: chrono::NaiveDate) -> tsi_visibility::VisibilityResult<()> {
//! let solver = CircumstanceSolver::new(source, 1)?;
//! let day = source.hourly_samples_for_day(date)?;
//! if let Some(rise) = solver.find_rising(&day)? {
//!     println!("rises at {}", rise);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bracket;
pub mod solver;

pub use bracket::{locate, EventKind, SeriesShape};
pub use solver::CircumstanceSolver;
