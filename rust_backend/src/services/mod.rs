//! Composition layers built on the solver.
//!
//! These services combine altitude sources, horizon profiles and the
//! circumstance solver into the values a scheduler consumes: target
//! windows, twilight periods and meridian-clipped intervals.

pub mod target_window;
pub mod twilight;
pub mod twilight_cache;
pub mod window_clipper;

pub use target_window::{Circumstance, TargetWindow, TargetWindowResult};
pub use twilight::{TwilightCalculator, TwilightCircumstances, TwilightLevel};
pub use twilight_cache::{
    shared_twilight_cache, MemoryTwilightCache, NoopTwilightCache, TwilightCache, TwilightKey,
};
pub use window_clipper::WindowClipper;
