//! Core value types.
//!
//! This module defines the observer and target descriptions, time-ordered
//! altitude samples and the horizon profiles events are measured against.

pub mod domain;
pub mod horizon;
pub mod samples;

pub use domain::{EquatorialCoordinates, Epoch, Location, Period, Target};
pub use horizon::{CustomHorizon, HorizonPoint, HorizonProfile};
pub use samples::{Sample, SampleSeries};
