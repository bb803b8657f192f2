//! The distributed relaxation core.

pub mod comm;
pub mod comm_channel;
#[cfg(feature = "distributed")]
pub mod comm_mpi;
pub mod halo;
pub mod relax;
pub mod runner;
pub mod verify;
pub mod wavefront;

pub use relax::{RelaxOutcome, RelaxParams};
