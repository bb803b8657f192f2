//! Distributed Gauss-Seidel relaxation on a row-partitioned grid.
//!
//! Solves a discretized Laplace-type boundary value problem on an N×N grid
//! by iterative relaxation, split row-wise across participants that share
//! no memory and communicate only by explicit messages. The vertical sweep
//! direction carries an in-place recurrence across partition boundaries,
//! so it runs as a per-column wavefront pipeline; the horizontal sweep is
//! fully local. A max reduction of the per-participant epsilon gates
//! termination, and a weighted checksum verifies the final state.
//!
//! Execution backends: single process, in-process threads over channels,
//! and MPI (`distributed` feature).

pub mod band;
pub mod decompose;
pub mod error;
pub mod solver;
