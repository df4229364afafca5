//! adaptest-core: IRT estimation, calibration, and adaptive selection.
//!
//! This crate holds the pure 3PL computations (response model, ability
//! estimation, item calibration, item selection) plus the store traits and
//! orchestration that tie them to an external attempt/item/profile store.

pub mod batch;
pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimation;
pub mod model;
pub mod response;
pub mod selection;
pub mod traits;
