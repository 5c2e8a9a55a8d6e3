//! Gradient-magnitude edge response used as the last preprocessing stage.
//!
//! - 3×3 Scharr derivatives with replicated borders.
//! - Magnitude `sqrt(gx² + gy²)` per pixel.
//!
//! The pyramid levels feed [`edge_response`] (Scharr scaled by 1/16, so a unit
//! step in intensity gives a response of 1) to the profile sampler.

pub mod grad;

pub use grad::{edge_response, scharr_gradients, Grad};
