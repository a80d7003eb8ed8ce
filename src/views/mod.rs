//! HTTP views.

pub mod public;
