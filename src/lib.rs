//! Application factory: environment-driven configuration, log handler
//! provisioning, extension wiring and the public home route.

pub mod app;
pub mod config;
pub mod extensions;
pub mod logging;
pub mod storage;
pub mod views;
