//! plantmart-hex: marketplace cart/checkout core (application services +
//! inbound HTTP adapter).

pub mod config;
pub mod errors;

pub mod application;

pub use plantmart_types::{domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
