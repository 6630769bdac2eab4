//! plantmart-types: domain model and storage ports for the marketplace core.

pub mod domain;
pub mod ports;
