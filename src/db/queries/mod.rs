//! Database queries

pub mod appointment;
pub mod client;
pub mod dealership;
pub mod service;
pub mod user;
pub mod vehicle;
