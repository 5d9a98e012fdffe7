//! Type definitions

pub mod appointment;
pub mod chatbot;
pub mod client;
pub mod dealership;
pub mod messages;
pub mod service;
pub mod user;
pub mod vehicle;

pub use appointment::*;
pub use chatbot::*;
pub use client::*;
pub use dealership::*;
pub use messages::*;
pub use service::*;
pub use user::*;
pub use vehicle::*;
