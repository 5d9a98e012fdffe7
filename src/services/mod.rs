//! Business logic services

pub mod appointment_creator;
pub mod chatbot;
pub mod entity_type;
pub mod entity_validator;
pub mod field_mapper;
pub mod json_processor;
