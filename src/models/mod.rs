//! Data models for Salonet entities

pub mod appointment;
pub mod enums;
pub mod pagination;
pub mod service;
pub mod user;
