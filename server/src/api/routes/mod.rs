//! API route handlers

pub mod audit;
pub mod health;
pub mod tables;
