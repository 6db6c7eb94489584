//! Data models for Radiopool entities

pub mod admin;
pub mod device;
pub mod loan;
