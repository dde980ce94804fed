//! Integration test modules for Outboard

pub mod offline;
pub mod realtime;
pub mod registry;
