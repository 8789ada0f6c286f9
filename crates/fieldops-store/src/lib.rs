//! Fieldops Store - Storage ports and adapters
//!
//! This crate defines the storage ports used by the scheduling engine and
//! provides in-memory and PostgreSQL adapter implementations for bookings,
//! the travel-pair cache, schedule insights, and the analysis run log.

pub mod memory;
pub mod ports;
pub mod postgres;
pub mod stores;

pub use stores::Stores;
