//! Storage layer: PostgreSQL catalog for map-config records and layer
//! groups.

pub mod catalog;

pub use catalog::ConfigCatalog;
