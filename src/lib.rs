//! Cube records and their layout on a pallet.
//!
//! The layout engine in [`layout`] is a pure function of an ordered cube
//! snapshot and a pallet footprint. [`store`] keeps the records and [`api`]
//! exposes both over HTTP.

pub mod api;
pub mod config;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod store;
pub mod types;
