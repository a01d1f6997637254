//! # feedstate Core
//!
//! Value primitives and instrument definitions shared by every feedstate
//! crate.
//!
//! This crate provides:
//! - Fixed-point [`Price`], [`Size`] and [`Timestamp`] with NULL sentinels
//! - [`Instrument`] definitions and validation
//! - The [`InstrumentLookup`] boundary and an in-memory [`InstrumentCatalog`]
//! - [`InstrumentError`] for instrument validation

pub mod error;
pub mod instrument;
pub mod types;

pub use error::InstrumentError;
pub use instrument::{
    Exchange, Instrument, InstrumentCatalog, InstrumentId, InstrumentLookup, SecurityType,
};
pub use types::{Fraction, Price, Size, Timestamp};
