//! # Domain Layer
//!
//! Pure admission logic with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.

pub mod address;
pub mod certificate;
pub mod entities;
pub mod errors;
pub mod genesis;
pub mod keys;
pub mod validation;
