//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that the node's genesis runner uses
//! - **Outbound (Driven)**: Storage and time this crate depends on

pub mod inbound;
pub mod outbound;
