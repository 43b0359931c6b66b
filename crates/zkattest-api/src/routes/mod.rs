//! # API Route Modules
//!
//! - `presentations`: request creation, wallet descriptors, proof
//!   submission, polling and blocking waits.
//! - `artifacts`: proving and verifying keys and canonical schemas, by
//!   schema hash.

pub mod artifacts;
pub mod presentations;
