// Transfer Swap Matching - Core
//
// This crate finds two-way and circular three-way swaps among submitted
// transfer requests, persists them as pending matches and drives them through
// accept, reject and expiry.
//
// Activities are organized per-domain in domains/*/activities/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
