//! ClaimCraft Core Types
//!
//! Addresses, exact token amounts and the keccak-256 primitives shared by
//! every stage of the distribution pipeline.

mod address;
mod amount;
mod bucket;
mod error;
mod hash;

pub use address::*;
pub use amount::*;
pub use bucket::*;
pub use error::*;
pub use hash::*;

pub use alloy_primitives::{Address, U256};
