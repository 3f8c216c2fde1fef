//! Payment preflight for Tessera storage operations.
//!
//! Every paid operation is gated by an allowance-sufficiency check against
//! the payment escrow. When the approved allowance does not cover the
//! operation, the preflight tops it up with exactly one deposit followed by
//! exactly one service approval before the caller proceeds.
//!
//! # Components
//!
//! - [`Preflight`] - allowance checker bound to one session

#![warn(missing_docs)]

mod preflight;

pub use preflight::Preflight;
