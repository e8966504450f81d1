//! # Beacon Result Signing
//!
//! Before a DKG result goes on chain, group members agree locally on which
//! candidate to submit. Each member signs the hash of the result it computed,
//! exchanges that signature with its peers, and filters peers out:
//!
//! ```text
//! DkgResult ──► ResultHasher ──► ResultHash ──► sign ──► message ──► peers
//!                                                                     │
//!   accepted signatures ◄── classify by sender ◄── inbound messages ◄─┘
//!   accusations        ◄──┘
//! ```
//!
//! The accepted signatures go to the chain with the result; the chain alone
//! decides whether they meet the honest threshold. Accusations carry the
//! exact conflicting signatures seen from an equivocating member.
//!
//! Nothing here performs I/O. Transport, timing and submission are up to the
//! caller.

pub mod error;
pub mod member;
pub mod message;
pub mod roster;

pub use error::{Result, ResultSigningError};
pub use member::{Accusations, ResultSigningMember};
pub use message::DkgResultHashSignatureMessage;
pub use roster::Roster;
