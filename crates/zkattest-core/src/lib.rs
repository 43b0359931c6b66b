//! # zkattest-core: Foundational Types
//!
//! Leaf crate of the zkattest workspace. Everything that needs a stable
//! byte representation or a content hash goes through the types defined
//! here, so the verifier, the wallet and the CLI agree on schema hashes.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Schema hashes are computed only over
//!    JCS-canonical bytes. Two schemas that differ only in key order or
//!    whitespace hash identically.
//!
//! 2. **`ContentDigest` is self-describing.** It renders as
//!    `sha256:<hex>` and parses back from that form, which is also the
//!    path segment used by the artifact routes.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is seconds precision and always
//!    renders with a `Z` suffix.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `zkattest-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, DigestParseError, TemporalError};
pub use identity::{Nonce, RequestId};
pub use temporal::{CalendarDate, Timestamp};
