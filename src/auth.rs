//! API credentials and the HMAC request signature scheme.

pub mod credentials;
pub mod signature;

pub use credentials::*;
pub use signature::*;
