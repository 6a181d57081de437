//! # At-Rest Encryption
//!
//! Generated audio is sealed with a symmetric key before it touches the disk.
//! The key lives for the lifetime of the process unless one is injected
//! through configuration.

pub mod cipher;

pub use cipher::{Cipher, CipherError};
