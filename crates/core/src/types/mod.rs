//! Core types for Latchkey.
//!
//! This module provides type-safe wrappers for the identity concepts shared
//! by the server and the CLI.

pub mod email;
pub mod id;

pub use email::{Email, EmailError, IdentifierCase, ParseIdentifierCaseError};
pub use id::*;
