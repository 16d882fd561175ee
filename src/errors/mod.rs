//! Error types and error handling for the front end.
//!
//! This module defines the error types used throughout analysis.
//! It includes:
//!
//! - Error structures with source position information
//! - Specific error variants for lexing, parsing and semantic analysis
//! - A coarse [`errors::ErrorKind`] classification of every variant
//! - Helpful error messages and suggestions

pub mod errors;
