//! Collection of general utility functions.
//!
//! This module serves as a home for small, reusable helpers that do not fit
//! into a specific domain module: token signing, password hashing, cookie
//! handling and random naming.

pub mod cookies;
pub mod crypto;
pub mod generate_random_string;
pub mod jwt;
