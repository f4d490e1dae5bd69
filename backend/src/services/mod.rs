//! Module for core business logic services.
//!
//! This module encapsulates services that perform account operations and
//! the object store used to host uploaded images.

pub mod object_store;
pub mod user_service;
