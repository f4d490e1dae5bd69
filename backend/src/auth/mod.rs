//! Authentication module for managing sessions and access control.
//!
//! This module provides the public interface for login, logout, token
//! rotation, password change and the authorization middleware.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
