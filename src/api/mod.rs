//! API Module
//!
//! Read-only admin HTTP surface over the shared cache.
//!
//! # Endpoints
//! - `GET /stats` - Cache statistics
//! - `GET /cache` - Cached URIs with size and rank
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
