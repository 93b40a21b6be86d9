//! HTTP service for the generation chain.
//!
//! Exposes the three chained stages (text-to-image, image-to-multiview,
//! multiview-to-mesh) over REST and serves the generated files
//! statically under `/images` and `/files`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
