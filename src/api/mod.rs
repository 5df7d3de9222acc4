/// Generation API module
///
/// This module owns everything that crosses the wire:
/// - Request/response data types (models.rs)
/// - The error taxonomy shown to the user (error.rs)
/// - The HTTP client and the bounded job-polling loop (client.rs)
///
/// The API itself is a black box: a REST endpoint that generates
/// panoramas and 3D worlds, either synchronously or behind a polled job.

pub mod models;
pub mod error;
pub mod client;

pub use client::{ApiClient, JobSource, PollPolicy};
pub use error::ApiError;
