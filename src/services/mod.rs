/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Age group and season suggestions for the admin UI.
pub mod metadata_service;
/// Versioned writes with save-status tracking and timeouts.
pub mod persistence;
/// Division reads, writes and roster commands.
pub mod roster_service;
/// Server-Sent Events stream of save-status changes.
pub mod sse_service;
/// Storage connection supervisor with reconnect backoff.
pub mod storage_supervisor;
