/// Login and bearer session handling.
pub mod auth_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Completion predicates and phase recomputation.
pub mod lifecycle;
/// Player registration.
pub mod player_service;
/// Round lifecycle operations: rounds, submissions, votes and comments.
pub mod round_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
