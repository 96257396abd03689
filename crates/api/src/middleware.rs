/// Error handling middleware for API error responses
pub mod error_handling;
/// Caller identity extraction from request headers
pub mod identity;
