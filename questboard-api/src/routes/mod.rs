/// API route handlers
///
/// - `health`: Health check endpoint
/// - `state`: User document endpoints

pub mod health;
pub mod state;
