pub mod adapters;
pub mod application;
pub mod domain;
pub mod infra;

// Test utilities (mocks, builders, a local mock identity provider)
#[cfg(test)]
pub mod test_utils;

// Re-exports for shorter use statements.
pub use application::*;
pub use domain::*;
