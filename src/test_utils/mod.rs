//! Test utilities.
//!
//! This module provides:
//! - In-memory implementations of the session, management and audit ports
//! - `TestAppStateBuilder` for HTTP-level tests against the mocks
//! - A local mock identity provider for exercising the real HTTP adapters

mod app_state_builder;
mod mock_idp;
mod mocks;

pub use app_state_builder::*;
pub use mock_idp::*;
pub use mocks::*;
