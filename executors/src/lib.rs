//! # Flowgate Executors
//!
//! Concrete flow executors for the flowgate identity flow engine, plus the
//! service seams they compose, the flow factory that constructs them, and an
//! observability adapter that publishes per-node lifecycle events.
//!
//! ## Architecture
//!
//! Executors are stateless beyond injected service handles. Services are
//! **interfaces**, not implementations: each external collaborator
//! (credential store, OAuth client core, OTP channel, passkey service,
//! user/group/role/OU stores) is a trait in [`services`], injected through a
//! [`FlowEnvironment`](environment::FlowEnvironment). This enables:
//!
//! - **Testing**: in-memory mocks (see [`mocks`], behind the default-on
//!   `test-utils` feature)
//! - **Production**: real service clients
//!
//! Multi-mode executors (SMS-OTP, passkey) dispatch on the node's
//! `executor_mode` tag; OAuth provider variants (OIDC, GitHub, Google) share
//! one executor core. The [`factory`] module is the single registration
//! point mapping [`ExecutorKind`](flowgate_core::ExecutorKind) to a
//! constructed executor.
//!
//! ## Example: basic authentication
//!
//! ```rust,ignore
//! use flowgate_core::{Executor, ExecutorStatus, FlowType, NodeContext};
//! use flowgate_executors::executors::BasicAuthExecutor;
//!
//! let executor = BasicAuthExecutor::new(users, credentials);
//! let ctx = NodeContext::new("flow-1", FlowType::Authentication)
//!     .with_user_input("username", "testuser")
//!     .with_user_input("password", "password123");
//!
//! let resp = executor.execute(&ctx).await?;
//! assert_eq!(resp.status, ExecutorStatus::Complete);
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod environment;
pub mod executors;
pub mod factory;
pub mod observability;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export the core contract for downstream convenience
pub use flowgate_core::{
    Executor, ExecutorError, ExecutorKind, ExecutorResponse, ExecutorStatus, FlowType,
    NodeContext, ServiceError,
};

pub use environment::FlowEnvironment;
pub use factory::{FlowExecutor, build_executor, build_observed_executor};
pub use observability::Observed;
