//! # Flowgate Core
//!
//! Engine-facing contract for the flowgate identity flow engine.
//!
//! A flow (authentication or registration journey) is a graph of nodes driven
//! by an external engine. Each node is bound to an *executor*; the engine
//! invokes [`Executor::execute`] with a per-step [`NodeContext`] and inspects
//! the returned [`ExecutorResponse`] to decide whether to advance, suspend for
//! user input, redirect the caller, complete the flow, or fail.
//!
//! This crate defines:
//!
//! - the context and response types exchanged between engine and executors
//! - the [`Executor`] trait and the [`ExecutorBase`] composition helper that
//!   supplies the default lifecycle behavior (metadata, input-presence checks,
//!   prerequisite checks, user-id extraction)
//! - the error taxonomy separating client-visible flow failures from
//!   server-side faults
//! - the reserved runtime-data and node-property key constants
//!
//! Concrete executors live in the `flowgate-executors` crate.
//!
//! ## Example
//!
//! ```rust,ignore
//! use flowgate_core::{Executor, ExecutorStatus, FlowType, NodeContext};
//!
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
pub mod constants;
pub mod context;
pub mod error;
pub mod executor;
pub mod response;

// Re-export main types for convenience
pub use context::{Application, AuthenticatedUser, FlowType, NodeContext};
pub use error::{ExecutorError, ServiceError, ServiceErrorKind};
pub use executor::{Executor, ExecutorBase, ExecutorKind};
pub use response::{ExecutorResponse, ExecutorStatus, InputDescriptor};
