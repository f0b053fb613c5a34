//! # strata-core
//!
//! Layered operation dispatch for debugger targets.
//!
//! A debugger talks to its inferior through a stack of backends: an
//! executable file, a core dump, a live process, a remote stub, a recording.
//! Each backend implements some of the operations in the catalog and leaves
//! the rest to whatever sits beneath it. This crate provides:
//! - The operation catalog ([`catalog`]) and typed call payloads ([`call`], [`types`])
//! - Layers with sealed operation tables ([`layer`])
//! - The stack that orders layers and dispatches calls ([`stack`])
//! - Late-bound forwarding for unset operations ([`resolver`])
//! - The base layer that terminates every chain ([`base`])
//! - Typed wrappers over dispatch ([`ops::TargetOps`])
//!
//! ## Quick start
//!
//! ```rust
//! use strata_core::prelude::*;
//!
//! let mut stack = Stack::new();
//! stack.push(
//!     Layer::builder("native")
//!         .implement(Op::CanAsyncP, |_, _| Ok(Reply::Bool(true)))
//!         .build(),
//! )?;
//!
//! assert!(stack.can_async_p()?);
//! assert_eq!(stack.terminal_info(None, false)?, "No saved terminal information.");
//! # Ok::<(), StrataError>(())
//! ```
//!
//! The crate contains no `unsafe` code and no platform bindings; backends
//! live outside it.

pub mod base;
pub mod call;
pub mod catalog;
pub mod config;
pub mod error;
pub mod layer;
pub mod ops;
pub mod prelude;
pub mod resolver;
pub mod stack;
pub mod types;

pub use call::{Call, Reply};
pub use catalog::{Fallback, Op};
pub use config::BaseConfig;
// Re-export commonly used types
pub use error::{StrataError, StrataResult, StructuralError};
pub use layer::{Layer, LayerBuilder, LayerId};
pub use ops::TargetOps;
pub use stack::{LayerRef, Stack};
