//! # Error Types
//!
//! Errors produced while dispatching operations and while changing the shape
//! of a target stack.
//!
//! We use `thiserror` to derive `Error` and the display messages.

use thiserror::Error;

use crate::catalog::{Op, ReturnShape};
use crate::layer::LayerId;
use crate::types::{Address, XferStatus};

/// Main error type for stack operations
///
/// ## Error Categories
///
/// 1. **Negative answers**: `Unsupported`. Normal for capability queries,
///    a genuine failure for mandatory operations.
/// 2. **Process errors**: `NoProcess`, reached when a process-lifecycle
///    operation falls through to the base layer.
/// 3. **Composition defects**: `Structural`, `ReplyMismatch`. These mean the
///    stack or one of its layers is wired wrong; callers should not retry.
/// 4. **Data errors**: `Memory`, `InvalidArgument`, `Backend`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrataError
{
    /// No layer on the stack can perform the operation
    ///
    /// Returned by the base layer's terminal defaults and by stack searches
    /// that found no capable layer.
    #[error("Operation `{op}` is not supported by the current target stack")]
    Unsupported
    {
        op: Op
    },

    /// The operation needs a live process and none is being debugged
    #[error("You can't do that without a process to debug (`{op}`)")]
    NoProcess
    {
        op: Op
    },

    /// The stack's shape or a layer's table violates an invariant
    #[error("Target stack invariant violated: {0}")]
    Structural(#[from] StructuralError),

    /// A layer answered with the wrong reply shape
    #[error("Layer answered `{op}` with a {got} reply, expected {expected}")]
    ReplyMismatch
    {
        op: Op,
        expected: ReturnShape,
        got: ReturnShape,
    },

    /// A generic routine needed target memory and the transfer failed
    #[error("Cannot access memory at address {address}: {status}")]
    Memory
    {
        address: Address,
        status: XferStatus,
    },

    /// Invalid argument passed to an operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reported by a layer's own implementation
    #[error("{layer}: {message}")]
    Backend
    {
        layer: String,
        message: String,
    },
}

impl StrataError
{
    /// Whether this error is a composition defect rather than a runtime condition.
    #[must_use]
    pub fn is_structural(&self) -> bool
    {
        matches!(self, StrataError::Structural(_) | StrataError::ReplyMismatch { .. })
    }

    /// Whether this error is the "not supported" negative answer.
    #[must_use]
    pub fn is_unsupported(&self) -> bool
    {
        matches!(self, StrataError::Unsupported { .. })
    }

    /// Convenience constructor for layer implementations.
    pub fn backend(layer: impl Into<String>, message: impl Into<String>) -> Self
    {
        StrataError::Backend {
            layer: layer.into(),
            message: message.into(),
        }
    }
}

/// Invariant violations in stack composition
///
/// Each of these indicates a programming defect in how layers were built or
/// combined, never a condition of the inferior.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError
{
    /// A layer was pushed onto a stack that has no base layer.
    #[error("cannot push onto an empty stack; install the base layer first")]
    EmptyStack,

    /// `pop` was called on a stack holding only the base layer.
    #[error("the base layer cannot be popped")]
    PopBase,

    /// `install_base` was called on a stack that already has layers.
    #[error("the stack already has a base layer")]
    BaseOccupied,

    /// A base layer was installed without an implementation for `missing`.
    #[error("base layer has no implementation for `{missing}`")]
    BaseIncomplete
    {
        missing: Op
    },

    /// A slot was still empty after resolution.
    #[error("layer `{layer}` has no handler for `{op}`")]
    UnresolvedSlot
    {
        layer: String, op: Op
    },

    /// A layer that was already resolved was pushed again.
    #[error("layer `{layer}` is already resolved and cannot be pushed again")]
    AlreadyResolved
    {
        layer: String
    },

    /// `set` was called on a layer after it was resolved.
    #[error("layer `{layer}` is sealed; cannot set `{op}`")]
    Sealed
    {
        layer: String, op: Op
    },

    /// A layer id does not name any layer on this stack.
    #[error("no layer {0} on this stack")]
    UnknownLayer(LayerId),

    /// A beneath reference would not point strictly further down the stack.
    #[error("layer {beneath} is not beneath layer {layer}")]
    InvalidBeneath
    {
        layer: LayerId, beneath: LayerId
    },

    /// Forwarding was attempted from the bottom of the stack.
    #[error("layer {layer} has nothing beneath it")]
    NoBeneath
    {
        layer: LayerId
    },

    /// A handler was invoked with a call for a different operation.
    #[error("handler for `{expected}` received a `{got}` call")]
    CallMismatch
    {
        expected: Op, got: Op
    },
}

/// Convenience type alias for `Result<T, StrataError>`
///
/// ```rust
/// use strata_core::error::StrataResult;
/// fn foo() -> StrataResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type StrataResult<T> = std::result::Result<T, StrataError>;
