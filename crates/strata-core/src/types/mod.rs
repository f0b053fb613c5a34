//! # Types
//!
//! Payload types carried through the operation table.
//!
//! The stack forwards these unchanged from the caller to whichever layer
//! answers; they exist so each operation has a typed signature instead of an
//! untyped argument bag.

pub mod address;
pub mod breakpoint;
pub mod process;
pub mod xfer;

pub use address::Address;
pub use breakpoint::{BreakpointTarget, HwResourceKind, SyscallCatch, WatchCondition, WatchKind};
pub use process::{Architecture, Ptid, RegisterCache, Signal, WaitOptions, WaitStatus};
pub use xfer::{XferDirection, XferObject, XferReply, XferRequest, XferStatus};
