//! Common module for library exports

pub use crate::call::{AsyncCallback, Call, InferiorEvent, Reply};
pub use crate::catalog::{BaseDefault, Fallback, Op, OpDescriptor, ReturnShape, CATALOG};
pub use crate::config::BaseConfig;
pub use crate::error::{StrataError, StrataResult, StructuralError};
pub use crate::layer::{Handler, Layer, LayerBuilder, LayerId, LayerInfo, SlotOrigin};
pub use crate::ops::TargetOps;
pub use crate::stack::{LayerRef, Stack};
pub use crate::types::address::Address;
pub use crate::types::breakpoint::{BreakpointTarget, HwResourceKind, SyscallCatch, WatchCondition, WatchKind};
pub use crate::types::process::{Architecture, Ptid, RegisterCache, Signal, WaitOptions, WaitStatus};
pub use crate::types::xfer::{XferDirection, XferObject, XferReply, XferRequest, XferStatus};
