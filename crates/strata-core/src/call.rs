//! # Calls and Replies
//!
//! A [`Call`] is one operation invocation with its arguments; a [`Reply`] is
//! what the answering layer returned. The stack routes a call by
//! [`Call::op`] and hands it to the answering layer unchanged.

use std::fmt;
use std::sync::Arc;

use crate::catalog::{Op, ReturnShape};
use crate::error::{StrataError, StrataResult};
use crate::types::{
    Address, Architecture, BreakpointTarget, HwResourceKind, Ptid, RegisterCache, Signal, SyscallCatch, WaitOptions,
    WaitStatus, WatchCondition, WatchKind, XferReply, XferRequest,
};

/// Event delivered to an async completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferiorEvent
{
    /// The target has an event ready to be collected with `wait`.
    Ready,
    /// A previously started execution command completed.
    ExecComplete,
    /// The target's event source failed; async mode is no longer reliable.
    Error,
}

/// Completion callback registered through the `async` operation
///
/// The layer that honors the registration invokes it from its own event
/// source; the stack never calls it.
#[derive(Clone)]
pub struct AsyncCallback(Arc<dyn Fn(InferiorEvent) + Send + Sync>);

impl AsyncCallback
{
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(InferiorEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    pub fn notify(&self, event: InferiorEvent)
    {
        (self.0)(event);
    }
}

impl fmt::Debug for AsyncCallback
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str("AsyncCallback(..)")
    }
}

/// One operation invocation
///
/// There is exactly one variant per catalog entry, carrying that operation's
/// parameters.
#[derive(Debug, Clone)]
pub enum Call
{
    Attach
    {
        args: String, from_tty: bool
    },
    PostAttach
    {
        pid: i32
    },
    Detach
    {
        args: Option<String>, from_tty: bool
    },
    Resume
    {
        ptid: Ptid, step: bool, signal: Signal
    },
    Wait
    {
        ptid: Ptid, options: WaitOptions
    },
    StoreRegisters
    {
        regcache: RegisterCache,
        /// `None` stores every register.
        regno: Option<u32>,
    },
    PrepareToStore
    {
        regcache: RegisterCache
    },
    FilesInfo,
    InsertBreakpoint
    {
        arch: Architecture, bp: BreakpointTarget
    },
    RemoveBreakpoint
    {
        arch: Architecture, bp: BreakpointTarget
    },
    CanUseHwBreakpoint
    {
        kind: HwResourceKind, count: u32, other: u32
    },
    InsertHwBreakpoint
    {
        arch: Architecture, bp: BreakpointTarget
    },
    RemoveHwBreakpoint
    {
        arch: Architecture, bp: BreakpointTarget
    },
    RemoveWatchpoint
    {
        addr: Address,
        len: u64,
        kind: WatchKind,
        cond: Option<WatchCondition>,
    },
    InsertWatchpoint
    {
        addr: Address,
        len: u64,
        kind: WatchKind,
        cond: Option<WatchCondition>,
    },
    StoppedByWatchpoint,
    StoppedDataAddress,
    WatchpointAddrWithinRange
    {
        addr: Address, start: Address, len: u64
    },
    RegionOkForHwWatchpoint
    {
        addr: Address, len: u64
    },
    CanAccelWatchpointCondition
    {
        addr: Address,
        len: u64,
        kind: WatchKind,
        cond: Option<WatchCondition>,
    },
    TerminalInit,
    TerminalInferior,
    TerminalOursForOutput,
    TerminalOurs,
    TerminalSaveOurs,
    TerminalInfo
    {
        args: Option<String>, from_tty: bool
    },
    Load
    {
        args: String, from_tty: bool
    },
    PostStartupInferior
    {
        ptid: Ptid
    },
    InsertForkCatchpoint
    {
        pid: i32
    },
    RemoveForkCatchpoint
    {
        pid: i32
    },
    InsertVforkCatchpoint
    {
        pid: i32
    },
    RemoveVforkCatchpoint
    {
        pid: i32
    },
    InsertExecCatchpoint
    {
        pid: i32
    },
    RemoveExecCatchpoint
    {
        pid: i32
    },
    SetSyscallCatchpoint(SyscallCatch),
    Rcmd
    {
        command: String
    },
    CanAsyncP,
    IsAsyncP,
    /// `None` switches async notification off.
    Async
    {
        callback: Option<AsyncCallback>
    },
    XferPartial(XferRequest),
    SupportsBtrace,
}

impl Call
{
    /// Operation this call invokes.
    #[must_use]
    pub fn op(&self) -> Op
    {
        match self {
            Call::Attach { .. } => Op::Attach,
            Call::PostAttach { .. } => Op::PostAttach,
            Call::Detach { .. } => Op::Detach,
            Call::Resume { .. } => Op::Resume,
            Call::Wait { .. } => Op::Wait,
            Call::StoreRegisters { .. } => Op::StoreRegisters,
            Call::PrepareToStore { .. } => Op::PrepareToStore,
            Call::FilesInfo => Op::FilesInfo,
            Call::InsertBreakpoint { .. } => Op::InsertBreakpoint,
            Call::RemoveBreakpoint { .. } => Op::RemoveBreakpoint,
            Call::CanUseHwBreakpoint { .. } => Op::CanUseHwBreakpoint,
            Call::InsertHwBreakpoint { .. } => Op::InsertHwBreakpoint,
            Call::RemoveHwBreakpoint { .. } => Op::RemoveHwBreakpoint,
            Call::RemoveWatchpoint { .. } => Op::RemoveWatchpoint,
            Call::InsertWatchpoint { .. } => Op::InsertWatchpoint,
            Call::StoppedByWatchpoint => Op::StoppedByWatchpoint,
            Call::StoppedDataAddress => Op::StoppedDataAddress,
            Call::WatchpointAddrWithinRange { .. } => Op::WatchpointAddrWithinRange,
            Call::RegionOkForHwWatchpoint { .. } => Op::RegionOkForHwWatchpoint,
            Call::CanAccelWatchpointCondition { .. } => Op::CanAccelWatchpointCondition,
            Call::TerminalInit => Op::TerminalInit,
            Call::TerminalInferior => Op::TerminalInferior,
            Call::TerminalOursForOutput => Op::TerminalOursForOutput,
            Call::TerminalOurs => Op::TerminalOurs,
            Call::TerminalSaveOurs => Op::TerminalSaveOurs,
            Call::TerminalInfo { .. } => Op::TerminalInfo,
            Call::Load { .. } => Op::Load,
            Call::PostStartupInferior { .. } => Op::PostStartupInferior,
            Call::InsertForkCatchpoint { .. } => Op::InsertForkCatchpoint,
            Call::RemoveForkCatchpoint { .. } => Op::RemoveForkCatchpoint,
            Call::InsertVforkCatchpoint { .. } => Op::InsertVforkCatchpoint,
            Call::RemoveVforkCatchpoint { .. } => Op::RemoveVforkCatchpoint,
            Call::InsertExecCatchpoint { .. } => Op::InsertExecCatchpoint,
            Call::RemoveExecCatchpoint { .. } => Op::RemoveExecCatchpoint,
            Call::SetSyscallCatchpoint(_) => Op::SetSyscallCatchpoint,
            Call::Rcmd { .. } => Op::Rcmd,
            Call::CanAsyncP => Op::CanAsyncP,
            Call::IsAsyncP => Op::IsAsyncP,
            Call::Async { .. } => Op::Async,
            Call::XferPartial(_) => Op::XferPartial,
            Call::SupportsBtrace => Op::SupportsBtrace,
        }
    }
}

/// Result value of a successful operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply
{
    Unit,
    Bool(bool),
    Count(i32),
    Waited
    {
        ptid: Ptid, status: WaitStatus
    },
    Breakpoint(BreakpointTarget),
    Address(Option<Address>),
    Text(String),
    Xfer(XferReply),
}

impl Reply
{
    #[must_use]
    pub fn shape(&self) -> ReturnShape
    {
        match self {
            Reply::Unit => ReturnShape::Unit,
            Reply::Bool(_) => ReturnShape::Bool,
            Reply::Count(_) => ReturnShape::Count,
            Reply::Waited { .. } => ReturnShape::Waited,
            Reply::Breakpoint(_) => ReturnShape::Breakpoint,
            Reply::Address(_) => ReturnShape::Address,
            Reply::Text(_) => ReturnShape::Text,
            Reply::Xfer(_) => ReturnShape::Xfer,
        }
    }

    fn mismatch(self, op: Op, expected: ReturnShape) -> StrataError
    {
        StrataError::ReplyMismatch {
            op,
            expected,
            got: self.shape(),
        }
    }

    /// Unwrap a `Unit` reply to `op`.
    ///
    /// ## Errors
    ///
    /// `ReplyMismatch` if the answering layer returned another shape.
    pub fn into_unit(self, op: Op) -> StrataResult<()>
    {
        match self {
            Reply::Unit => Ok(()),
            other => Err(other.mismatch(op, ReturnShape::Unit)),
        }
    }

    /// Unwrap a `Bool` reply to `op`.
    ///
    /// ## Errors
    ///
    /// `ReplyMismatch` if the answering layer returned another shape.
    pub fn into_bool(self, op: Op) -> StrataResult<bool>
    {
        match self {
            Reply::Bool(value) => Ok(value),
            other => Err(other.mismatch(op, ReturnShape::Bool)),
        }
    }

    /// Unwrap a `Count` reply to `op`.
    ///
    /// ## Errors
    ///
    /// `ReplyMismatch` if the answering layer returned another shape.
    pub fn into_count(self, op: Op) -> StrataResult<i32>
    {
        match self {
            Reply::Count(value) => Ok(value),
            other => Err(other.mismatch(op, ReturnShape::Count)),
        }
    }

    /// Unwrap a `Waited` reply to `op`.
    ///
    /// ## Errors
    ///
    /// `ReplyMismatch` if the answering layer returned another shape.
    pub fn into_waited(self, op: Op) -> StrataResult<(Ptid, WaitStatus)>
    {
        match self {
            Reply::Waited { ptid, status } => Ok((ptid, status)),
            other => Err(other.mismatch(op, ReturnShape::Waited)),
        }
    }

    /// Unwrap a `Breakpoint` reply to `op`.
    ///
    /// ## Errors
    ///
    /// `ReplyMismatch` if the answering layer returned another shape.
    pub fn into_breakpoint(self, op: Op) -> StrataResult<BreakpointTarget>
    {
        match self {
            Reply::Breakpoint(bp) => Ok(bp),
            other => Err(other.mismatch(op, ReturnShape::Breakpoint)),
        }
    }

    /// Unwrap an `Address` reply to `op`.
    ///
    /// ## Errors
    ///
    /// `ReplyMismatch` if the answering layer returned another shape.
    pub fn into_address(self, op: Op) -> StrataResult<Option<Address>>
    {
        match self {
            Reply::Address(addr) => Ok(addr),
            other => Err(other.mismatch(op, ReturnShape::Address)),
        }
    }

    /// Unwrap a `Text` reply to `op`.
    ///
    /// ## Errors
    ///
    /// `ReplyMismatch` if the answering layer returned another shape.
    pub fn into_text(self, op: Op) -> StrataResult<String>
    {
        match self {
            Reply::Text(text) => Ok(text),
            other => Err(other.mismatch(op, ReturnShape::Text)),
        }
    }

    /// Unwrap an `Xfer` reply to `op`.
    ///
    /// ## Errors
    ///
    /// `ReplyMismatch` if the answering layer returned another shape.
    pub fn into_xfer(self, op: Op) -> StrataResult<XferReply>
    {
        match self {
            Reply::Xfer(reply) => Ok(reply),
            other => Err(other.mismatch(op, ReturnShape::Xfer)),
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn reply_shape_mismatch_names_both_shapes()
    {
        let err = Reply::Bool(true).into_unit(Op::Resume).unwrap_err();
        match err {
            StrataError::ReplyMismatch { op, expected, got } => {
                assert_eq!(op, Op::Resume);
                assert_eq!(expected, ReturnShape::Unit);
                assert_eq!(got, ReturnShape::Bool);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn async_callback_is_invoked_with_event()
    {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let callback = AsyncCallback::new(move |event| {
            assert_eq!(event, InferiorEvent::Ready);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        callback.notify(InferiorEvent::Ready);
        callback.clone().notify(InferiorEvent::Ready);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn call_reports_its_operation()
    {
        assert_eq!(Call::FilesInfo.op(), Op::FilesInfo);
        assert_eq!(Call::Async { callback: None }.op(), Op::Async);
        assert_eq!(Call::InsertExecCatchpoint { pid: 1 }.op(), Op::InsertExecCatchpoint);
    }
}
