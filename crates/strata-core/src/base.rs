//! # Base Layer
//!
//! The bottom of every stack. It implements every catalog operation, so any
//! forwarding chain ends here:
//!
//! - terminal defaults answer on their own (succeed silently, return a
//!   neutral value, or fail with "not supported" / "no process");
//! - search defaults hand the call to the topmost layer that implements the
//!   operation itself;
//! - generic routines compose an answer from other operations dispatched on
//!   the same stack, e.g. software breakpoints are planted with
//!   `xfer_partial` reads and writes.
//!
//! [`memory_insert_breakpoint`] and [`memory_remove_breakpoint`] are public so
//! backends that own memory can reuse them as their own implementation.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::call::{Call, Reply};
use crate::catalog::Op;
use crate::config::BaseConfig;
use crate::error::{StrataError, StrataResult, StructuralError};
use crate::layer::{Handler, Layer, LayerInfo, SlotOrigin};
use crate::ops::TargetOps;
use crate::stack::LayerRef;
use crate::types::{Address, Architecture, XferReply};

/// Text returned by the base layer's `terminal_info`.
pub const NO_TERMINAL_INFO: &str = "No saved terminal information.";

/// Build the base layer for `config`. Every slot is filled.
#[must_use]
pub fn base_layer(config: &BaseConfig) -> Layer
{
    let mut layer = Layer::new(LayerInfo {
        shortname: "base".to_string(),
        longname: "Base layer".to_string(),
        doc: "Terminal defaults for every operation; always at the bottom of the stack.".to_string(),
    });
    for op in Op::ALL {
        layer.fill(op, default_handler(op, config.arch), SlotOrigin::BaseDefault);
    }
    layer
}

fn default_handler(op: Op, arch: Architecture) -> Handler
{
    match op {
        Op::Attach | Op::CanAsyncP | Op::IsAsyncP => Arc::new(search),

        Op::PostAttach
        | Op::Detach
        | Op::FilesInfo
        | Op::TerminalInit
        | Op::TerminalInferior
        | Op::TerminalOursForOutput
        | Op::TerminalOurs
        | Op::TerminalSaveOurs
        | Op::PostStartupInferior => Arc::new(no_op),

        Op::Resume | Op::Wait | Op::StoreRegisters | Op::PrepareToStore => Arc::new(no_process),

        Op::CanUseHwBreakpoint => sentinel(Reply::Count(0)),
        Op::StoppedByWatchpoint | Op::CanAccelWatchpointCondition | Op::SupportsBtrace => {
            sentinel(Reply::Bool(false))
        }
        Op::StoppedDataAddress => sentinel(Reply::Address(None)),
        Op::TerminalInfo => sentinel(Reply::Text(NO_TERMINAL_INFO.to_string())),
        Op::XferPartial => sentinel(Reply::Xfer(XferReply::io_error())),

        Op::InsertHwBreakpoint
        | Op::RemoveHwBreakpoint
        | Op::RemoveWatchpoint
        | Op::InsertWatchpoint
        | Op::Load
        | Op::InsertForkCatchpoint
        | Op::RemoveForkCatchpoint
        | Op::InsertVforkCatchpoint
        | Op::RemoveVforkCatchpoint
        | Op::InsertExecCatchpoint
        | Op::RemoveExecCatchpoint
        | Op::SetSyscallCatchpoint
        | Op::Rcmd
        | Op::Async => Arc::new(unsupported),

        Op::InsertBreakpoint => Arc::new(memory_insert_breakpoint),
        Op::RemoveBreakpoint => Arc::new(memory_remove_breakpoint),
        Op::WatchpointAddrWithinRange => Arc::new(watchpoint_addr_within_range),
        Op::RegionOkForHwWatchpoint => {
            Arc::new(move |this: LayerRef<'_>, call: Call| region_ok_for_hw_watchpoint(this, call, arch))
        }
    }
}

fn call_mismatch(expected: Op, got: Op) -> StrataError
{
    StructuralError::CallMismatch { expected, got }.into()
}

fn search(this: LayerRef<'_>, call: Call) -> StrataResult<Reply>
{
    this.search(call)
}

fn no_op(_: LayerRef<'_>, call: Call) -> StrataResult<Reply>
{
    trace!("`{}` reached the base layer; nothing to do", call.op());
    Ok(Reply::Unit)
}

fn no_process(_: LayerRef<'_>, call: Call) -> StrataResult<Reply>
{
    debug!("`{}` reached the base layer without a process", call.op());
    Err(StrataError::NoProcess { op: call.op() })
}

fn unsupported(_: LayerRef<'_>, call: Call) -> StrataResult<Reply>
{
    debug!("`{}` is not supported by any layer", call.op());
    Err(StrataError::Unsupported { op: call.op() })
}

fn sentinel(reply: Reply) -> Handler
{
    Arc::new(move |_: LayerRef<'_>, _: Call| -> StrataResult<Reply> { Ok(reply.clone()) })
}

/// Plant a software breakpoint by patching memory through the stack.
///
/// Reads the bytes at the placed address into the shadow, then writes the
/// architecture's breakpoint instruction over them. Both transfers are
/// dispatched from the top of the stack, so whichever layer owns memory
/// performs them.
///
/// ## Errors
///
/// - `Unsupported` if the architecture has no breakpoint instruction
/// - `Memory` if the shadow cannot be read or the instruction written; the
///   shadow is written back first so a partial write does not linger
pub fn memory_insert_breakpoint(this: LayerRef<'_>, call: Call) -> StrataResult<Reply>
{
    let got = call.op();
    let Call::InsertBreakpoint { arch, mut bp } = call else {
        return Err(call_mismatch(Op::InsertBreakpoint, got));
    };

    let instruction = arch.breakpoint_instruction();
    if instruction.is_empty() {
        return Err(StrataError::Unsupported {
            op: Op::InsertBreakpoint,
        });
    }

    let stack = this.stack();
    let shadow = stack.read_memory(bp.placed_address, instruction.len() as u64)?;
    if let Err(err) = stack.write_memory(bp.placed_address, instruction) {
        // A partial write leaves part of the trap in place.
        if let Err(restore) = stack.write_memory(bp.placed_address, &shadow) {
            warn!("Could not restore {} after a failed breakpoint insert: {restore}", bp.placed_address);
        }
        return Err(err);
    }

    debug!("Inserted {arch} breakpoint at {}", bp.placed_address);
    bp.shadow_contents = shadow;
    bp.placed_size = instruction.len();
    Ok(Reply::Breakpoint(bp))
}

/// Undo [`memory_insert_breakpoint`] by writing the shadow back.
///
/// ## Errors
///
/// - `InvalidArgument` if the breakpoint was never placed
/// - `Memory` if the shadow cannot be written
pub fn memory_remove_breakpoint(this: LayerRef<'_>, call: Call) -> StrataResult<Reply>
{
    let got = call.op();
    let Call::RemoveBreakpoint { bp, .. } = call else {
        return Err(call_mismatch(Op::RemoveBreakpoint, got));
    };

    if !bp.is_placed() {
        return Err(StrataError::InvalidArgument(format!(
            "breakpoint at {} was never placed",
            bp.requested_address
        )));
    }

    this.stack().write_memory(bp.placed_address, &bp.shadow_contents)?;
    debug!("Removed breakpoint at {}", bp.placed_address);
    Ok(Reply::Unit)
}

fn watchpoint_addr_within_range(_: LayerRef<'_>, call: Call) -> StrataResult<Reply>
{
    match call {
        Call::WatchpointAddrWithinRange { addr, start, len } => Ok(Reply::Bool(addr.within(start, len))),
        other => Err(call_mismatch(Op::WatchpointAddrWithinRange, other.op())),
    }
}

fn region_ok_for_hw_watchpoint(this: LayerRef<'_>, call: Call, arch: Architecture) -> StrataResult<Reply>
{
    let (addr, len) = match call {
        Call::RegionOkForHwWatchpoint { addr, len } => (addr, len),
        other => return Err(call_mismatch(Op::RegionOkForHwWatchpoint, other.op())),
    };

    if len > u64::from(arch.pointer_size_bytes()) {
        return Ok(Reply::Bool(false));
    }
    Ok(Reply::Bool(region_is_readable(&this, addr, len)?))
}

fn region_is_readable(this: &LayerRef<'_>, addr: Address, len: u64) -> StrataResult<bool>
{
    match this.stack().read_memory(addr, len) {
        Ok(_) => Ok(true),
        Err(StrataError::Memory { status, .. }) => {
            trace!("Watch region {addr} (+{len}) is not readable: {status}");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn base_layer_fills_every_slot_with_defaults()
    {
        let layer = base_layer(&BaseConfig::default());
        for op in Op::ALL {
            assert_eq!(layer.origin(op), Some(SlotOrigin::BaseDefault), "{op}");
            assert!(!layer.provides(op));
        }
        assert_eq!(layer.shortname(), "base");
        assert!(!layer.is_resolved());
    }

    #[test]
    fn unknown_architecture_cannot_plant_breakpoints()
    {
        assert!(Architecture::Unknown("sparc").breakpoint_instruction().is_empty());
    }
}
