//! # Typed Operations
//!
//! [`TargetOps`] wraps every catalog operation in a method with a typed
//! signature: it builds the [`Call`], routes it, and unwraps the reply shape.
//!
//! It is implemented for [`Stack`] (dispatch from the top) and for
//! [`LayerRef`] (invoke a specific layer, typically the one beneath). Layer
//! implementations therefore read the same as front-end code:
//!
//! ```rust
//! use strata_core::prelude::*;
//!
//! let tracing_layer = Layer::builder("tracer")
//!     .implement(Op::FilesInfo, |this, _| {
//!         // Report our own state, then whatever is beneath.
//!         this.beneath()?.files_info()?;
//!         Ok(Reply::Unit)
//!     })
//!     .build();
//!
//! let mut stack = Stack::new();
//! stack.push(tracing_layer)?;
//! stack.files_info()?;
//! # Ok::<(), StrataError>(())
//! ```
//!
//! Capability queries (`can_async_p`, `is_async_p`, `stopped_by_watchpoint`,
//! `region_ok_for_hw_watchpoint`, `can_accel_watchpoint_condition`,
//! `supports_btrace`) answer `false` when no layer supports them.

use crate::call::{AsyncCallback, Call, Reply};
use crate::catalog::Op;
use crate::error::{StrataError, StrataResult};
use crate::stack::{LayerRef, Stack};
use crate::types::{
    Address, Architecture, BreakpointTarget, HwResourceKind, Ptid, RegisterCache, Signal, SyscallCatch, WaitOptions,
    WaitStatus, WatchCondition, WatchKind, XferReply, XferRequest, XferStatus,
};

/// Map the "not supported" answer of a capability query to `false`.
fn capability(result: StrataResult<bool>) -> StrataResult<bool>
{
    match result {
        Err(StrataError::Unsupported { .. }) => Ok(false),
        other => other,
    }
}

/// Fail unless `[address, address + len)` lies inside the address space.
fn check_range(address: Address, len: u64) -> StrataResult<()>
{
    match len.checked_sub(1) {
        Some(last) if address.checked_add(last).is_none() => Err(StrataError::Memory {
            address,
            status: XferStatus::IoError,
        }),
        _ => Ok(()),
    }
}

/// Typed access to the operation catalog
#[allow(clippy::missing_errors_doc)]
pub trait TargetOps
{
    /// Route one untyped call.
    fn call(&self, call: Call) -> StrataResult<Reply>;

    fn attach(&self, args: &str, from_tty: bool) -> StrataResult<()>
    {
        self.call(Call::Attach {
            args: args.to_string(),
            from_tty,
        })?
        .into_unit(Op::Attach)
    }

    fn post_attach(&self, pid: i32) -> StrataResult<()>
    {
        self.call(Call::PostAttach { pid })?.into_unit(Op::PostAttach)
    }

    fn detach(&self, args: Option<&str>, from_tty: bool) -> StrataResult<()>
    {
        self.call(Call::Detach {
            args: args.map(str::to_string),
            from_tty,
        })?
        .into_unit(Op::Detach)
    }

    fn resume(&self, ptid: Ptid, step: bool, signal: Signal) -> StrataResult<()>
    {
        self.call(Call::Resume { ptid, step, signal })?.into_unit(Op::Resume)
    }

    fn wait(&self, ptid: Ptid, options: WaitOptions) -> StrataResult<(Ptid, WaitStatus)>
    {
        self.call(Call::Wait { ptid, options })?.into_waited(Op::Wait)
    }

    fn store_registers(&self, regcache: RegisterCache, regno: Option<u32>) -> StrataResult<()>
    {
        self.call(Call::StoreRegisters { regcache, regno })?
            .into_unit(Op::StoreRegisters)
    }

    fn prepare_to_store(&self, regcache: RegisterCache) -> StrataResult<()>
    {
        self.call(Call::PrepareToStore { regcache })?.into_unit(Op::PrepareToStore)
    }

    fn files_info(&self) -> StrataResult<()>
    {
        self.call(Call::FilesInfo)?.into_unit(Op::FilesInfo)
    }

    /// Insert a software breakpoint; the reply records how it was placed.
    fn insert_breakpoint(&self, arch: Architecture, bp: BreakpointTarget) -> StrataResult<BreakpointTarget>
    {
        self.call(Call::InsertBreakpoint { arch, bp })?
            .into_breakpoint(Op::InsertBreakpoint)
    }

    fn remove_breakpoint(&self, arch: Architecture, bp: BreakpointTarget) -> StrataResult<()>
    {
        self.call(Call::RemoveBreakpoint { arch, bp })?
            .into_unit(Op::RemoveBreakpoint)
    }

    /// Positive if the resources are available, zero if not, negative if
    /// this kind of resource is not supported at all.
    fn can_use_hw_breakpoint(&self, kind: HwResourceKind, count: u32, other: u32) -> StrataResult<i32>
    {
        self.call(Call::CanUseHwBreakpoint { kind, count, other })?
            .into_count(Op::CanUseHwBreakpoint)
    }

    fn insert_hw_breakpoint(&self, arch: Architecture, bp: BreakpointTarget) -> StrataResult<BreakpointTarget>
    {
        self.call(Call::InsertHwBreakpoint { arch, bp })?
            .into_breakpoint(Op::InsertHwBreakpoint)
    }

    fn remove_hw_breakpoint(&self, arch: Architecture, bp: BreakpointTarget) -> StrataResult<()>
    {
        self.call(Call::RemoveHwBreakpoint { arch, bp })?
            .into_unit(Op::RemoveHwBreakpoint)
    }

    fn remove_watchpoint(
        &self,
        addr: Address,
        len: u64,
        kind: WatchKind,
        cond: Option<WatchCondition>,
    ) -> StrataResult<()>
    {
        self.call(Call::RemoveWatchpoint { addr, len, kind, cond })?
            .into_unit(Op::RemoveWatchpoint)
    }

    fn insert_watchpoint(
        &self,
        addr: Address,
        len: u64,
        kind: WatchKind,
        cond: Option<WatchCondition>,
    ) -> StrataResult<()>
    {
        self.call(Call::InsertWatchpoint { addr, len, kind, cond })?
            .into_unit(Op::InsertWatchpoint)
    }

    fn stopped_by_watchpoint(&self) -> StrataResult<bool>
    {
        capability(
            self.call(Call::StoppedByWatchpoint)
                .and_then(|reply| reply.into_bool(Op::StoppedByWatchpoint)),
        )
    }

    fn stopped_data_address(&self) -> StrataResult<Option<Address>>
    {
        self.call(Call::StoppedDataAddress)?
            .into_address(Op::StoppedDataAddress)
    }

    fn watchpoint_addr_within_range(&self, addr: Address, start: Address, len: u64) -> StrataResult<bool>
    {
        self.call(Call::WatchpointAddrWithinRange { addr, start, len })?
            .into_bool(Op::WatchpointAddrWithinRange)
    }

    fn region_ok_for_hw_watchpoint(&self, addr: Address, len: u64) -> StrataResult<bool>
    {
        capability(
            self.call(Call::RegionOkForHwWatchpoint { addr, len })
                .and_then(|reply| reply.into_bool(Op::RegionOkForHwWatchpoint)),
        )
    }

    fn can_accel_watchpoint_condition(
        &self,
        addr: Address,
        len: u64,
        kind: WatchKind,
        cond: Option<WatchCondition>,
    ) -> StrataResult<bool>
    {
        capability(
            self.call(Call::CanAccelWatchpointCondition { addr, len, kind, cond })
                .and_then(|reply| reply.into_bool(Op::CanAccelWatchpointCondition)),
        )
    }

    fn terminal_init(&self) -> StrataResult<()>
    {
        self.call(Call::TerminalInit)?.into_unit(Op::TerminalInit)
    }

    fn terminal_inferior(&self) -> StrataResult<()>
    {
        self.call(Call::TerminalInferior)?.into_unit(Op::TerminalInferior)
    }

    fn terminal_ours_for_output(&self) -> StrataResult<()>
    {
        self.call(Call::TerminalOursForOutput)?
            .into_unit(Op::TerminalOursForOutput)
    }

    fn terminal_ours(&self) -> StrataResult<()>
    {
        self.call(Call::TerminalOurs)?.into_unit(Op::TerminalOurs)
    }

    fn terminal_save_ours(&self) -> StrataResult<()>
    {
        self.call(Call::TerminalSaveOurs)?.into_unit(Op::TerminalSaveOurs)
    }

    fn terminal_info(&self, args: Option<&str>, from_tty: bool) -> StrataResult<String>
    {
        self.call(Call::TerminalInfo {
            args: args.map(str::to_string),
            from_tty,
        })?
        .into_text(Op::TerminalInfo)
    }

    fn load(&self, args: &str, from_tty: bool) -> StrataResult<()>
    {
        self.call(Call::Load {
            args: args.to_string(),
            from_tty,
        })?
        .into_unit(Op::Load)
    }

    fn post_startup_inferior(&self, ptid: Ptid) -> StrataResult<()>
    {
        self.call(Call::PostStartupInferior { ptid })?
            .into_unit(Op::PostStartupInferior)
    }

    fn insert_fork_catchpoint(&self, pid: i32) -> StrataResult<()>
    {
        self.call(Call::InsertForkCatchpoint { pid })?
            .into_unit(Op::InsertForkCatchpoint)
    }

    fn remove_fork_catchpoint(&self, pid: i32) -> StrataResult<()>
    {
        self.call(Call::RemoveForkCatchpoint { pid })?
            .into_unit(Op::RemoveForkCatchpoint)
    }

    fn insert_vfork_catchpoint(&self, pid: i32) -> StrataResult<()>
    {
        self.call(Call::InsertVforkCatchpoint { pid })?
            .into_unit(Op::InsertVforkCatchpoint)
    }

    fn remove_vfork_catchpoint(&self, pid: i32) -> StrataResult<()>
    {
        self.call(Call::RemoveVforkCatchpoint { pid })?
            .into_unit(Op::RemoveVforkCatchpoint)
    }

    fn insert_exec_catchpoint(&self, pid: i32) -> StrataResult<()>
    {
        self.call(Call::InsertExecCatchpoint { pid })?
            .into_unit(Op::InsertExecCatchpoint)
    }

    fn remove_exec_catchpoint(&self, pid: i32) -> StrataResult<()>
    {
        self.call(Call::RemoveExecCatchpoint { pid })?
            .into_unit(Op::RemoveExecCatchpoint)
    }

    fn set_syscall_catchpoint(&self, catch: SyscallCatch) -> StrataResult<()>
    {
        self.call(Call::SetSyscallCatchpoint(catch))?
            .into_unit(Op::SetSyscallCatchpoint)
    }

    /// Send a raw monitor command; returns its output.
    fn rcmd(&self, command: &str) -> StrataResult<String>
    {
        self.call(Call::Rcmd {
            command: command.to_string(),
        })?
        .into_text(Op::Rcmd)
    }

    fn can_async_p(&self) -> StrataResult<bool>
    {
        capability(
            self.call(Call::CanAsyncP)
                .and_then(|reply| reply.into_bool(Op::CanAsyncP)),
        )
    }

    fn is_async_p(&self) -> StrataResult<bool>
    {
        capability(
            self.call(Call::IsAsyncP)
                .and_then(|reply| reply.into_bool(Op::IsAsyncP)),
        )
    }

    /// The `async` operation. `None` turns async notification off.
    fn set_async(&self, callback: Option<AsyncCallback>) -> StrataResult<()>
    {
        self.call(Call::Async { callback })?.into_unit(Op::Async)
    }

    fn xfer_partial(&self, request: XferRequest) -> StrataResult<XferReply>
    {
        self.call(Call::XferPartial(request))?.into_xfer(Op::XferPartial)
    }

    fn supports_btrace(&self) -> StrataResult<bool>
    {
        capability(
            self.call(Call::SupportsBtrace)
                .and_then(|reply| reply.into_bool(Op::SupportsBtrace)),
        )
    }

    /// Read exactly `len` bytes of memory, looping over partial transfers.
    ///
    /// Fails with `Memory` at the first address where a transfer makes no
    /// progress, or at `address` if the range runs past the end of the
    /// address space.
    fn read_memory(&self, address: Address, len: u64) -> StrataResult<Vec<u8>>
    {
        check_range(address, len)?;
        let mut data = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
        let mut done = 0u64;
        while done < len {
            let at = address.checked_add(done).ok_or(StrataError::Memory {
                address,
                status: XferStatus::IoError,
            })?;
            let remaining = len - done;
            let reply = self.xfer_partial(XferRequest::read_memory(at, remaining))?;
            let take = reply
                .data
                .len()
                .min(usize::try_from(remaining).unwrap_or(usize::MAX));
            if !matches!(reply.status, XferStatus::Ok { .. }) || take == 0 {
                return Err(StrataError::Memory {
                    address: at,
                    status: reply.status,
                });
            }
            data.extend_from_slice(&reply.data[..take]);
            done += take as u64;
        }
        Ok(data)
    }

    /// Write all of `data` at `address`, looping over partial transfers.
    ///
    /// Nothing is written if the range runs past the end of the address space.
    fn write_memory(&self, address: Address, data: &[u8]) -> StrataResult<()>
    {
        check_range(address, data.len() as u64)?;
        let mut done = 0usize;
        while done < data.len() {
            let at = address.checked_add(done as u64).ok_or(StrataError::Memory {
                address,
                status: XferStatus::IoError,
            })?;
            let reply = self.xfer_partial(XferRequest::write_memory(at, &data[done..]))?;
            let progress = usize::try_from(reply.transferred())
                .unwrap_or(usize::MAX)
                .min(data.len() - done);
            if progress == 0 {
                return Err(StrataError::Memory {
                    address: at,
                    status: reply.status,
                });
            }
            done += progress;
        }
        Ok(())
    }
}

impl TargetOps for Stack
{
    fn call(&self, call: Call) -> StrataResult<Reply>
    {
        self.dispatch(call)
    }
}

impl TargetOps for LayerRef<'_>
{
    fn call(&self, call: Call) -> StrataResult<Reply>
    {
        self.invoke(call)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn capability_maps_only_unsupported()
    {
        assert_eq!(capability(Err(StrataError::Unsupported { op: Op::CanAsyncP })), Ok(false));
        assert_eq!(capability(Ok(true)), Ok(true));
        assert_eq!(
            capability(Err(StrataError::NoProcess { op: Op::Resume })),
            Err(StrataError::NoProcess { op: Op::Resume })
        );
    }

    #[test]
    fn base_only_stack_answers_capability_queries_with_false()
    {
        let stack = Stack::new();
        assert_eq!(stack.can_async_p(), Ok(false));
        assert_eq!(stack.is_async_p(), Ok(false));
        assert_eq!(stack.supports_btrace(), Ok(false));
        assert_eq!(stack.stopped_by_watchpoint(), Ok(false));
    }

    #[test]
    fn read_memory_of_zero_bytes_does_not_dispatch()
    {
        let stack = Stack::new();
        assert_eq!(stack.read_memory(Address::new(0x1000), 0), Ok(Vec::new()));
        assert_eq!(stack.write_memory(Address::new(0x1000), &[]), Ok(()));
    }

    #[test]
    fn ranges_may_end_at_the_top_of_the_address_space()
    {
        assert_eq!(check_range(Address::new(u64::MAX), 1), Ok(()));
        assert_eq!(check_range(Address::new(u64::MAX), 0), Ok(()));
        assert_eq!(
            check_range(Address::new(u64::MAX - 1), 3),
            Err(StrataError::Memory {
                address: Address::new(u64::MAX - 1),
                status: XferStatus::IoError,
            })
        );
    }

    #[test]
    fn read_memory_on_base_only_stack_fails_with_io_error()
    {
        let stack = Stack::new();
        let err = stack.read_memory(Address::new(0x1000), 4).unwrap_err();
        assert_eq!(
            err,
            StrataError::Memory {
                address: Address::new(0x1000),
                status: XferStatus::IoError,
            }
        );
    }
}
