//! Dispatch every catalog operation against the base layer alone.

use strata_core::prelude::*;

/// Print what a base-only stack answers for every operation.
pub fn run(config: &BaseConfig)
{
    let stack = Stack::with_config(config);
    println!("Base layer answers ({}):", config.arch);
    for op in Op::ALL {
        match stack.dispatch(sample_call(op, config.arch)) {
            Ok(reply) => println!("  {:<32} ok    {:?}", op.name(), reply),
            Err(e) => println!("  {:<32} error {}", op.name(), e),
        }
    }
}

/// Arguments good enough to reach every default.
fn sample_call(op: Op, arch: Architecture) -> Call
{
    let addr = Address::new(0x1000);
    let ptid = Ptid::from_pid(1);
    let bp = BreakpointTarget::new(addr);
    match op {
        Op::Attach => Call::Attach {
            args: "1".to_string(),
            from_tty: false,
        },
        Op::PostAttach => Call::PostAttach { pid: 1 },
        Op::Detach => Call::Detach {
            args: None,
            from_tty: false,
        },
        Op::Resume => Call::Resume {
            ptid: Ptid::MINUS_ONE,
            step: false,
            signal: Signal::NONE,
        },
        Op::Wait => Call::Wait {
            ptid: Ptid::MINUS_ONE,
            options: WaitOptions::default(),
        },
        Op::StoreRegisters => Call::StoreRegisters {
            regcache: RegisterCache::new(ptid, arch),
            regno: None,
        },
        Op::PrepareToStore => Call::PrepareToStore {
            regcache: RegisterCache::new(ptid, arch),
        },
        Op::FilesInfo => Call::FilesInfo,
        Op::InsertBreakpoint => Call::InsertBreakpoint { arch, bp },
        Op::RemoveBreakpoint => Call::RemoveBreakpoint { arch, bp },
        Op::CanUseHwBreakpoint => Call::CanUseHwBreakpoint {
            kind: HwResourceKind::Breakpoint,
            count: 1,
            other: 0,
        },
        Op::InsertHwBreakpoint => Call::InsertHwBreakpoint { arch, bp },
        Op::RemoveHwBreakpoint => Call::RemoveHwBreakpoint { arch, bp },
        Op::RemoveWatchpoint => Call::RemoveWatchpoint {
            addr,
            len: 4,
            kind: WatchKind::Write,
            cond: None,
        },
        Op::InsertWatchpoint => Call::InsertWatchpoint {
            addr,
            len: 4,
            kind: WatchKind::Write,
            cond: None,
        },
        Op::StoppedByWatchpoint => Call::StoppedByWatchpoint,
        Op::StoppedDataAddress => Call::StoppedDataAddress,
        Op::WatchpointAddrWithinRange => Call::WatchpointAddrWithinRange {
            addr,
            start: addr,
            len: 4,
        },
        Op::RegionOkForHwWatchpoint => Call::RegionOkForHwWatchpoint { addr, len: 4 },
        Op::CanAccelWatchpointCondition => Call::CanAccelWatchpointCondition {
            addr,
            len: 4,
            kind: WatchKind::Write,
            cond: None,
        },
        Op::TerminalInit => Call::TerminalInit,
        Op::TerminalInferior => Call::TerminalInferior,
        Op::TerminalOursForOutput => Call::TerminalOursForOutput,
        Op::TerminalOurs => Call::TerminalOurs,
        Op::TerminalSaveOurs => Call::TerminalSaveOurs,
        Op::TerminalInfo => Call::TerminalInfo {
            args: None,
            from_tty: false,
        },
        Op::Load => Call::Load {
            args: String::new(),
            from_tty: false,
        },
        Op::PostStartupInferior => Call::PostStartupInferior { ptid },
        Op::InsertForkCatchpoint => Call::InsertForkCatchpoint { pid: 1 },
        Op::RemoveForkCatchpoint => Call::RemoveForkCatchpoint { pid: 1 },
        Op::InsertVforkCatchpoint => Call::InsertVforkCatchpoint { pid: 1 },
        Op::RemoveVforkCatchpoint => Call::RemoveVforkCatchpoint { pid: 1 },
        Op::InsertExecCatchpoint => Call::InsertExecCatchpoint { pid: 1 },
        Op::RemoveExecCatchpoint => Call::RemoveExecCatchpoint { pid: 1 },
        Op::SetSyscallCatchpoint => Call::SetSyscallCatchpoint(SyscallCatch::default()),
        Op::Rcmd => Call::Rcmd {
            command: "help".to_string(),
        },
        Op::CanAsyncP => Call::CanAsyncP,
        Op::IsAsyncP => Call::IsAsyncP,
        Op::Async => Call::Async { callback: None },
        Op::XferPartial => Call::XferPartial(XferRequest::read_memory(addr, 4)),
        Op::SupportsBtrace => Call::SupportsBtrace,
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_sample_calls_match_their_operation()
    {
        for op in Op::ALL {
            assert_eq!(sample_call(op, Architecture::X86_64).op(), op);
        }
    }

    #[test]
    fn test_base_defaults_never_fail_structurally()
    {
        let stack = Stack::new();
        for op in Op::ALL {
            if let Err(e) = stack.dispatch(sample_call(op, Architecture::Arm64)) {
                assert!(!e.is_structural(), "{op}: {e}");
            }
        }
    }
}
