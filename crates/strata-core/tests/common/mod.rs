//! Shared in-memory layers for the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use strata_core::prelude::*;

/// `(layer name, operation)` pairs in the order handlers ran.
pub type CallLog = Arc<Mutex<Vec<(String, Op)>>>;

pub fn call_log() -> CallLog
{
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<(String, Op)>
{
    log.lock().unwrap().clone()
}

pub fn record(log: &CallLog, layer: &str, op: Op)
{
    log.lock().unwrap().push((layer.to_string(), op));
}

/// Distinctive reply of the right shape for `op`.
pub fn sentinel_reply(op: Op) -> Reply
{
    match op.descriptor().returns {
        ReturnShape::Unit => Reply::Unit,
        ReturnShape::Bool => Reply::Bool(true),
        ReturnShape::Count => Reply::Count(7),
        ReturnShape::Waited => Reply::Waited {
            ptid: Ptid::from_pid(4242),
            status: WaitStatus::Spurious,
        },
        ReturnShape::Breakpoint => Reply::Breakpoint(BreakpointTarget::new(Address::new(0xdead))),
        ReturnShape::Address => Reply::Address(Some(Address::new(0xbeef))),
        ReturnShape::Text => Reply::Text("sentinel".to_string()),
        ReturnShape::Xfer => Reply::Xfer(XferReply::read(vec![0xaa])),
    }
}

/// A layer implementing `ops` itself: each handler records the call and
/// returns [`sentinel_reply`].
pub fn recording_layer(name: &str, ops: &[Op], log: &CallLog) -> Layer
{
    let mut builder = Layer::builder(name);
    for &op in ops {
        let log = Arc::clone(log);
        let name = name.to_string();
        builder = builder.implement(op, move |_, call| {
            record(&log, &name, call.op());
            Ok(sentinel_reply(call.op()))
        });
    }
    builder.build()
}

/// A layer implementing every operation by recording it and returning the sentinel.
pub fn recording_everything(name: &str, log: &CallLog) -> Layer
{
    recording_layer(name, &Op::ALL, log)
}

/// A layer implementing `ops` itself by recording and then passing the call beneath.
pub fn passthrough_layer(name: &str, ops: &[Op], log: &CallLog) -> Layer
{
    let mut builder = Layer::builder(name);
    for &op in ops {
        let log = Arc::clone(log);
        let name = name.to_string();
        builder = builder.implement(op, move |this, call| {
            record(&log, &name, call.op());
            this.call_beneath(call)
        });
    }
    builder.build()
}

/// Shared bytes of a [`memory_layer`].
pub type Image = Arc<Mutex<Vec<u8>>>;

/// A layer owning memory `[base, base + bytes.len())`.
///
/// Transfers move at most `chunk` bytes each. Memory outside the image
/// reports an I/O error; non-memory objects are passed beneath.
pub fn memory_layer(name: &str, base: Address, bytes: Vec<u8>, chunk: usize) -> (Layer, Image)
{
    let writable = bytes.len();
    partly_writable_memory_layer(name, base, bytes, chunk, writable)
}

/// Like [`memory_layer`], but only the first `writable` bytes accept writes.
pub fn partly_writable_memory_layer(
    name: &str,
    base: Address,
    bytes: Vec<u8>,
    chunk: usize,
    writable: usize,
) -> (Layer, Image)
{
    let image: Image = Arc::new(Mutex::new(bytes));
    let shared = Arc::clone(&image);
    let layer = Layer::builder(name)
        .implement(Op::XferPartial, move |this, call| {
            let Call::XferPartial(request) = call else {
                return Err(StrataError::InvalidArgument("expected xfer_partial".to_string()));
            };
            if !request.object.is_memory() {
                return this.call_beneath(Call::XferPartial(request));
            }

            let mut image = shared.lock().unwrap();
            let Some(offset) = request.offset.checked_sub(base.value()) else {
                return Ok(Reply::Xfer(XferReply::io_error()));
            };
            let offset = offset as usize;
            if offset >= image.len() {
                return Ok(Reply::Xfer(XferReply::io_error()));
            }
            let available = image.len() - offset;

            let reply = match &request.direction {
                XferDirection::Read => {
                    let take = (request.len as usize).min(available).min(chunk);
                    XferReply::read(image[offset..offset + take].to_vec())
                }
                XferDirection::Write(_) if offset >= writable => XferReply::io_error(),
                XferDirection::Write(data) => {
                    let take = data.len().min(available).min(chunk).min(writable - offset);
                    image[offset..offset + take].copy_from_slice(&data[..take]);
                    XferReply::written(take as u64)
                }
            };
            Ok(Reply::Xfer(reply))
        })
        .build();
    (layer, image)
}

/// Addresses touched by [`anywhere_layer`], with `true` for writes.
pub type Touched = Arc<Mutex<Vec<(Address, bool)>>>;

/// A layer that moves one byte per transfer at any address and records
/// every address it is asked for.
pub fn anywhere_layer(name: &str) -> (Layer, Touched)
{
    let touched: Touched = Arc::new(Mutex::new(Vec::new()));
    let shared = Arc::clone(&touched);
    let layer = Layer::builder(name)
        .implement(Op::XferPartial, move |_, call| {
            let Call::XferPartial(request) = call else {
                return Err(StrataError::InvalidArgument("expected xfer_partial".to_string()));
            };
            shared
                .lock()
                .unwrap()
                .push((Address::new(request.offset), request.is_write()));
            Ok(Reply::Xfer(match &request.direction {
                XferDirection::Read => XferReply::read(vec![0]),
                XferDirection::Write(_) => XferReply::written(1),
            }))
        })
        .build();
    (layer, touched)
}

/// A representative call for every operation.
pub fn sample_call(op: Op) -> Call
{
    let addr = Address::new(0x1000);
    let regcache = RegisterCache::new(Ptid::from_pid(1), Architecture::X86_64);
    let bp = BreakpointTarget::new(addr);
    match op {
        Op::Attach => Call::Attach {
            args: "1234".to_string(),
            from_tty: false,
        },
        Op::PostAttach => Call::PostAttach { pid: 1234 },
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
        Op::StoreRegisters => Call::StoreRegisters { regcache, regno: None },
        Op::PrepareToStore => Call::PrepareToStore { regcache },
        Op::FilesInfo => Call::FilesInfo,
        Op::InsertBreakpoint => Call::InsertBreakpoint {
            arch: Architecture::X86_64,
            bp,
        },
        Op::RemoveBreakpoint => Call::RemoveBreakpoint {
            arch: Architecture::X86_64,
            bp,
        },
        Op::CanUseHwBreakpoint => Call::CanUseHwBreakpoint {
            kind: HwResourceKind::Breakpoint,
            count: 1,
            other: 0,
        },
        Op::InsertHwBreakpoint => Call::InsertHwBreakpoint {
            arch: Architecture::X86_64,
            bp,
        },
        Op::RemoveHwBreakpoint => Call::RemoveHwBreakpoint {
            arch: Architecture::X86_64,
            bp,
        },
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
            addr: Address::new(0x1002),
            start: addr,
            len: 4,
        },
        Op::RegionOkForHwWatchpoint => Call::RegionOkForHwWatchpoint { addr, len: 4 },
        Op::CanAccelWatchpointCondition => Call::CanAccelWatchpointCondition {
            addr,
            len: 4,
            kind: WatchKind::Access,
            cond: Some(WatchCondition("x > 1".to_string())),
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
            args: "a.out".to_string(),
            from_tty: false,
        },
        Op::PostStartupInferior => Call::PostStartupInferior { ptid: Ptid::from_pid(1) },
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
