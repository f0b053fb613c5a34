//! # Operation Catalog
//!
//! Static description of every operation a layer can implement.
//!
//! Each operation has one [`Op`] identity and one [`OpDescriptor`] in
//! [`CATALOG`], in the same order. The descriptor records the operation's
//! parameter and return shapes and how the chain terminates when no layer
//! above the base implements it.
//!
//! ## Fallback policies
//!
//! Every operation is forwardable: a layer that leaves a slot unset gets a
//! trampoline to the layer beneath (see [`crate::resolver`]). The policy
//! classifies where the real implementation is expected:
//!
//! - [`Fallback::Forward`]: some backend lower in the stack owns it
//!   (process control, terminal handling, catchpoints, memory transfer).
//! - [`Fallback::TerminalDefault`]: the base layer's own answer is the usual
//!   one: a no-op, a sentinel, "unsupported", "no process", or a generic
//!   routine built on other operations (software breakpoints, watchpoint
//!   range checks).
//! - [`Fallback::SearchStack`]: scan the stack for a layer that can perform
//!   the operation.
//!
//! What the base layer actually does is recorded separately as a
//! [`BaseDefault`]; a `Forward` operation still ends in one.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

/// Identity of a dispatchable operation
///
/// The discriminant is the operation's index into [`CATALOG`] and into every
/// layer's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Op
{
    Attach,
    PostAttach,
    Detach,
    Resume,
    Wait,
    StoreRegisters,
    PrepareToStore,
    FilesInfo,
    InsertBreakpoint,
    RemoveBreakpoint,
    CanUseHwBreakpoint,
    InsertHwBreakpoint,
    RemoveHwBreakpoint,
    RemoveWatchpoint,
    InsertWatchpoint,
    StoppedByWatchpoint,
    StoppedDataAddress,
    WatchpointAddrWithinRange,
    RegionOkForHwWatchpoint,
    CanAccelWatchpointCondition,
    TerminalInit,
    TerminalInferior,
    TerminalOursForOutput,
    TerminalOurs,
    TerminalSaveOurs,
    TerminalInfo,
    Load,
    PostStartupInferior,
    InsertForkCatchpoint,
    RemoveForkCatchpoint,
    InsertVforkCatchpoint,
    RemoveVforkCatchpoint,
    InsertExecCatchpoint,
    RemoveExecCatchpoint,
    SetSyscallCatchpoint,
    Rcmd,
    CanAsyncP,
    IsAsyncP,
    Async,
    XferPartial,
    SupportsBtrace,
}

impl Op
{
    /// Number of operations in the catalog.
    pub const COUNT: usize = 41;

    /// Every operation, in catalog order.
    pub const ALL: [Op; Op::COUNT] = [
        Op::Attach,
        Op::PostAttach,
        Op::Detach,
        Op::Resume,
        Op::Wait,
        Op::StoreRegisters,
        Op::PrepareToStore,
        Op::FilesInfo,
        Op::InsertBreakpoint,
        Op::RemoveBreakpoint,
        Op::CanUseHwBreakpoint,
        Op::InsertHwBreakpoint,
        Op::RemoveHwBreakpoint,
        Op::RemoveWatchpoint,
        Op::InsertWatchpoint,
        Op::StoppedByWatchpoint,
        Op::StoppedDataAddress,
        Op::WatchpointAddrWithinRange,
        Op::RegionOkForHwWatchpoint,
        Op::CanAccelWatchpointCondition,
        Op::TerminalInit,
        Op::TerminalInferior,
        Op::TerminalOursForOutput,
        Op::TerminalOurs,
        Op::TerminalSaveOurs,
        Op::TerminalInfo,
        Op::Load,
        Op::PostStartupInferior,
        Op::InsertForkCatchpoint,
        Op::RemoveForkCatchpoint,
        Op::InsertVforkCatchpoint,
        Op::RemoveVforkCatchpoint,
        Op::InsertExecCatchpoint,
        Op::RemoveExecCatchpoint,
        Op::SetSyscallCatchpoint,
        Op::Rcmd,
        Op::CanAsyncP,
        Op::IsAsyncP,
        Op::Async,
        Op::XferPartial,
        Op::SupportsBtrace,
    ];

    /// Position in [`CATALOG`] and in layer tables.
    #[must_use]
    pub const fn index(self) -> usize
    {
        self as usize
    }

    #[must_use]
    pub fn descriptor(self) -> &'static OpDescriptor
    {
        &CATALOG[self.index()]
    }

    /// Catalog name, e.g. `"xfer_partial"`.
    #[must_use]
    pub fn name(self) -> &'static str
    {
        self.descriptor().name
    }

    #[must_use]
    pub fn fallback(self) -> Fallback
    {
        self.descriptor().fallback
    }

    /// Look an operation up by catalog name.
    ///
    /// ```rust
    /// use strata_core::catalog::Op;
    ///
    /// assert_eq!(Op::from_name("xfer_partial"), Some(Op::XferPartial));
    /// assert_eq!(Op::from_name("frobnicate"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Op>
    {
        static BY_NAME: Lazy<HashMap<&'static str, Op>> =
            Lazy::new(|| CATALOG.iter().map(|entry| (entry.name, entry.op)).collect());

        BY_NAME.get(name).copied()
    }
}

impl fmt::Display for Op
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// Where an operation's real implementation is expected to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fallback
{
    /// Passed down layer by layer until the layer owning the concern answers.
    Forward,
    /// Answered by the base layer itself when no layer above claims it.
    TerminalDefault,
    /// Scan the stack for a capable layer.
    SearchStack,
}

impl fmt::Display for Fallback
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Fallback::Forward => write!(f, "forward"),
            Fallback::TerminalDefault => write!(f, "terminal-default"),
            Fallback::SearchStack => write!(f, "search-stack"),
        }
    }
}

/// Concrete behavior of the base layer's implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseDefault
{
    /// Succeeds doing nothing.
    NoOp,
    /// Returns a fixed neutral value (false, zero, none, I/O-error status, fixed text).
    Sentinel,
    /// Fails with "not supported by the current target stack".
    Unsupported,
    /// Fails with "no active process".
    NoProcess,
    /// Computed from the arguments or from other dispatched operations.
    Computed,
    /// Searches the stack for a capable layer.
    Search,
}

impl fmt::Display for BaseDefault
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            BaseDefault::NoOp => write!(f, "no-op"),
            BaseDefault::Sentinel => write!(f, "sentinel"),
            BaseDefault::Unsupported => write!(f, "unsupported"),
            BaseDefault::NoProcess => write!(f, "no process"),
            BaseDefault::Computed => write!(f, "computed"),
            BaseDefault::Search => write!(f, "search"),
        }
    }
}

/// Shape of an operation's successful reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnShape
{
    Unit,
    Bool,
    Count,
    Waited,
    Breakpoint,
    Address,
    Text,
    Xfer,
}

impl fmt::Display for ReturnShape
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            ReturnShape::Unit => "unit",
            ReturnShape::Bool => "bool",
            ReturnShape::Count => "count",
            ReturnShape::Waited => "(ptid, status)",
            ReturnShape::Breakpoint => "breakpoint",
            ReturnShape::Address => "address?",
            ReturnShape::Text => "text",
            ReturnShape::Xfer => "xfer",
        };
        f.write_str(name)
    }
}

/// Immutable description of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpDescriptor
{
    pub op: Op,
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub returns: ReturnShape,
    pub fallback: Fallback,
    pub default: BaseDefault,
}

const fn entry(
    op: Op,
    name: &'static str,
    params: &'static [&'static str],
    returns: ReturnShape,
    fallback: Fallback,
    default: BaseDefault,
) -> OpDescriptor
{
    OpDescriptor {
        op,
        name,
        params,
        returns,
        fallback,
        default,
    }
}

const WATCH_PARAMS: &[&str] = &["addr", "len", "kind", "cond"];
const BP_PARAMS: &[&str] = &["arch", "bp"];

use BaseDefault::{Computed, NoOp, NoProcess, Search, Sentinel, Unsupported};
use Fallback::{Forward, SearchStack, TerminalDefault};
use ReturnShape::{Bool, Breakpoint, Count, Text, Unit, Waited, Xfer};

/// The operation catalog, indexed by [`Op::index`].
pub static CATALOG: [OpDescriptor; Op::COUNT] = [
    entry(Op::Attach, "attach", &["args", "from_tty"], Unit, SearchStack, Search),
    entry(Op::PostAttach, "post_attach", &["pid"], Unit, TerminalDefault, NoOp),
    entry(Op::Detach, "detach", &["args", "from_tty"], Unit, Forward, NoOp),
    entry(Op::Resume, "resume", &["ptid", "step", "signal"], Unit, Forward, NoProcess),
    entry(Op::Wait, "wait", &["ptid", "options"], Waited, Forward, NoProcess),
    entry(Op::StoreRegisters, "store_registers", &["regcache", "regno"], Unit, Forward, NoProcess),
    entry(Op::PrepareToStore, "prepare_to_store", &["regcache"], Unit, TerminalDefault, NoProcess),
    entry(Op::FilesInfo, "files_info", &[], Unit, Forward, NoOp),
    entry(Op::InsertBreakpoint, "insert_breakpoint", BP_PARAMS, Breakpoint, TerminalDefault, Computed),
    entry(Op::RemoveBreakpoint, "remove_breakpoint", BP_PARAMS, Unit, TerminalDefault, Computed),
    entry(
        Op::CanUseHwBreakpoint,
        "can_use_hw_breakpoint",
        &["kind", "count", "other"],
        Count,
        TerminalDefault,
        Sentinel,
    ),
    entry(Op::InsertHwBreakpoint, "insert_hw_breakpoint", BP_PARAMS, Breakpoint, TerminalDefault, Unsupported),
    entry(Op::RemoveHwBreakpoint, "remove_hw_breakpoint", BP_PARAMS, Unit, TerminalDefault, Unsupported),
    entry(Op::RemoveWatchpoint, "remove_watchpoint", WATCH_PARAMS, Unit, TerminalDefault, Unsupported),
    entry(Op::InsertWatchpoint, "insert_watchpoint", WATCH_PARAMS, Unit, TerminalDefault, Unsupported),
    entry(Op::StoppedByWatchpoint, "stopped_by_watchpoint", &[], Bool, TerminalDefault, Sentinel),
    entry(
        Op::StoppedDataAddress,
        "stopped_data_address",
        &[],
        ReturnShape::Address,
        TerminalDefault,
        Sentinel,
    ),
    entry(
        Op::WatchpointAddrWithinRange,
        "watchpoint_addr_within_range",
        &["addr", "start", "len"],
        Bool,
        TerminalDefault,
        Computed,
    ),
    entry(
        Op::RegionOkForHwWatchpoint,
        "region_ok_for_hw_watchpoint",
        &["addr", "len"],
        Bool,
        TerminalDefault,
        Computed,
    ),
    entry(
        Op::CanAccelWatchpointCondition,
        "can_accel_watchpoint_condition",
        WATCH_PARAMS,
        Bool,
        TerminalDefault,
        Sentinel,
    ),
    entry(Op::TerminalInit, "terminal_init", &[], Unit, Forward, NoOp),
    entry(Op::TerminalInferior, "terminal_inferior", &[], Unit, Forward, NoOp),
    entry(Op::TerminalOursForOutput, "terminal_ours_for_output", &[], Unit, Forward, NoOp),
    entry(Op::TerminalOurs, "terminal_ours", &[], Unit, Forward, NoOp),
    entry(Op::TerminalSaveOurs, "terminal_save_ours", &[], Unit, Forward, NoOp),
    entry(Op::TerminalInfo, "terminal_info", &["args", "from_tty"], Text, Forward, Sentinel),
    entry(Op::Load, "load", &["args", "from_tty"], Unit, TerminalDefault, Unsupported),
    entry(Op::PostStartupInferior, "post_startup_inferior", &["ptid"], Unit, TerminalDefault, NoOp),
    entry(Op::InsertForkCatchpoint, "insert_fork_catchpoint", &["pid"], Unit, Forward, Unsupported),
    entry(Op::RemoveForkCatchpoint, "remove_fork_catchpoint", &["pid"], Unit, Forward, Unsupported),
    entry(Op::InsertVforkCatchpoint, "insert_vfork_catchpoint", &["pid"], Unit, Forward, Unsupported),
    entry(Op::RemoveVforkCatchpoint, "remove_vfork_catchpoint", &["pid"], Unit, Forward, Unsupported),
    entry(Op::InsertExecCatchpoint, "insert_exec_catchpoint", &["pid"], Unit, Forward, Unsupported),
    entry(Op::RemoveExecCatchpoint, "remove_exec_catchpoint", &["pid"], Unit, Forward, Unsupported),
    entry(
        Op::SetSyscallCatchpoint,
        "set_syscall_catchpoint",
        &["pid", "needed", "any_count", "table"],
        Unit,
        Forward,
        Unsupported,
    ),
    entry(Op::Rcmd, "rcmd", &["command"], Text, TerminalDefault, Unsupported),
    entry(Op::CanAsyncP, "can_async_p", &[], Bool, SearchStack, Search),
    entry(Op::IsAsyncP, "is_async_p", &[], Bool, SearchStack, Search),
    entry(Op::Async, "async", &["callback"], Unit, TerminalDefault, Unsupported),
    entry(
        Op::XferPartial,
        "xfer_partial",
        &["object", "annex", "offset", "len", "direction"],
        Xfer,
        Forward,
        Sentinel,
    ),
    entry(Op::SupportsBtrace, "supports_btrace", &[], Bool, Forward, Sentinel),
];

/// Operations whose chain terminates with the given policy, in catalog order.
pub fn with_fallback(fallback: Fallback) -> impl Iterator<Item = Op>
{
    Op::ALL.into_iter().filter(move |op| op.fallback() == fallback)
}

#[cfg(test)]
mod tests
{
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_is_indexed_by_op()
    {
        for (index, descriptor) in CATALOG.iter().enumerate() {
            assert_eq!(descriptor.op.index(), index, "{} is out of place", descriptor.name);
        }
        for (index, op) in Op::ALL.iter().enumerate() {
            assert_eq!(op.index(), index);
        }
    }

    #[test]
    fn names_are_unique_and_round_trip()
    {
        let names: HashSet<_> = CATALOG.iter().map(|entry| entry.name).collect();
        assert_eq!(names.len(), Op::COUNT);
        for op in Op::ALL {
            assert_eq!(Op::from_name(op.name()), Some(op));
        }
    }

    #[test]
    fn search_stack_operations()
    {
        let search: Vec<_> = with_fallback(Fallback::SearchStack).collect();
        assert_eq!(search, vec![Op::Attach, Op::CanAsyncP, Op::IsAsyncP]);
    }

    #[test]
    fn forward_operations_are_the_pass_through_concerns()
    {
        let forward: Vec<_> = with_fallback(Fallback::Forward).collect();
        assert_eq!(
            forward,
            vec![
                Op::Detach,
                Op::Resume,
                Op::Wait,
                Op::StoreRegisters,
                Op::FilesInfo,
                Op::TerminalInit,
                Op::TerminalInferior,
                Op::TerminalOursForOutput,
                Op::TerminalOurs,
                Op::TerminalSaveOurs,
                Op::TerminalInfo,
                Op::InsertForkCatchpoint,
                Op::RemoveForkCatchpoint,
                Op::InsertVforkCatchpoint,
                Op::RemoveVforkCatchpoint,
                Op::InsertExecCatchpoint,
                Op::RemoveExecCatchpoint,
                Op::SetSyscallCatchpoint,
                Op::XferPartial,
                Op::SupportsBtrace,
            ]
        );
    }

    #[test]
    fn computed_defaults_are_terminal()
    {
        for op in [
            Op::InsertBreakpoint,
            Op::RemoveBreakpoint,
            Op::WatchpointAddrWithinRange,
            Op::RegionOkForHwWatchpoint,
        ] {
            assert_eq!(op.descriptor().default, BaseDefault::Computed);
            assert_eq!(op.fallback(), Fallback::TerminalDefault);
        }
    }

    #[test]
    fn process_lifecycle_defaults_need_a_process()
    {
        for op in [Op::Resume, Op::Wait, Op::StoreRegisters, Op::PrepareToStore] {
            assert_eq!(op.descriptor().default, BaseDefault::NoProcess);
        }
        assert_eq!(Op::PrepareToStore.fallback(), Fallback::TerminalDefault);
        assert_eq!(Op::Resume.fallback(), Fallback::Forward);
    }

    #[test]
    fn only_search_defaults_search_the_stack()
    {
        for entry in &CATALOG {
            assert_eq!(
                entry.fallback == Fallback::SearchStack,
                entry.default == BaseDefault::Search,
                "{}",
                entry.name
            );
        }
    }
}
