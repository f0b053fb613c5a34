//! Breakpoint, watchpoint and catchpoint payloads.

use std::fmt;

use crate::types::Address;

/// Placement record for one breakpoint location
///
/// The front end fills in the requested address; whichever layer places the
/// breakpoint records what it did (the placed address, the bytes it
/// overwrote, their size) so the same layer, or the base layer's generic
/// routine, can undo it later.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BreakpointTarget
{
    /// Address the front end asked for.
    pub requested_address: Address,
    /// Address actually patched (may differ after adjustment by a layer).
    pub placed_address: Address,
    /// Original bytes saved before the breakpoint instruction was written.
    pub shadow_contents: Vec<u8>,
    /// Number of bytes patched. Zero means "not placed".
    pub placed_size: usize,
    /// Range length for hardware breakpoints that cover more than one instruction.
    pub length: u64,
}

impl BreakpointTarget
{
    #[must_use]
    pub fn new(address: Address) -> Self
    {
        Self {
            requested_address: address,
            placed_address: address,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_placed(&self) -> bool
    {
        self.placed_size > 0
    }
}

/// Access type that triggers a data watchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchKind
{
    Write,
    Read,
    /// Read or write.
    Access,
}

impl fmt::Display for WatchKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            WatchKind::Write => write!(f, "write"),
            WatchKind::Read => write!(f, "read"),
            WatchKind::Access => write!(f, "access"),
        }
    }
}

/// Hardware resource class asked about by `can_use_hw_breakpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwResourceKind
{
    Breakpoint,
    WriteWatchpoint,
    ReadWatchpoint,
    AccessWatchpoint,
}

/// Watchpoint condition expression, opaque to the stack
///
/// Layers that can evaluate conditions in the target (`can_accel_watchpoint_condition`)
/// parse it themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchCondition(pub String);

impl fmt::Display for WatchCondition
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

/// Request for `set_syscall_catchpoint`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyscallCatch
{
    pub pid: i32,
    /// Whether any syscall catchpoint is wanted at all.
    pub needed: bool,
    /// Number of catchpoints that catch every syscall.
    pub any_count: u32,
    /// Per-syscall-number catch counts, indexed by syscall number.
    pub table: Vec<u32>,
}
