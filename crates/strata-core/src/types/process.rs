//! Process, thread and architecture payload types.
//!
//! These values travel through the operation table untouched. Only the base
//! layer's generic routines look inside them (the architecture, to find the
//! breakpoint instruction and the pointer width).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Process / lightweight-process / thread triple identifying an execution context
///
/// `lwp` and `tid` are zero when the backend does not distinguish threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ptid
{
    pub pid: i32,
    pub lwp: i64,
    pub tid: i64,
}

impl Ptid
{
    /// No execution context.
    pub const NULL: Self = Ptid { pid: 0, lwp: 0, tid: 0 };

    /// Wildcard matching every execution context.
    pub const MINUS_ONE: Self = Ptid { pid: -1, lwp: 0, tid: 0 };

    /// Identify a whole process.
    #[must_use]
    pub const fn from_pid(pid: i32) -> Self
    {
        Ptid { pid, lwp: 0, tid: 0 }
    }

    #[must_use]
    pub const fn new(pid: i32, lwp: i64, tid: i64) -> Self
    {
        Ptid { pid, lwp, tid }
    }

    #[must_use]
    pub fn is_null(&self) -> bool
    {
        *self == Self::NULL
    }

    /// Whether `self` is covered by `filter`.
    ///
    /// `MINUS_ONE` matches everything and a process-wide ptid matches every
    /// thread of that process.
    ///
    /// ```rust
    /// use strata_core::types::Ptid;
    ///
    /// let thread = Ptid::new(42, 43, 0);
    /// assert!(thread.matches(Ptid::MINUS_ONE));
    /// assert!(thread.matches(Ptid::from_pid(42)));
    /// assert!(!thread.matches(Ptid::from_pid(7)));
    /// ```
    #[must_use]
    pub fn matches(&self, filter: Ptid) -> bool
    {
        if filter == Self::MINUS_ONE {
            return true;
        }
        if filter.lwp == 0 && filter.tid == 0 {
            return self.pid == filter.pid;
        }
        *self == filter
    }
}

impl fmt::Display for Ptid
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}.{}.{}", self.pid, self.lwp, self.tid)
    }
}

/// Target-independent signal number
///
/// Numbering follows the debugger's portable signal table rather than the
/// host's, so a remote or core-file layer can report signals from a foreign
/// system without translation at the dispatch level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Signal(pub i32);

impl Signal
{
    /// "No signal": resume without delivering anything.
    pub const NONE: Self = Signal(0);
    pub const INT: Self = Signal(2);
    pub const TRAP: Self = Signal(5);
    pub const KILL: Self = Signal(9);
    pub const SEGV: Self = Signal(11);
    pub const STOP: Self = Signal(17);
}

impl fmt::Display for Signal
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match *self {
            Signal::NONE => write!(f, "0"),
            Signal::INT => write!(f, "SIGINT"),
            Signal::TRAP => write!(f, "SIGTRAP"),
            Signal::KILL => write!(f, "SIGKILL"),
            Signal::SEGV => write!(f, "SIGSEGV"),
            Signal::STOP => write!(f, "SIGSTOP"),
            Signal(other) => write!(f, "signal {other}"),
        }
    }
}

/// Event reported by `wait`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitStatus
{
    /// The process exited with the given code.
    Exited(i32),
    /// The thread stopped with a signal.
    Stopped(Signal),
    /// The process was terminated by a signal.
    Signalled(Signal),
    /// A shared library was loaded or unloaded.
    Loaded,
    /// The process forked; the payload is the child.
    Forked(Ptid),
    /// The process vforked; the payload is the child.
    Vforked(Ptid),
    /// The process called exec on the given path.
    Execd(String),
    SyscallEntry(u32),
    SyscallReturn(u32),
    /// Nothing of interest happened; the caller should resume again.
    Spurious,
    /// The backend wants the event ignored.
    Ignore,
    /// There are no resumed threads left to wait for.
    NoResumed,
}

/// Options for `wait`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaitOptions
{
    /// Return immediately with `WaitStatus::Ignore` if nothing is pending.
    pub nohang: bool,
}

/// CPU architecture of the debug target
///
/// The base layer uses it for two generic routines: the breakpoint
/// instruction written by software breakpoints, and the widest region a
/// hardware watchpoint can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture
{
    /// 64-bit ARM
    Arm64,
    /// 64-bit x86
    X86_64,
    /// Anything else; the string is the architecture name.
    Unknown(&'static str),
}

impl Architecture
{
    /// Architecture of the running binary, used as the default target.
    #[must_use]
    pub const fn current() -> Self
    {
        #[cfg(target_arch = "aarch64")]
        {
            Architecture::Arm64
        }

        #[cfg(target_arch = "x86_64")]
        {
            Architecture::X86_64
        }

        #[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
        {
            Architecture::Unknown(std::env::consts::ARCH)
        }
    }

    /// Size of a pointer in bytes.
    #[must_use]
    pub const fn pointer_size_bytes(self) -> u8
    {
        match self {
            Architecture::Arm64 | Architecture::X86_64 | Architecture::Unknown(_) => 8,
        }
    }

    /// Bytes of the software breakpoint instruction (`BRK #0` / `INT3`).
    ///
    /// Empty for architectures we cannot plant breakpoints on.
    #[must_use]
    pub const fn breakpoint_instruction(self) -> &'static [u8]
    {
        match self {
            Architecture::Arm64 => &[0x00, 0x00, 0x20, 0xd4],
            Architecture::X86_64 => &[0xcc],
            Architecture::Unknown(_) => &[],
        }
    }
}

impl Default for Architecture
{
    fn default() -> Self
    {
        Self::current()
    }
}

impl fmt::Display for Architecture
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Architecture::Arm64 => write!(f, "arm64"),
            Architecture::X86_64 => write!(f, "x86_64"),
            Architecture::Unknown(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for Architecture
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            "x86_64" | "x86-64" | "amd64" => Ok(Architecture::X86_64),
            _ => Err(format!("Unknown architecture: {s}. Use 'arm64' or 'x86_64'")),
        }
    }
}

/// Raw register contents for one thread
///
/// Registers are keyed by the backend's register number and stored as raw
/// target-endian bytes; the core never decodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterCache
{
    pub ptid: Ptid,
    pub arch: Architecture,
    values: BTreeMap<u32, Vec<u8>>,
}

impl RegisterCache
{
    #[must_use]
    pub fn new(ptid: Ptid, arch: Architecture) -> Self
    {
        Self {
            ptid,
            arch,
            values: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, regno: u32, bytes: impl Into<Vec<u8>>)
    {
        self.values.insert(regno, bytes.into());
    }

    #[must_use]
    pub fn get(&self, regno: u32) -> Option<&[u8]>
    {
        self.values.get(&regno).map(Vec::as_slice)
    }

    /// Registers in ascending register-number order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])>
    {
        self.values.iter().map(|(regno, bytes)| (*regno, bytes.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.values.is_empty()
    }
}
