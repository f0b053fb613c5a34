//! Partial object transfer (`xfer_partial`) payloads.
//!
//! Every read or write of target memory and of auxiliary objects goes through
//! a single operation. A transfer may move fewer bytes than requested; callers
//! that need the full range loop (see [`crate::ops::TargetOps::read_memory`]).

use std::fmt;

use crate::types::Address;

/// Object being transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XferObject
{
    /// Memory, subject to any caching or breakpoint-shadow layering.
    Memory,
    /// Memory without breakpoint shadows applied.
    RawMemory,
    /// Memory known to be stack.
    StackMemory,
    /// Memory known to be code.
    CodeMemory,
    /// Auxiliary vector.
    Auxv,
    /// Target memory map description.
    MemoryMap,
    /// Shared library list.
    Libraries,
    /// Operating-system specific data, selected by the annex.
    OsData,
    /// Branch trace data.
    Btrace,
}

impl XferObject
{
    /// Whether this object addresses the inferior's memory.
    #[must_use]
    pub const fn is_memory(self) -> bool
    {
        matches!(
            self,
            XferObject::Memory | XferObject::RawMemory | XferObject::StackMemory | XferObject::CodeMemory
        )
    }
}

/// Direction of a transfer. Writes carry their payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XferDirection
{
    Read,
    Write(Vec<u8>),
}

/// Argument of `xfer_partial`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XferRequest
{
    pub object: XferObject,
    /// Object-specific qualifier (e.g. the OS data table name).
    pub annex: Option<String>,
    pub offset: u64,
    pub len: u64,
    pub direction: XferDirection,
}

impl XferRequest
{
    /// Read `len` bytes of memory at `address`.
    #[must_use]
    pub fn read_memory(address: Address, len: u64) -> Self
    {
        Self {
            object: XferObject::Memory,
            annex: None,
            offset: address.value(),
            len,
            direction: XferDirection::Read,
        }
    }

    /// Write `data` to memory at `address`.
    #[must_use]
    pub fn write_memory(address: Address, data: &[u8]) -> Self
    {
        Self {
            object: XferObject::Memory,
            annex: None,
            offset: address.value(),
            len: data.len() as u64,
            direction: XferDirection::Write(data.to_vec()),
        }
    }

    #[must_use]
    pub fn is_write(&self) -> bool
    {
        matches!(self.direction, XferDirection::Write(_))
    }

    /// Bytes to be written, empty for reads.
    #[must_use]
    pub fn write_data(&self) -> &[u8]
    {
        match &self.direction {
            XferDirection::Write(data) => data,
            XferDirection::Read => &[],
        }
    }
}

/// Outcome of one partial transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XferStatus
{
    /// Some bytes were transferred.
    Ok
    {
        transferred: u64
    },
    /// Nothing more to transfer at this offset.
    Eof,
    /// The data exists but is not available (e.g. not saved in a core dump).
    Unavailable,
    /// Generic I/O failure.
    IoError,
}

impl fmt::Display for XferStatus
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            XferStatus::Ok { transferred } => write!(f, "ok ({transferred} bytes)"),
            XferStatus::Eof => write!(f, "end of object"),
            XferStatus::Unavailable => write!(f, "unavailable"),
            XferStatus::IoError => write!(f, "I/O error"),
        }
    }
}

/// Reply of `xfer_partial`
///
/// For reads `data` holds the bytes transferred; for writes it is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XferReply
{
    pub status: XferStatus,
    pub data: Vec<u8>,
}

impl XferReply
{
    /// Successful read of `data`.
    #[must_use]
    pub fn read(data: Vec<u8>) -> Self
    {
        Self {
            status: XferStatus::Ok {
                transferred: data.len() as u64,
            },
            data,
        }
    }

    /// Successful write of `transferred` bytes.
    #[must_use]
    pub fn written(transferred: u64) -> Self
    {
        Self {
            status: XferStatus::Ok { transferred },
            data: Vec::new(),
        }
    }

    #[must_use]
    pub fn io_error() -> Self
    {
        Self::failed(XferStatus::IoError)
    }

    #[must_use]
    pub fn failed(status: XferStatus) -> Self
    {
        Self {
            status,
            data: Vec::new(),
        }
    }

    /// Bytes transferred, zero for any non-`Ok` status.
    #[must_use]
    pub fn transferred(&self) -> u64
    {
        match self.status {
            XferStatus::Ok { transferred } => transferred,
            _ => 0,
        }
    }
}
