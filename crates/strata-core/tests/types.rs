//! Tests for payload types and the catalog

use strata_core::catalog::{with_fallback, BaseDefault, Fallback, Op, CATALOG};
use strata_core::types::{
    Address, Architecture, BreakpointTarget, Ptid, RegisterCache, Signal, XferDirection, XferObject, XferReply,
    XferRequest, XferStatus,
};

#[test]
fn test_address_from_u64()
{
    let addr = Address::from(0x1000);
    assert_eq!(addr.value(), 0x1000);
    let value: u64 = addr.into();
    assert_eq!(value, 0x1000);
}

#[test]
fn test_address_checked_add()
{
    assert_eq!(Address::new(0x10).checked_add(0x10), Some(Address::new(0x20)));
    assert_eq!(Address::new(u64::MAX).checked_add(1), None);
    assert_eq!(format!("{:x}", Address::new(0xbeef)), "beef");
}

#[test]
fn test_ptid_matching()
{
    let thread = Ptid::new(10, 11, 0);
    assert!(thread.matches(Ptid::MINUS_ONE));
    assert!(thread.matches(Ptid::from_pid(10)));
    assert!(thread.matches(thread));
    assert!(!thread.matches(Ptid::new(10, 12, 0)));
    assert!(Ptid::NULL.is_null());
    assert_eq!(thread.to_string(), "10.11.0");
}

#[test]
fn test_signal_display()
{
    assert_eq!(Signal::TRAP.to_string(), "SIGTRAP");
    assert_eq!(Signal(63).to_string(), "signal 63");
    assert_eq!(Signal::default(), Signal::NONE);
}

#[test]
fn test_architecture_parsing()
{
    assert_eq!("arm64".parse::<Architecture>(), Ok(Architecture::Arm64));
    assert_eq!("amd64".parse::<Architecture>(), Ok(Architecture::X86_64));
    assert!("mips".parse::<Architecture>().is_err());
    assert_eq!(Architecture::X86_64.breakpoint_instruction(), &[0xcc]);
    assert_eq!(Architecture::Arm64.breakpoint_instruction().len(), 4);
    assert_eq!(Architecture::Arm64.pointer_size_bytes(), 8);
}

#[test]
fn test_register_cache()
{
    let mut regs = RegisterCache::new(Ptid::from_pid(7), Architecture::X86_64);
    assert!(regs.is_empty());
    regs.set(16, vec![0x10, 0x20]);
    regs.set(0, [0u8; 8]);
    assert_eq!(regs.len(), 2);
    assert_eq!(regs.get(16), Some(&[0x10, 0x20][..]));
    assert_eq!(regs.iter().map(|(regno, _)| regno).collect::<Vec<_>>(), vec![0, 16]);
}

#[test]
fn test_breakpoint_target_new()
{
    let bp = BreakpointTarget::new(Address::new(0x400));
    assert_eq!(bp.requested_address, bp.placed_address);
    assert!(!bp.is_placed());
    assert!(bp.shadow_contents.is_empty());
}

#[test]
fn test_xfer_request_builders()
{
    let read = XferRequest::read_memory(Address::new(0x10), 4);
    assert_eq!(read.object, XferObject::Memory);
    assert_eq!(read.offset, 0x10);
    assert!(!read.is_write());

    let write = XferRequest::write_memory(Address::new(0x20), &[1, 2, 3]);
    assert!(write.is_write());
    assert_eq!(write.len, 3);
    assert_eq!(write.direction, XferDirection::Write(vec![1, 2, 3]));
    assert_eq!(write.write_data(), &[1, 2, 3]);
}

#[test]
fn test_xfer_reply_transferred()
{
    assert_eq!(XferReply::read(vec![1, 2]).transferred(), 2);
    assert_eq!(XferReply::written(5).transferred(), 5);
    assert_eq!(XferReply::io_error().transferred(), 0);
    assert_eq!(XferReply::failed(XferStatus::Eof).status, XferStatus::Eof);
}

#[test]
fn test_catalog_policies()
{
    assert_eq!(CATALOG.len(), Op::COUNT);
    assert_eq!(with_fallback(Fallback::SearchStack).count(), 3);
    assert_eq!(with_fallback(Fallback::Forward).count(), 20);
    assert_eq!(with_fallback(Fallback::TerminalDefault).count(), 18);
    assert_eq!(Op::XferPartial.fallback(), Fallback::Forward);
    assert_eq!(Op::InsertBreakpoint.fallback(), Fallback::TerminalDefault);
    assert_eq!(Op::Resume.descriptor().default, BaseDefault::NoProcess);
    assert_eq!(Op::from_name("can_async_p"), Some(Op::CanAsyncP));
    assert_eq!(Op::Async.to_string(), "async");
}
