//! Tests for error handling

use strata_core::catalog::{Op, ReturnShape};
use strata_core::error::{StrataError, StrataResult, StructuralError};
use strata_core::layer::LayerId;
use strata_core::types::{Address, XferStatus};

#[test]
fn test_unsupported_display()
{
    let error = StrataError::Unsupported { op: Op::Rcmd };
    let message = format!("{}", error);
    assert!(message.contains("rcmd"));
    assert!(message.contains("not supported"));
    assert!(error.is_unsupported());
    assert!(!error.is_structural());
}

#[test]
fn test_no_process_display()
{
    let error = StrataError::NoProcess { op: Op::Resume };
    let message = format!("{}", error);
    assert!(message.contains("without a process"));
    assert!(message.contains("resume"));
}

#[test]
fn test_structural_error_converts()
{
    let error: StrataError = StructuralError::PopBase.into();
    assert!(error.is_structural());
    match error {
        StrataError::Structural(StructuralError::PopBase) => {
            // Expected: structural errors keep their variant
        }
        other => panic!("Expected Structural(PopBase), got {other:?}"),
    }
}

#[test]
fn test_structural_error_display()
{
    let error: StrataError = StructuralError::InvalidBeneath {
        layer: LayerId::from_raw(2),
        beneath: LayerId::from_raw(3),
    }
    .into();
    let message = format!("{}", error);
    assert!(message.contains("invariant"));
    assert!(message.contains("#3"));
    assert!(message.contains("#2"));

    let message = format!("{}", StructuralError::BaseIncomplete { missing: Op::Wait });
    assert!(message.contains("`wait`"));
}

#[test]
fn test_reply_mismatch_is_structural()
{
    let error = StrataError::ReplyMismatch {
        op: Op::Wait,
        expected: ReturnShape::Waited,
        got: ReturnShape::Unit,
    };
    assert!(error.is_structural());
    let message = format!("{}", error);
    assert!(message.contains("wait"));
    assert!(message.contains("unit"));
}

#[test]
fn test_memory_error_display()
{
    let error = StrataError::Memory {
        address: Address::new(0x1000),
        status: XferStatus::Unavailable,
    };
    let message = format!("{}", error);
    assert!(message.contains("0x0000000000001000"));
    assert!(message.contains("unavailable"));
}

#[test]
fn test_backend_error_display()
{
    let error = StrataError::backend("remote", "connection closed");
    assert_eq!(format!("{}", error), "remote: connection closed");
}

#[test]
fn test_invalid_argument_display()
{
    let error = StrataError::InvalidArgument("test arg".to_string());
    let message = format!("{}", error);
    assert!(message.contains("Invalid argument"));
    assert!(message.contains("test arg"));
}

#[test]
fn test_result_type()
{
    // Test that Result type is properly aliased
    let _result: StrataResult<()> = Ok(());
    let _error_result: StrataResult<()> = Err(StrataError::Unsupported { op: Op::Load });
}
