//! # Resolver
//!
//! Makes a layer's table total before it goes on the stack.
//!
//! Every slot a backend left unset receives a forwarding trampoline. The
//! trampoline holds no reference to the layer beneath: it looks the current
//! beneath id up on the stack each time it runs, so splicing a layer out or
//! redirecting a beneath reference takes effect on the very next call.
//!
//! There is one trampoline per operation, built once and shared by every
//! layer.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, error, trace};

use crate::call::{Call, Reply};
use crate::catalog::Op;
use crate::error::{StrataResult, StructuralError};
use crate::layer::{Handler, Layer, LayerId, SlotOrigin};
use crate::stack::LayerRef;

static FORWARDERS: Lazy<[Handler; Op::COUNT]> = Lazy::new(|| std::array::from_fn(|index| build_forwarder(Op::ALL[index])));

fn build_forwarder(op: Op) -> Handler
{
    Arc::new(move |this: LayerRef<'_>, call: Call| -> StrataResult<Reply> {
        let got = call.op();
        if got != op {
            return Err(StructuralError::CallMismatch { expected: op, got }.into());
        }
        trace!("{} forwards `{}`", this.layer().shortname(), op);
        this.call_beneath(call)
    })
}

/// Shared forwarding trampoline for `op`.
#[must_use]
pub fn forwarder(op: Op) -> Handler
{
    Arc::clone(&FORWARDERS[op.index()])
}

/// Fill every unset slot of `layer` with a forwarder and seal it.
///
/// `beneath` is the layer the new one will sit on. Slots the backend set
/// itself are never touched.
///
/// ## Errors
///
/// - `Structural(EmptyStack)` when there is nothing beneath to forward to
/// - `Structural(AlreadyResolved)` when the layer was resolved before
pub fn resolve(layer: &mut Layer, id: LayerId, beneath: Option<LayerId>) -> StrataResult<()>
{
    if layer.is_resolved() {
        error!("Layer `{}` is already resolved", layer.shortname());
        return Err(StructuralError::AlreadyResolved {
            layer: layer.shortname().to_string(),
        }
        .into());
    }

    let Some(beneath) = beneath else {
        error!("Cannot resolve `{}`: no layer beneath it", layer.shortname());
        return Err(StructuralError::EmptyStack.into());
    };

    let mut forwarded = 0usize;
    for op in Op::ALL {
        if layer.fill(op, forwarder(op), SlotOrigin::Forwarded) {
            forwarded += 1;
        }
    }

    if let Some(op) = layer.first_unset() {
        return Err(StructuralError::UnresolvedSlot {
            layer: layer.shortname().to_string(),
            op,
        }
        .into());
    }

    layer.seal(id, Some(beneath));
    debug!(
        "Resolved layer `{}` as {id}: {} own, {forwarded} forwarded, beneath {beneath}",
        layer.shortname(),
        Op::COUNT - forwarded,
    );
    Ok(())
}

/// Seal a base layer, which must already implement every operation.
///
/// ## Errors
///
/// - `Structural(BaseIncomplete)` naming the first operation without a handler
/// - `Structural(AlreadyResolved)` when the layer was resolved before
pub fn resolve_base(layer: &mut Layer, id: LayerId) -> StrataResult<()>
{
    if layer.is_resolved() {
        return Err(StructuralError::AlreadyResolved {
            layer: layer.shortname().to_string(),
        }
        .into());
    }
    if let Some(missing) = layer.first_unset() {
        error!("Base layer `{}` has no handler for `{missing}`", layer.shortname());
        return Err(StructuralError::BaseIncomplete { missing }.into());
    }
    layer.seal(id, None);
    debug!("Installed base layer `{}` as {id}", layer.shortname());
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::error::StrataError;
    use crate::layer::LayerInfo;

    #[test]
    fn forwarders_are_shared_per_operation()
    {
        let first = forwarder(Op::Resume);
        let second = forwarder(Op::Resume);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &forwarder(Op::Wait)));
    }

    #[test]
    fn resolve_fills_only_unset_slots()
    {
        let mut layer = Layer::builder("exec").implement(Op::FilesInfo, |_, _| Ok(Reply::Unit)).build();
        resolve(&mut layer, LayerId::from_raw(1), Some(LayerId::from_raw(0))).unwrap();

        assert!(layer.is_resolved());
        assert_eq!(layer.id(), Some(LayerId::from_raw(1)));
        assert_eq!(layer.beneath(), Some(LayerId::from_raw(0)));
        assert_eq!(layer.origin(Op::FilesInfo), Some(SlotOrigin::Own));
        for op in Op::ALL.into_iter().filter(|op| *op != Op::FilesInfo) {
            assert_eq!(layer.origin(op), Some(SlotOrigin::Forwarded), "{op}");
        }
    }

    #[test]
    fn resolve_without_beneath_is_rejected()
    {
        let mut layer = Layer::new(LayerInfo::new("orphan"));
        let err = resolve(&mut layer, LayerId::from_raw(0), None).unwrap_err();
        assert_eq!(err, StrataError::Structural(StructuralError::EmptyStack));
        assert!(!layer.is_resolved());
    }

    #[test]
    fn resolve_twice_is_rejected()
    {
        let mut layer = Layer::new(LayerInfo::new("twice"));
        resolve(&mut layer, LayerId::from_raw(1), Some(LayerId::from_raw(0))).unwrap();
        let err = resolve(&mut layer, LayerId::from_raw(2), Some(LayerId::from_raw(1))).unwrap_err();
        assert!(matches!(
            err,
            StrataError::Structural(StructuralError::AlreadyResolved { .. })
        ));
    }

    #[test]
    fn incomplete_base_names_first_missing_operation()
    {
        let mut layer = Layer::builder("partial").implement(Op::Attach, |_, _| Ok(Reply::Unit)).build();
        let err = resolve_base(&mut layer, LayerId::from_raw(0)).unwrap_err();
        assert_eq!(
            err,
            StrataError::Structural(StructuralError::BaseIncomplete {
                missing: Op::PostAttach
            })
        );
    }
}
