//! # Layers
//!
//! A layer is one backend's operation table plus a reference to the layer
//! beneath it on the stack.
//!
//! Backends fill in the operations they can honor (with [`Layer::set`] or a
//! [`LayerBuilder`]) and leave the rest unset. When the layer is pushed, the
//! resolver fills every unset slot with a forwarding trampoline and seals the
//! table; from then on the table is read-only.
//!
//! The `beneath` reference is a [`LayerId`], not a pointer. The layer does not
//! own what is beneath it; the stack owns the ordering and resolves the id on
//! every forwarded call.

pub mod builder;

use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::call::{Call, Reply};
use crate::catalog::Op;
use crate::error::{StrataResult, StructuralError};
use crate::stack::LayerRef;

pub use builder::LayerBuilder;

/// Callable stored in a layer's table
///
/// A handler receives a [`LayerRef`] for the layer it is installed on (which
/// gives access to the stack and to the layer beneath) and the call itself.
pub type Handler = Arc<dyn Fn(LayerRef<'_>, Call) -> StrataResult<Reply> + Send + Sync>;

/// Identity assigned to a layer when it is placed on a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId
{
    #[must_use]
    pub const fn from_raw(value: u64) -> Self
    {
        Self(value)
    }

    #[must_use]
    pub const fn raw(self) -> u64
    {
        self.0
    }
}

impl fmt::Display for LayerId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "#{}", self.0)
    }
}

/// Descriptive identity of the backend a layer stands for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerInfo
{
    /// Short name used in logs and errors, e.g. `"core"`.
    pub shortname: String,
    /// One-line description, e.g. `"Local core dump file"`.
    pub longname: String,
    /// Longer help text.
    pub doc: String,
}

impl LayerInfo
{
    pub fn new(shortname: impl Into<String>) -> Self
    {
        let shortname = shortname.into();
        Self {
            longname: shortname.clone(),
            shortname,
            doc: String::new(),
        }
    }
}

/// Where a slot's handler came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotOrigin
{
    /// The backend's own implementation.
    Own,
    /// Forwarding trampoline installed by the resolver.
    Forwarded,
    /// Terminal default of the base layer.
    BaseDefault,
}

#[derive(Clone)]
pub(crate) struct Slot
{
    pub(crate) handler: Handler,
    pub(crate) origin: SlotOrigin,
}

/// One backend's operation table
pub struct Layer
{
    info: LayerInfo,
    id: Option<LayerId>,
    beneath: Option<LayerId>,
    slots: [Option<Slot>; Op::COUNT],
    resolved: bool,
}

impl Layer
{
    /// Create an empty, unresolved layer.
    #[must_use]
    pub fn new(info: LayerInfo) -> Self
    {
        Self {
            info,
            id: None,
            beneath: None,
            slots: std::array::from_fn(|_| None),
            resolved: false,
        }
    }

    /// Start building a layer with the given short name.
    pub fn builder(shortname: impl Into<String>) -> LayerBuilder
    {
        LayerBuilder::new(shortname)
    }

    #[must_use]
    pub fn info(&self) -> &LayerInfo
    {
        &self.info
    }

    #[must_use]
    pub fn shortname(&self) -> &str
    {
        &self.info.shortname
    }

    /// Id on the stack, `None` until pushed.
    #[must_use]
    pub fn id(&self) -> Option<LayerId>
    {
        self.id
    }

    /// Layer this one forwards to, `None` for the base layer and for unpushed layers.
    #[must_use]
    pub fn beneath(&self) -> Option<LayerId>
    {
        self.beneath
    }

    /// Whether the resolver has run and the table is sealed.
    #[must_use]
    pub fn is_resolved(&self) -> bool
    {
        self.resolved
    }

    /// Whether `op` has a callable slot (own, forwarded or default).
    #[must_use]
    pub fn implements(&self, op: Op) -> bool
    {
        self.slots[op.index()].is_some()
    }

    /// Whether `op` is the layer's own implementation.
    #[must_use]
    pub fn provides(&self, op: Op) -> bool
    {
        self.origin(op) == Some(SlotOrigin::Own)
    }

    #[must_use]
    pub fn origin(&self, op: Op) -> Option<SlotOrigin>
    {
        self.slots[op.index()].as_ref().map(|slot| slot.origin)
    }

    /// Operations this layer implements itself, in catalog order.
    pub fn provided(&self) -> impl Iterator<Item = Op> + '_
    {
        Op::ALL.into_iter().filter(|op| self.provides(*op))
    }

    /// Handler for `op`.
    ///
    /// ## Errors
    ///
    /// `Structural(UnresolvedSlot)` if the slot is empty, which after
    /// resolution cannot happen.
    pub fn get(&self, op: Op) -> StrataResult<&Handler>
    {
        match &self.slots[op.index()] {
            Some(slot) => Ok(&slot.handler),
            None => Err(StructuralError::UnresolvedSlot {
                layer: self.info.shortname.clone(),
                op,
            }
            .into()),
        }
    }

    /// Install the backend's own implementation of `op`.
    ///
    /// Setting the same operation twice replaces the earlier handler.
    ///
    /// ## Errors
    ///
    /// `Structural(Sealed)` once the layer has been resolved.
    pub fn set<F>(&mut self, op: Op, handler: F) -> StrataResult<()>
    where
        F: Fn(LayerRef<'_>, Call) -> StrataResult<Reply> + Send + Sync + 'static,
    {
        self.set_handler(op, Arc::new(handler))
    }

    /// Like [`Layer::set`], for an already shared handler.
    ///
    /// ## Errors
    ///
    /// `Structural(Sealed)` once the layer has been resolved.
    pub fn set_handler(&mut self, op: Op, handler: Handler) -> StrataResult<()>
    {
        if self.resolved {
            error!(layer = %self.info.shortname, op = %op, "attempt to modify a sealed layer");
            return Err(StructuralError::Sealed {
                layer: self.info.shortname.clone(),
                op,
            }
            .into());
        }
        self.put(op, handler);
        Ok(())
    }

    /// Install an own handler, replacing whatever the slot held.
    pub(crate) fn put(&mut self, op: Op, handler: Handler)
    {
        self.slots[op.index()] = Some(Slot {
            handler,
            origin: SlotOrigin::Own,
        });
    }

    /// Fill an empty slot. Never overwrites.
    pub(crate) fn fill(&mut self, op: Op, handler: Handler, origin: SlotOrigin) -> bool
    {
        let slot = &mut self.slots[op.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(Slot { handler, origin });
        true
    }

    pub(crate) fn slot(&self, op: Op) -> Option<&Slot>
    {
        self.slots[op.index()].as_ref()
    }

    /// First catalog operation with an empty slot.
    pub(crate) fn first_unset(&self) -> Option<Op>
    {
        Op::ALL.into_iter().find(|op| !self.implements(*op))
    }

    pub(crate) fn seal(&mut self, id: LayerId, beneath: Option<LayerId>)
    {
        self.id = Some(id);
        self.beneath = beneath;
        self.resolved = true;
    }

    pub(crate) fn relink(&mut self, beneath: Option<LayerId>)
    {
        self.beneath = beneath;
    }
}

impl fmt::Debug for Layer
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Layer")
            .field("shortname", &self.info.shortname)
            .field("id", &self.id)
            .field("beneath", &self.beneath)
            .field("resolved", &self.resolved)
            .field("provides", &self.provided().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn unit(_: LayerRef<'_>, _: Call) -> StrataResult<Reply>
    {
        Ok(Reply::Unit)
    }

    #[test]
    fn new_layer_has_no_slots()
    {
        let layer = Layer::new(LayerInfo::new("empty"));
        assert!(!layer.is_resolved());
        assert_eq!(layer.id(), None);
        assert_eq!(layer.first_unset(), Some(Op::Attach));
        for op in Op::ALL {
            assert!(!layer.implements(op));
            assert!(layer.get(op).is_err());
        }
    }

    #[test]
    fn set_marks_own_implementation()
    {
        let mut layer = Layer::new(LayerInfo::new("exec"));
        layer.set(Op::FilesInfo, unit).unwrap();

        assert!(layer.implements(Op::FilesInfo));
        assert!(layer.provides(Op::FilesInfo));
        assert_eq!(layer.origin(Op::FilesInfo), Some(SlotOrigin::Own));
        assert_eq!(layer.provided().collect::<Vec<_>>(), vec![Op::FilesInfo]);
    }

    #[test]
    fn fill_never_overwrites()
    {
        let mut layer = Layer::new(LayerInfo::new("exec"));
        layer.set(Op::Detach, unit).unwrap();

        assert!(!layer.fill(Op::Detach, Arc::new(unit), SlotOrigin::Forwarded));
        assert_eq!(layer.origin(Op::Detach), Some(SlotOrigin::Own));
        assert!(layer.fill(Op::Attach, Arc::new(unit), SlotOrigin::Forwarded));
        assert!(!layer.provides(Op::Attach));
    }

    #[test]
    fn sealed_layer_rejects_set()
    {
        let mut layer = Layer::new(LayerInfo::new("core"));
        layer.seal(LayerId::from_raw(3), Some(LayerId::from_raw(1)));

        let err = layer.set(Op::Resume, unit).unwrap_err();
        assert!(err.is_structural());
        assert!(!layer.implements(Op::Resume));
    }

    #[test]
    fn layer_info_defaults_longname_to_shortname()
    {
        let info = LayerInfo::new("remote");
        assert_eq!(info.longname, "remote");
        assert!(info.doc.is_empty());
    }
}
