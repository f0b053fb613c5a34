//! # Target Stack
//!
//! An ordered stack of [`Layer`]s. The bottom entry is always the base layer;
//! every other layer was resolved when pushed and forwards what it does not
//! implement to the layer beneath it.
//!
//! ## Dispatch
//!
//! [`Stack::dispatch`] invokes the top layer's handler. Handlers receive a
//! [`LayerRef`], a borrowed view of the layer they belong to, and use it to
//! reach the layer beneath ([`LayerRef::call_beneath`]), to restart dispatch
//! from the top ([`LayerRef::dispatch`]), or to search the stack
//! ([`LayerRef::search`]).
//!
//! ## Order versus routing
//!
//! Stack order (what [`Stack::layers`] yields) changes only through
//! [`Stack::push`], [`Stack::pop`] and [`Stack::remove`]. Routing follows each
//! layer's beneath id, which [`Stack::set_beneath`] can point further down to
//! skip layers without removing them. Searches walk stack order, so a skipped
//! layer can still be found by a search.
//!
//! ## Example
//!
//! ```rust
//! use strata_core::prelude::*;
//!
//! let mut stack = Stack::new();
//! let core = Layer::builder("core")
//!     .implement(Op::FilesInfo, |_, _| Ok(Reply::Unit))
//!     .build();
//! stack.push(core)?;
//!
//! assert_eq!(stack.len(), 2);
//! assert!(stack.files_info().is_ok());
//! assert!(stack.resume(Ptid::MINUS_ONE, false, Signal::NONE).is_err());
//! # Ok::<(), StrataError>(())
//! ```

use std::fmt;

use smallvec::SmallVec;
use tracing::{debug, info, trace, warn};

use crate::base::base_layer;
use crate::call::{Call, Reply};
use crate::catalog::Op;
use crate::config::BaseConfig;
use crate::error::{StrataError, StrataResult, StructuralError};
use crate::layer::{Layer, LayerId, SlotOrigin};
use crate::resolver;

/// Layers whose own implementation of an operation is currently executing.
type Trail = SmallVec<[(LayerId, Op); 4]>;

/// Ordered stack of layers, base at the bottom
pub struct Stack
{
    /// Index 0 is the base layer, the last entry is the top.
    layers: Vec<Layer>,
    next_id: u64,
}

impl Stack
{
    /// Stack holding only the default base layer.
    #[must_use]
    pub fn new() -> Self
    {
        Self::with_config(&BaseConfig::default())
    }

    /// Stack holding only a base layer built from `config`.
    #[must_use]
    pub fn with_config(config: &BaseConfig) -> Self
    {
        let mut base = base_layer(config);
        let id = LayerId::from_raw(0);
        base.seal(id, None);
        debug!("Created stack with base layer `{}` ({})", base.shortname(), config.arch);
        Self {
            layers: vec![base],
            next_id: 1,
        }
    }

    /// Stack without a base layer. [`Stack::install_base`] must be called
    /// before anything can be pushed or dispatched.
    #[must_use]
    pub fn empty() -> Self
    {
        Self {
            layers: Vec::new(),
            next_id: 0,
        }
    }

    /// Install a custom base layer on an empty stack.
    ///
    /// ## Errors
    ///
    /// - `Structural(BaseOccupied)` if the stack already holds layers
    /// - `Structural(BaseIncomplete)` if `layer` leaves an operation unset
    pub fn install_base(&mut self, mut layer: Layer) -> StrataResult<LayerId>
    {
        if !self.layers.is_empty() {
            return Err(StructuralError::BaseOccupied.into());
        }
        let id = LayerId::from_raw(self.next_id);
        resolver::resolve_base(&mut layer, id)?;
        self.next_id += 1;
        self.layers.push(layer);
        Ok(id)
    }

    /// Resolve `layer` against the current top and make it the new top.
    ///
    /// ## Errors
    ///
    /// - `Structural(EmptyStack)` if there is no base layer
    /// - `Structural(AlreadyResolved)` if `layer` was resolved before
    pub fn push(&mut self, mut layer: Layer) -> StrataResult<LayerId>
    {
        let beneath = self.top().and_then(Layer::id);
        let id = LayerId::from_raw(self.next_id);
        resolver::resolve(&mut layer, id, beneath)?;
        self.next_id += 1;
        info!("Pushed layer `{}` ({id}) at depth {}", layer.shortname(), self.layers.len());
        self.layers.push(layer);
        Ok(id)
    }

    /// Remove and return the top layer.
    ///
    /// ## Errors
    ///
    /// - `Structural(PopBase)` if only the base layer remains
    /// - `Structural(EmptyStack)` if the stack is empty
    pub fn pop(&mut self) -> StrataResult<Layer>
    {
        match self.layers.len() {
            0 => Err(StructuralError::EmptyStack.into()),
            1 => {
                warn!("Refusing to pop the base layer");
                Err(StructuralError::PopBase.into())
            }
            _ => {
                let layer = self.layers.pop().ok_or(StructuralError::EmptyStack)?;
                info!("Popped layer `{}`", layer.shortname());
                Ok(layer)
            }
        }
    }

    /// Remove the layer `id` from anywhere above the base.
    ///
    /// Layers that forwarded to it are relinked to whatever it forwarded to.
    ///
    /// ## Errors
    ///
    /// - `Structural(UnknownLayer)` if `id` is not on this stack
    /// - `Structural(PopBase)` if `id` is the base layer
    pub fn remove(&mut self, id: LayerId) -> StrataResult<Layer>
    {
        let position = self.position(id)?;
        if position == 0 {
            return Err(StructuralError::PopBase.into());
        }
        let layer = self.layers.remove(position);
        for above in &mut self.layers {
            if above.beneath() == Some(id) {
                debug!("Relinking `{}` past removed layer {id}", above.shortname());
                above.relink(layer.beneath());
            }
        }
        info!("Removed layer `{}` ({id})", layer.shortname());
        Ok(layer)
    }

    /// Route `id`'s forwarding to `beneath`, which must sit strictly lower.
    ///
    /// Stack order is unchanged.
    ///
    /// ## Errors
    ///
    /// - `Structural(UnknownLayer)` if either id is not on this stack
    /// - `Structural(InvalidBeneath)` if `beneath` is not below `id`
    pub fn set_beneath(&mut self, id: LayerId, beneath: LayerId) -> StrataResult<()>
    {
        let position = self.position(id)?;
        let target = self.position(beneath)?;
        if target >= position {
            return Err(StructuralError::InvalidBeneath { layer: id, beneath }.into());
        }
        let layer = &mut self.layers[position];
        debug!("Routing `{}` ({id}) to {beneath}", layer.shortname());
        layer.relink(Some(beneath));
        Ok(())
    }

    /// Invoke `call` starting at the top layer.
    ///
    /// ## Errors
    ///
    /// `Structural(EmptyStack)` on a stack without layers; otherwise
    /// whatever the answering layer returns.
    pub fn dispatch(&self, call: Call) -> StrataResult<Reply>
    {
        self.top_ref(Trail::new())?.invoke(call)
    }

    fn top_ref(&self, trail: Trail) -> StrataResult<LayerRef<'_>>
    {
        let (layer, id) = self
            .layers
            .last()
            .and_then(|layer| layer.id().map(|id| (layer, id)))
            .ok_or(StructuralError::EmptyStack)?;
        Ok(LayerRef::new(self, layer, id, trail))
    }

    /// View of the layer `id`, for invoking it directly.
    ///
    /// ## Errors
    ///
    /// `Structural(UnknownLayer)` if `id` is not on this stack.
    pub fn at(&self, id: LayerId) -> StrataResult<LayerRef<'_>>
    {
        self.at_with_trail(id, Trail::new())
    }

    fn at_with_trail(&self, id: LayerId, trail: Trail) -> StrataResult<LayerRef<'_>>
    {
        let position = self.position(id)?;
        Ok(LayerRef::new(self, &self.layers[position], id, trail))
    }

    fn position(&self, id: LayerId) -> StrataResult<usize>
    {
        self.layers
            .iter()
            .position(|layer| layer.id() == Some(id))
            .ok_or_else(|| StructuralError::UnknownLayer(id).into())
    }

    /// Topmost layer matching `predicate`.
    pub fn find<P>(&self, mut predicate: P) -> Option<&Layer>
    where
        P: FnMut(&Layer) -> bool,
    {
        self.layers().find(|layer| predicate(layer))
    }

    /// Topmost layer with the given short name.
    #[must_use]
    pub fn find_by_name(&self, shortname: &str) -> Option<&Layer>
    {
        self.find(|layer| layer.shortname() == shortname)
    }

    #[must_use]
    pub fn top(&self) -> Option<&Layer>
    {
        self.layers.last()
    }

    #[must_use]
    pub fn base(&self) -> Option<&Layer>
    {
        self.layers.first()
    }

    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer>
    {
        self.layers.iter().find(|layer| layer.id() == Some(id))
    }

    /// Layers from top to bottom.
    pub fn layers(&self) -> impl Iterator<Item = &Layer>
    {
        self.layers.iter().rev()
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.layers.is_empty()
    }
}

impl Default for Stack
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl fmt::Debug for Stack
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_list().entries(self.layers()).finish()
    }
}

/// Borrowed view of one layer on a stack, handed to every handler
///
/// Besides identifying the layer, a `LayerRef` carries the chain of own
/// implementations entered so far in the current dispatch. Stack searches
/// skip layers already in that chain for the same operation.
#[derive(Clone)]
pub struct LayerRef<'a>
{
    stack: &'a Stack,
    layer: &'a Layer,
    id: LayerId,
    trail: Trail,
}

impl<'a> LayerRef<'a>
{
    fn new(stack: &'a Stack, layer: &'a Layer, id: LayerId, trail: Trail) -> Self
    {
        Self {
            stack,
            layer,
            id,
            trail,
        }
    }

    #[must_use]
    pub fn id(&self) -> LayerId
    {
        self.id
    }

    #[must_use]
    pub fn stack(&self) -> &'a Stack
    {
        self.stack
    }

    #[must_use]
    pub fn layer(&self) -> &'a Layer
    {
        self.layer
    }

    /// Whether this dispatch already entered `id`'s own implementation of `op`.
    #[must_use]
    pub fn has_entered(&self, id: LayerId, op: Op) -> bool
    {
        self.trail.contains(&(id, op))
    }

    /// The layer this one currently forwards to.
    ///
    /// ## Errors
    ///
    /// - `Structural(NoBeneath)` for the base layer
    /// - `Structural(UnknownLayer)` if the beneath id is stale
    pub fn beneath(&self) -> StrataResult<LayerRef<'a>>
    {
        let beneath = self
            .layer
            .beneath()
            .ok_or(StructuralError::NoBeneath { layer: self.id })?;
        self.stack.at_with_trail(beneath, self.trail.clone())
    }

    /// Invoke `call` on the layer beneath this one.
    ///
    /// ## Errors
    ///
    /// Whatever [`LayerRef::beneath`] or the answering layer returns.
    pub fn call_beneath(&self, call: Call) -> StrataResult<Reply>
    {
        self.beneath()?.invoke(call)
    }

    /// Invoke this layer's handler for `call`.
    ///
    /// ## Errors
    ///
    /// Whatever the handler returns.
    pub fn invoke(&self, call: Call) -> StrataResult<Reply>
    {
        let op = call.op();
        let slot = self.layer.slot(op).ok_or_else(|| StructuralError::UnresolvedSlot {
            layer: self.layer.shortname().to_string(),
            op,
        })?;

        let mut next = self.clone();
        if slot.origin == SlotOrigin::Own {
            trace!("`{op}` answered by `{}` ({})", self.layer.shortname(), self.id);
            next.trail.push((self.id, op));
        }
        (slot.handler)(next, call)
    }

    /// Invoke `call` from the top of the stack, keeping this dispatch's chain.
    ///
    /// ## Errors
    ///
    /// Whatever the answering layer returns.
    pub fn dispatch(&self, call: Call) -> StrataResult<Reply>
    {
        self.stack.top_ref(self.trail.clone())?.invoke(call)
    }

    /// Hand `call` to the topmost layer that implements its operation itself
    /// and has not been entered for it in this dispatch.
    ///
    /// ## Errors
    ///
    /// `Unsupported` if no layer qualifies.
    pub fn search(&self, call: Call) -> StrataResult<Reply>
    {
        let op = call.op();
        let candidate = self.stack.find(|layer| {
            layer.provides(op) && layer.id().is_some_and(|id| !self.has_entered(id, op))
        });

        match candidate.and_then(Layer::id) {
            Some(id) => {
                debug!("Search for `{op}` selected `{}` ({id})", self.stack.layer(id).map_or("?", Layer::shortname));
                self.stack.at_with_trail(id, self.trail.clone())?.invoke(call)
            }
            None => {
                warn!("Search for `{op}` found no capable layer");
                Err(StrataError::Unsupported { op })
            }
        }
    }
}

impl fmt::Debug for LayerRef<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("LayerRef")
            .field("layer", &self.layer.shortname())
            .field("id", &self.id)
            .field("trail", &self.trail)
            .finish()
    }
}
