//! # Layer Builder
//!
//! Fluent construction of a layer's identity and operation table.

use std::sync::Arc;

use crate::call::{Call, Reply};
use crate::catalog::Op;
use crate::error::StrataResult;
use crate::layer::{Handler, Layer, LayerInfo};
use crate::stack::LayerRef;

/// Builder for an unresolved [`Layer`]
///
/// ## Example
///
/// ```rust
/// use strata_core::call::Reply;
/// use strata_core::catalog::Op;
/// use strata_core::layer::Layer;
///
/// let layer = Layer::builder("native")
///     .longname("Native process")
///     .implement(Op::CanAsyncP, |_, _| Ok(Reply::Bool(true)))
///     .build();
///
/// assert!(layer.provides(Op::CanAsyncP));
/// assert!(!layer.implements(Op::Resume));
/// ```
pub struct LayerBuilder
{
    info: LayerInfo,
    handlers: Vec<(Op, Handler)>,
}

impl LayerBuilder
{
    pub fn new(shortname: impl Into<String>) -> Self
    {
        Self {
            info: LayerInfo::new(shortname),
            handlers: Vec::new(),
        }
    }

    #[must_use]
    pub fn longname(mut self, longname: impl Into<String>) -> Self
    {
        self.info.longname = longname.into();
        self
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self
    {
        self.info.doc = doc.into();
        self
    }

    /// Implement `op`. A later call for the same operation wins.
    #[must_use]
    pub fn implement<F>(self, op: Op, handler: F) -> Self
    where
        F: Fn(LayerRef<'_>, Call) -> StrataResult<Reply> + Send + Sync + 'static,
    {
        self.implement_shared(op, Arc::new(handler))
    }

    /// Implement `op` with a handler shared with other layers or operations.
    #[must_use]
    pub fn implement_shared(mut self, op: Op, handler: Handler) -> Self
    {
        self.handlers.push((op, handler));
        self
    }

    /// Operations declared so far, in declaration order.
    pub fn declared(&self) -> impl Iterator<Item = Op> + '_
    {
        self.handlers.iter().map(|(op, _)| *op)
    }

    #[must_use]
    pub fn build(self) -> Layer
    {
        let mut layer = Layer::new(self.info);
        for (op, handler) in self.handlers {
            layer.put(op, handler);
        }
        layer
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::layer::SlotOrigin;
    use crate::ops::TargetOps;
    use crate::stack::Stack;

    #[test]
    fn builder_records_identity()
    {
        let layer = LayerBuilder::new("core")
            .longname("Local core dump file")
            .doc("Use a core file as a target.")
            .build();

        assert_eq!(layer.shortname(), "core");
        assert_eq!(layer.info().longname, "Local core dump file");
        assert_eq!(layer.info().doc, "Use a core file as a target.");
        assert_eq!(layer.provided().count(), 0);
    }

    #[test]
    fn later_implementation_wins()
    {
        let builder = LayerBuilder::new("remote")
            .implement(Op::Rcmd, |_, _| Ok(Reply::Text("first".into())))
            .implement(Op::Rcmd, |_, _| Ok(Reply::Text("second".into())));
        assert_eq!(builder.declared().collect::<Vec<_>>(), vec![Op::Rcmd, Op::Rcmd]);

        let layer = builder.build();
        assert!(layer.provides(Op::Rcmd));
        assert_eq!(layer.provided().count(), 1);
    }

    #[test]
    fn built_handlers_are_own_and_dispatchable()
    {
        let layer = LayerBuilder::new("remote")
            .implement(Op::Rcmd, |_, _| Ok(Reply::Text("first".into())))
            .implement(Op::Rcmd, |_, _| Ok(Reply::Text("second".into())))
            .build();
        assert_eq!(layer.origin(Op::Rcmd), Some(SlotOrigin::Own));

        let mut stack = Stack::new();
        stack.push(layer).unwrap();
        assert_eq!(stack.rcmd("monitor"), Ok("second".to_string()));
    }
}
