//! Value-assignment bindings

use tracing::debug;

use crate::coerce::Converters;
use crate::object::ObjectRef;
use crate::selector::Selector;
use crate::value::Value;

use super::{BindingId, Context};

/// Writes `source` (resolved against the model) onto `member` of `target`
///
/// The written value is coerced to the member's declared type.
#[derive(Debug, Clone)]
pub struct ValueBinding {
    source: Selector,
    target: ObjectRef,
    member: Selector,
}

impl ValueBinding {
    pub fn new(source: impl Into<Selector>, target: ObjectRef, member: impl Into<Selector>) -> Self {
        Self {
            source: source.into(),
            target,
            member: member.into(),
        }
    }

    pub fn source(&self) -> &Selector {
        &self.source
    }

    pub fn target(&self) -> &ObjectRef {
        &self.target
    }

    pub(crate) fn apply(&self, model: &Value, converters: &Converters) {
        let value = self.source.resolve(model);
        let mut target = Value::Object(self.target.clone());
        if !self.member.assign_with(&mut target, value, converters) {
            debug!(source = %self.source, member = %self.member, "value binding missed its target member");
        }
    }
}

/// Toggles its host node's active flag from the truthiness of `source`
#[derive(Debug, Clone)]
pub struct ActiveBinding {
    source: Selector,
    invert: bool,
}

impl ActiveBinding {
    pub fn new(source: impl Into<Selector>) -> Self {
        Self {
            source: source.into(),
            invert: false,
        }
    }

    /// Active when the source is falsy
    pub fn inverted(source: impl Into<Selector>) -> Self {
        Self {
            invert: true,
            ..Self::new(source)
        }
    }

    pub(crate) fn apply(&self, cx: &mut Context<'_>, id: BindingId, model: &Value) {
        let active = self.source.resolve(model).is_truthy() != self.invert;
        if let Some(node) = cx.scene.binding_node(id) {
            if let Err(e) = cx.scene.set_active(node, active) {
                debug!(binding = %id, error = %e, "active binding lost its node");
            }
        }
    }
}
