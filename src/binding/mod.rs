//! Binding Module - the `apply(model)` contract and its variants
//!
//! Bindings are owned by their host node in the [`Scene`] and referenced by
//! id from the View whose scope holds them:
//! - `value`: value-assignment bindings (member writes, active toggles)
//! - [`View`]: scope owner, re-applies its scope
//! - [`Template`]: View that reconciles a sequence against a child pool
//! - [`Apply`]: application-defined bindings
//!
//! Data flow:
//! ```text
//! Binder::apply(root, model)
//!          ↓
//!   View narrows model (optional selector)
//!          ↓
//!   each scope entry ──→ plain binding: apply(narrowed)
//!                   └──→ nested View: recurse into its scope
//!                   └──→ Template: reconcile pool, apply each child
//! ```

mod value;

use std::fmt;

use tracing::trace;

use crate::coerce::Converters;
use crate::config::Config;
use crate::prefab::Prefabs;
use crate::scene::Scene;
use crate::template::Template;
use crate::value::Value;
use crate::view::View;

pub use value::{ActiveBinding, ValueBinding};

/// Handle to a binding stored in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub(crate) usize);

impl BindingId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Application-defined binding
pub trait Apply {
    fn apply(&mut self, model: &Value);
}

impl<F: FnMut(&Value)> Apply for F {
    fn apply(&mut self, model: &Value) {
        self(model)
    }
}

/// A node-attached, model-consuming unit
pub enum Binding {
    Value(ValueBinding),
    Active(ActiveBinding),
    View(View),
    Template(Template),
    Custom(Box<dyn Apply>),
}

impl Binding {
    pub fn custom(apply: impl Apply + 'static) -> Self {
        Binding::Custom(Box::new(apply))
    }

    /// The embedded View capability (plain views and templates)
    pub fn as_view(&self) -> Option<&View> {
        match self {
            Binding::View(view) => Some(view),
            Binding::Template(template) => Some(template.view()),
            _ => None,
        }
    }

    pub fn as_view_mut(&mut self) -> Option<&mut View> {
        match self {
            Binding::View(view) => Some(view),
            Binding::Template(template) => Some(template.view_mut()),
            _ => None,
        }
    }

    pub fn as_template(&self) -> Option<&Template> {
        match self {
            Binding::Template(template) => Some(template),
            _ => None,
        }
    }

    pub fn is_view(&self) -> bool {
        self.as_view().is_some()
    }

    /// Short variant name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Binding::Value(_) => "value",
            Binding::Active(_) => "active",
            Binding::View(_) => "view",
            Binding::Template(_) => "template",
            Binding::Custom(_) => "custom",
        }
    }

    fn apply(&mut self, cx: &mut Context<'_>, id: BindingId, model: &Value) {
        trace!(binding = %id, kind = self.kind(), "apply");
        match self {
            Binding::Value(binding) => binding.apply(model, cx.converters),
            Binding::Active(binding) => binding.apply(cx, id, model),
            Binding::View(view) => view.apply(cx, model),
            Binding::Template(template) => template.apply(cx, id, model),
            Binding::Custom(binding) => binding.apply(model),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value(b) => f.debug_tuple("Value").field(b).finish(),
            Binding::Active(b) => f.debug_tuple("Active").field(b).finish(),
            Binding::View(v) => f.debug_tuple("View").field(v).finish(),
            Binding::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Binding::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<View> for Binding {
    fn from(view: View) -> Self {
        Binding::View(view)
    }
}

impl From<Template> for Binding {
    fn from(template: Template) -> Self {
        Binding::Template(template)
    }
}

impl From<ValueBinding> for Binding {
    fn from(binding: ValueBinding) -> Self {
        Binding::Value(binding)
    }
}

impl From<ActiveBinding> for Binding {
    fn from(binding: ActiveBinding) -> Self {
        Binding::Active(binding)
    }
}

/// Everything an `apply` pass needs besides the model
pub struct Context<'a> {
    pub(crate) scene: &'a mut Scene,
    pub(crate) prefabs: &'a Prefabs,
    pub(crate) converters: &'a Converters,
    pub(crate) config: &'a Config,
}

impl<'a> Context<'a> {
    pub fn new(
        scene: &'a mut Scene,
        prefabs: &'a Prefabs,
        converters: &'a Converters,
        config: &'a Config,
    ) -> Self {
        Self {
            scene,
            prefabs,
            converters,
            config,
        }
    }

    /// Apply one binding. The binding is lent out of the scene for the
    /// duration of the call; a missing or already-applying binding is skipped.
    pub fn apply(&mut self, id: BindingId, model: &Value) {
        let Some(mut binding) = self.scene.take_binding(id) else {
            return;
        };
        binding.apply(self, id, model);
        self.scene.restore_binding(id, binding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn closures_are_custom_bindings() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut binding = Binding::custom(move |m: &Value| sink.borrow_mut().push(m.clone()));

        let mut scene = Scene::new();
        let prefabs = Prefabs::new();
        let config = Config::default();
        let mut cx = Context::new(&mut scene, &prefabs, Converters::global(), &config);
        binding.apply(&mut cx, BindingId(0), &Value::Int(1));

        assert_eq!(*seen.borrow(), vec![Value::Int(1)]);
    }

    #[test]
    fn view_capability_is_shared_by_views_and_templates() {
        assert!(Binding::from(View::new()).is_view());
        assert!(Binding::from(Template::new("items", "kind")).is_view());
        assert!(!Binding::custom(|_: &Value| {}).is_view());
    }

    #[test]
    fn display_id() {
        assert_eq!(BindingId(7).to_string(), "#7");
    }
}
