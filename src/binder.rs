//! Binder - facade over scene, prefabs, converters and config
//!
//! The external driver owns a `Binder`, builds its tree through
//! [`scene_mut`](Binder::scene_mut) and calls [`apply`](Binder::apply) on a
//! root binding whenever the model changes (every tick, on events, ...).

use tracing::debug;

use crate::binding::{BindingId, Context};
use crate::coerce::Converters;
use crate::config::Config;
use crate::error::{BinderyError, Result};
use crate::prefab::Prefabs;
use crate::scene::Scene;
use crate::selector::Selector;
use crate::value::Value;

#[derive(Debug)]
pub struct Binder {
    scene: Scene,
    prefabs: Prefabs,
    converters: Converters,
    config: Config,
}

impl Default for Binder {
    fn default() -> Self {
        Self::from_parts(Config::default())
    }
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binder using a validated `config`
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: Config) -> Self {
        let converters = if config.coercion.standard_converters {
            Converters::standard()
        } else {
            Converters::empty()
        };
        Self {
            scene: Scene::new(),
            prefabs: Prefabs::new(),
            converters,
            config,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn prefabs(&self) -> &Prefabs {
        &self.prefabs
    }

    pub fn prefabs_mut(&mut self) -> &mut Prefabs {
        &mut self.prefabs
    }

    pub fn converters(&self) -> &Converters {
        &self.converters
    }

    /// Register application converters after the standard ones
    pub fn converters_mut(&mut self) -> &mut Converters {
        &mut self.converters
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse selector text with the configured delimiter
    pub fn selector(&self, text: &str) -> Selector {
        Selector::parse_with(text, self.config.selector.delimiter)
    }

    pub fn resolve(&self, model: &Value, selector: &str) -> Value {
        self.selector(selector).resolve(model)
    }

    /// Assign with this binder's converters
    pub fn assign(&self, model: &mut Value, selector: &str, value: impl Into<Value>) -> bool {
        self.selector(selector)
            .assign_with(model, value.into(), &self.converters)
    }

    /// Apply `model` to a binding (usually a root View) and everything it reaches
    pub fn apply(&mut self, id: BindingId, model: &Value) -> Result<()> {
        if self.scene.binding_node(id).is_none() {
            return Err(BinderyError::BindingNotFound { binding: id.index() });
        }
        debug!(binding = %id, "apply");
        let mut cx = Context::new(&mut self.scene, &self.prefabs, &self.converters, &self.config);
        cx.apply(id, model);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use crate::value::ValueType;
    use crate::view::View;
    use serde_json::json;

    #[test]
    fn selector_uses_configured_delimiter() {
        let config = Config {
            selector: SelectorConfig { delimiter: '/' },
            ..Config::default()
        };
        let binder = Binder::with_config(config).unwrap();
        let model: Value = json!({"a": {"b.c": 1}}).into();
        assert_eq!(binder.resolve(&model, "a/b.c"), Value::Int(1));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = Config {
            selector: SelectorConfig { delimiter: '\t' },
            ..Config::default()
        };
        assert!(Binder::with_config(config).is_err());
    }

    #[test]
    fn converters_follow_config() {
        let mut config = Config::default();
        config.coercion.standard_converters = false;
        let binder = Binder::with_config(config).unwrap();
        assert!(binder.converters().is_empty());
        assert!(!Binder::new().converters().is_empty());
    }

    #[test]
    fn apply_missing_binding_fails() {
        let mut binder = Binder::new();
        let err = binder.apply(BindingId(3), &Value::Null).unwrap_err();
        assert!(matches!(err, BinderyError::BindingNotFound { binding: 3 }));
    }

    #[test]
    fn assign_coerces_into_existing_element_type() {
        let binder = Binder::new();
        let mut model: Value = json!({"scores": [1, 2]}).into();
        assert!(binder.assign(&mut model, "scores.0", "41"));
        assert_eq!(binder.resolve(&model, "scores.0").value_type(), ValueType::Int);
        assert_eq!(binder.resolve(&model, "scores.0"), Value::Int(41));
    }

    #[test]
    fn apply_reaches_root_view_scope() {
        let mut binder = Binder::new();
        let root = binder.scene_mut().create_node("root", None).unwrap();
        let view = binder.scene_mut().add_binding(root, View::narrowed("user")).unwrap();
        binder.apply(view, &json!({"user": {}}).into()).unwrap();
    }
}
