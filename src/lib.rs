//! Bindery - declarative data binding between models and a host tree
//!
//! - [`Selector`]: dotted paths resolved/assigned against models, sequences
//!   and structural objects, with best-effort [`coerce`]ion
//! - [`View`]: owns the scope of bindings below it, patched incrementally
//!   as the tree changes
//! - [`Template`]: reconciles a sequence against a pool of prefab children

pub mod accessor;
pub mod binder;
pub mod binding;
pub mod coerce;
pub mod config;
pub mod error;
pub mod object;
pub mod prefab;
pub mod scene;
pub mod selector;
pub mod template;
pub mod value;
pub mod view;

pub use accessor::Accessor;
pub use binder::Binder;
pub use binding::{ActiveBinding, Apply, Binding, BindingId, Context, ValueBinding};
pub use coerce::{coerce, Converter, Converters};
pub use config::Config;
pub use error::{BinderyError, ConversionError, FixSuggestion};
pub use object::{Member, ObjectRef, ObjectType, Record, Structural};
pub use prefab::Prefabs;
pub use scene::{Node, NodeId, Scene};
pub use selector::Selector;
pub use template::{KindSource, PoolEntry, Template};
pub use value::{Model, Sequence, Value, ValueType};
pub use view::View;
