//! Opaque structural objects
//!
//! Anything that is neither a Model nor a Sequence is reached through named
//! members. Application types implement [`Structural`] and describe their
//! members in an [`ObjectType`]; [`Record`] is a schema-driven implementation
//! usable without writing a type.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::value::{Value, ValueType};

/// Structural member access on an application object
pub trait Structural: fmt::Debug {
    /// Type descriptor listing this object's members
    fn object_type(&self) -> Arc<ObjectType>;

    /// Read a member; `None` when absent or unreadable
    fn get(&self, name: &str) -> Option<Value>;

    /// Write a member (already coerced to its declared type); `false` when rejected
    fn set(&mut self, name: &str, value: Value) -> bool;
}

/// A declared member of an [`ObjectType`]
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: ValueType,
    pub readable: bool,
    pub writable: bool,
}

impl Member {
    /// Read/write member
    pub fn field(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            readable: true,
            writable: true,
        }
    }

    pub fn read_only(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            writable: false,
            ..Self::field(name, ty)
        }
    }

    pub fn write_only(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            readable: false,
            ..Self::field(name, ty)
        }
    }
}

/// Parameterless constructor for a structural type
pub type Constructor = fn(&Arc<ObjectType>) -> ObjectRef;

/// Type descriptor for structural objects
pub struct ObjectType {
    name: String,
    members: Vec<Member>,
    construct: Option<Constructor>,
}

impl ObjectType {
    /// Describe a type with no parameterless constructor
    pub fn new(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            members,
            construct: None,
        }
    }

    /// Attach a parameterless constructor
    pub fn with_constructor(mut self, construct: Constructor) -> Self {
        self.construct = Some(construct);
        self
    }

    /// Describe a [`Record`]-backed type (always constructible)
    pub fn record(name: impl Into<String>, members: Vec<Member>) -> Arc<Self> {
        Arc::new(Self::new(name, members).with_constructor(Record::construct))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn is_constructible(&self) -> bool {
        self.construct.is_some()
    }

    /// Build a fresh instance with default members
    pub fn construct(self: &Arc<Self>) -> Option<ObjectRef> {
        self.construct.map(|construct| construct(self))
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("constructible", &self.construct.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────
// ObjectRef
// ─────────────────────────────────────────────────────────────

/// Shared handle to a structural object
///
/// Cloning shares the object: writes through one handle are visible through
/// every other. Equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<dyn Structural>>);

impl ObjectRef {
    pub fn new<T: Structural + 'static>(object: T) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    pub fn object_type(&self) -> Arc<ObjectType> {
        self.0.borrow().object_type()
    }

    /// Read a readable member
    pub fn get(&self, name: &str) -> Option<Value> {
        let ty = self.object_type();
        let member = ty.member(name)?;
        if !member.readable {
            return None;
        }
        self.0.borrow().get(name)
    }

    /// Raw write, bypassing the writable flag and coercion
    pub(crate) fn set_raw(&self, name: &str, value: Value) -> bool {
        self.0.borrow_mut().set(name, value)
    }

    /// Readable members as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_with(&mut Vec::new())
    }

    /// An object already on the `open` path encodes as `null`
    pub(crate) fn to_json_with(&self, open: &mut Vec<*const ()>) -> serde_json::Value {
        let ptr = Rc::as_ptr(&self.0) as *const ();
        if open.contains(&ptr) {
            return serde_json::Value::Null;
        }
        let ty = self.object_type();
        let values: Vec<(String, Value)> = {
            let object = self.0.borrow();
            ty.members()
                .iter()
                .filter(|m| m.readable)
                .map(|m| (m.name.clone(), object.get(&m.name).unwrap_or_default()))
                .collect()
        };
        open.push(ptr);
        let json = values
            .into_iter()
            .map(|(name, value)| (name, value.to_json_with(open)))
            .collect();
        open.pop();
        serde_json::Value::Object(json)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            // Members are left out so cyclic graphs still print
            Ok(object) => write!(f, "ObjectRef({})", object.object_type().name()),
            Err(_) => f.write_str("ObjectRef(<borrowed>)"),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// Record
// ─────────────────────────────────────────────────────────────

/// Schema-driven structural object; members start at their zero value
#[derive(Debug, Clone)]
pub struct Record {
    ty: Arc<ObjectType>,
    values: FxHashMap<String, Value>,
}

impl Record {
    pub fn new(ty: Arc<ObjectType>) -> Self {
        let values = ty
            .members()
            .iter()
            .map(|m| (m.name.clone(), m.ty.zero_value()))
            .collect();
        Self { ty, values }
    }

    /// [`Constructor`] for record-backed types
    pub fn construct(ty: &Arc<ObjectType>) -> ObjectRef {
        ObjectRef::new(Record::new(Arc::clone(ty)))
    }
}

impl Structural for Record {
    fn object_type(&self) -> Arc<ObjectType> {
        Arc::clone(&self.ty)
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: Value) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_type() -> Arc<ObjectType> {
        ObjectType::record(
            "Label",
            vec![
                Member::field("text", ValueType::String),
                Member::field("size", ValueType::Int),
                Member::read_only("id", ValueType::Int),
                Member::write_only("secret", ValueType::String),
            ],
        )
    }

    #[test]
    fn self_reference_encodes_and_prints() {
        let ty = ObjectType::record(
            "Node",
            vec![
                Member::field("name", ValueType::String),
                Member::field("next", ValueType::Any),
            ],
        );
        let node = ty.construct().unwrap();
        node.set_raw("name", Value::from("a"));
        assert!(node.set_raw("next", Value::Object(node.clone())));

        assert_eq!(
            node.to_json(),
            serde_json::json!({"name": "a", "next": null})
        );
        assert_eq!(format!("{node:?}"), "ObjectRef(Node)");
        assert_eq!(
            Value::Object(node.clone()).to_json()["name"],
            serde_json::json!("a")
        );
    }

    #[test]
    fn record_starts_at_zero_values() {
        let label = label_type().construct().unwrap();
        assert_eq!(label.get("size"), Some(Value::Int(0)));
        assert_eq!(label.get("text"), Some(Value::Null));
    }

    #[test]
    fn unreadable_and_unknown_members_are_absent() {
        let label = label_type().construct().unwrap();
        assert_eq!(label.get("secret"), None);
        assert_eq!(label.get("missing"), None);
    }

    #[test]
    fn clones_share_state() {
        let a = label_type().construct().unwrap();
        let b = a.clone();
        assert!(a.set_raw("text", Value::from("hi")));
        assert_eq!(b.get("text"), Some(Value::from("hi")));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_instances_are_not_equal() {
        let ty = label_type();
        assert_ne!(ty.construct().unwrap(), ty.construct().unwrap());
    }

    #[test]
    fn to_json_skips_unreadable() {
        let label = label_type().construct().unwrap();
        label.set_raw("text", Value::from("hi"));
        let json = label.to_json();
        assert_eq!(json["text"], "hi");
        assert!(json.get("secret").is_none());
    }

    #[test]
    fn plain_type_is_not_constructible() {
        let ty = Arc::new(ObjectType::new("Opaque", vec![]));
        assert!(!ty.is_constructible());
        assert!(ty.construct().is_none());
    }
}
