//! Named-member access over the three container shapes
//!
//! Selectors never match on container variants directly: every step goes
//! through [`Accessor`], implemented for [`Model`], [`Sequence`] and
//! [`ObjectRef`].

use std::borrow::Cow;

use crate::coerce::{coerce, Converters};
use crate::object::ObjectRef;
use crate::value::{Model, Sequence, Value};

/// Read/write a single path segment on a container
pub trait Accessor {
    /// Read `segment`; `None` means not found (reads as `Null`)
    fn get(&self, segment: &str) -> Option<Cow<'_, Value>>;

    /// In-place slot for `segment`, when the container stores values by value
    fn slot_mut(&mut self, _segment: &str) -> Option<&mut Value> {
        None
    }

    /// Write `segment`; `false` when there is no writable slot
    fn set(&mut self, segment: &str, value: Value, converters: &Converters) -> bool;
}

/// Parse a sequence index segment
fn parse_index(segment: &str) -> Option<usize> {
    segment.parse::<usize>().ok()
}

impl Accessor for Model {
    fn get(&self, segment: &str) -> Option<Cow<'_, Value>> {
        Model::get(self, segment).map(Cow::Borrowed)
    }

    fn slot_mut(&mut self, segment: &str) -> Option<&mut Value> {
        self.get_mut(segment)
    }

    /// Models are untyped: the value is stored as-is
    fn set(&mut self, segment: &str, value: Value, _converters: &Converters) -> bool {
        self.insert(segment, value);
        true
    }
}

impl Accessor for Sequence {
    fn get(&self, segment: &str) -> Option<Cow<'_, Value>> {
        Sequence::get(self, parse_index(segment)?).map(Cow::Borrowed)
    }

    fn slot_mut(&mut self, segment: &str) -> Option<&mut Value> {
        self.get_mut(parse_index(segment)?)
    }

    /// Coerces to the existing element's type when that element is non-null
    fn set(&mut self, segment: &str, value: Value, converters: &Converters) -> bool {
        let Some(slot) = parse_index(segment).and_then(|i| self.get_mut(i)) else {
            return false;
        };
        *slot = if slot.is_null() {
            value
        } else {
            coerce(value, &slot.value_type(), converters)
        };
        true
    }
}

impl Accessor for ObjectRef {
    fn get(&self, segment: &str) -> Option<Cow<'_, Value>> {
        ObjectRef::get(self, segment).map(Cow::Owned)
    }

    /// Coerces to the member's declared type
    fn set(&mut self, segment: &str, value: Value, converters: &Converters) -> bool {
        let ty = self.object_type();
        let Some(member) = ty.member(segment).filter(|m| m.writable) else {
            return false;
        };
        let coerced = coerce(value, &member.ty, converters);
        self.set_raw(segment, coerced)
    }
}

impl Value {
    /// Accessor for container values; scalars have none
    pub fn accessor(&self) -> Option<&dyn Accessor> {
        match self {
            Value::Model(m) => Some(m),
            Value::Sequence(s) => Some(s),
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn accessor_mut(&mut self) -> Option<&mut dyn Accessor> {
        match self {
            Value::Model(m) => Some(m),
            Value::Sequence(s) => Some(s),
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Whether children can be borrowed in place (Model and Sequence)
    pub(crate) fn has_slots(&self) -> bool {
        matches!(self, Value::Model(_) | Value::Sequence(_))
    }
}
