//! Selector - delimiter-joined path into a binding value
//!
//! Supports:
//! - `a.b.c` (mapping keys and object members)
//! - `items.0.name` (sequence index as a plain segment)
//! - `""` (identity: a single empty segment)
//! - empty segments anywhere (`a..b` reads as `a.b`)
//!
//! Resolution is total: any miss yields `Null`. Assignment reports a miss as
//! `false` and coerces the written value toward the target's type.

use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::coerce::Converters;
use crate::value::Value;

/// Default segment delimiter
pub const DEFAULT_DELIMITER: char = '.';

/// An immutable, ordered list of path segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Selector {
    segments: SmallVec<[String; 4]>,
}

impl Selector {
    /// Parse with the default `.` delimiter
    ///
    /// Examples:
    /// - "a.b.1" → ["a", "b", "1"]
    /// - "" → [""]
    pub fn parse(text: &str) -> Self {
        Self::parse_with(text, DEFAULT_DELIMITER)
    }

    /// Parse with a custom delimiter
    pub fn parse_with(text: &str, delimiter: char) -> Self {
        Self {
            segments: text.split(delimiter).map(str::to_string).collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn to_segments(&self) -> Vec<String> {
        self.segments.to_vec()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when every segment is a passthrough
    pub fn is_identity(&self) -> bool {
        self.segments.iter().all(String::is_empty)
    }

    /// Join segments with a custom delimiter
    pub fn to_string_with(&self, delimiter: char) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push(delimiter);
            }
            out.push_str(segment);
        }
        out
    }

    /// All segments but the last (the container of [`index`](Self::index))
    pub fn model(&self) -> Selector {
        let keep = self.segments.len().saturating_sub(1);
        Self {
            segments: self.segments[..keep].iter().cloned().collect(),
        }
    }

    /// The last segment alone (empty for a zero-segment selector)
    pub fn index(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// New selector with `other`'s segments appended
    pub fn join(&self, other: &Selector) -> Selector {
        Self {
            segments: self.segments.iter().chain(other.segments.iter()).cloned().collect(),
        }
    }

    /// New selector with one more segment
    pub fn child(&self, segment: impl Into<String>) -> Selector {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Read the value at this path; `Null` on any miss
    pub fn resolve(&self, root: &Value) -> Value {
        match walk(root, &self.segments) {
            Some(value) => value.into_owned(),
            None => {
                trace!(selector = %self, "resolution miss");
                Value::Null
            }
        }
    }

    /// Write `value` at this path using the standard converters
    pub fn assign(&self, root: &mut Value, value: impl Into<Value>) -> bool {
        self.assign_with(root, value.into(), Converters::global())
    }

    /// Write `value` at this path; `false` when the container is missing or
    /// the final slot is not writable
    pub fn assign_with(&self, root: &mut Value, value: Value, converters: &Converters) -> bool {
        let index = self.index();
        if index.is_empty() {
            trace!(selector = %self, "assignment to passthrough segment");
            return false;
        }

        let written = match walk_mut(root, self.model().segments()) {
            Some(Target::Slot(container)) => set_member(container, index, value, converters),
            Some(Target::Detached {
                value: mut container,
                parents,
            }) => {
                set_member(&mut container, index, value, converters)
                    && write_back(container, parents, converters)
            }
            None => false,
        };
        if !written {
            trace!(selector = %self, "assignment miss");
        }
        written
    }
}

/// Where a mutable walk ended up
enum Target<'a> {
    /// Borrowed in place (reached through models and sequences only)
    Slot(&'a mut Value),
    /// Copy read out of a structural object member. `parents` lists the
    /// containers to store it back into, outermost first; the outermost is
    /// always an object.
    Detached {
        value: Value,
        parents: Vec<(Value, String)>,
    },
}

fn child(value: &Value, segment: &str) -> Option<Value> {
    Some(value.accessor()?.get(segment)?.into_owned())
}

fn walk<'a>(root: &'a Value, segments: &[String]) -> Option<Cow<'a, Value>> {
    let mut current = Cow::Borrowed(root);

    for segment in segments.iter().filter(|s| !s.is_empty()) {
        current = match current {
            Cow::Borrowed(value) => value.accessor()?.get(segment)?,
            Cow::Owned(value) => Cow::Owned(child(&value, segment)?),
        };
    }

    Some(current)
}

fn walk_mut<'a>(root: &'a mut Value, segments: &[String]) -> Option<Target<'a>> {
    let mut current = Target::Slot(root);

    for segment in segments.iter().filter(|s| !s.is_empty()) {
        current = match current {
            Target::Slot(value) if value.has_slots() => {
                Target::Slot(value.accessor_mut()?.slot_mut(segment)?)
            }
            Target::Slot(value) => Target::Detached {
                value: child(value, segment)?,
                parents: vec![(value.clone(), segment.clone())],
            },
            Target::Detached { value, mut parents } => {
                let next = child(&value, segment)?;
                if value.has_slots() {
                    parents.push((value, segment.clone()));
                } else {
                    // Object handles are shared: nothing above them needs a write-back
                    parents = vec![(value, segment.clone())];
                }
                Target::Detached { value: next, parents }
            }
        };
    }

    Some(current)
}

/// Store a modified copy back into its parents, innermost first, stopping at
/// the first object handle; `false` when a parent refuses the write
fn write_back(mut value: Value, parents: Vec<(Value, String)>, converters: &Converters) -> bool {
    if !value.has_slots() {
        return true;
    }
    for (mut container, segment) in parents.into_iter().rev() {
        if !set_member(&mut container, &segment, value, converters) {
            trace!(segment = %segment, "write-back refused");
            return false;
        }
        if !container.has_slots() {
            return true;
        }
        value = container;
    }
    true
}

fn set_member(container: &mut Value, index: &str, value: Value, converters: &Converters) -> bool {
    match container.accessor_mut() {
        Some(accessor) => accessor.set(index, value, converters),
        None => false,
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(DEFAULT_DELIMITER))
    }
}

impl FromStr for Selector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.to_string()
    }
}
