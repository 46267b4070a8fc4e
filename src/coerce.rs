//! Best-effort value coercion
//!
//! `coerce(value, target)` never fails: unresolvable conversions degrade to
//! the target's zero value and registered converter failures are logged.
//!
//! Order of attempts:
//! 1. `Null` → zero value
//! 2. already the right type → unchanged
//! 3. Model → constructible object type, member by member
//! 4. first registered [`Converter`] that can convert
//! 5. zero value

use once_cell::sync::Lazy;
use tracing::{trace, warn};

use crate::error::ConversionError;
use crate::value::{Value, ValueType};

/// A conversion strategy between two value types
pub trait Converter: Send + Sync {
    fn can_convert(&self, from: &ValueType, to: &ValueType) -> bool;

    fn convert(&self, value: &Value, to: &ValueType) -> Result<Value, ConversionError>;
}

/// Ordered converter registry: strategies are tried in registration order
pub struct Converters {
    strategies: Vec<Box<dyn Converter>>,
}

/// Standard registry, built on first use
static STANDARD: Lazy<Converters> = Lazy::new(Converters::standard);

impl Converters {
    /// Registry with no strategies
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Registry pre-loaded with the built-in numeric, parsing and formatting converters
    pub fn standard() -> Self {
        let mut converters = Self::empty();
        converters.register(NumericConverter);
        converters.register(ParseConverter);
        converters.register(FormatConverter);
        converters
    }

    /// Shared standard registry used when no registry is passed explicitly
    pub fn global() -> &'static Converters {
        &STANDARD
    }

    /// Append a strategy (tried after every earlier registration)
    pub fn register(&mut self, converter: impl Converter + 'static) -> &mut Self {
        self.strategies.push(Box::new(converter));
        self
    }

    /// Append a `(can_convert, convert)` pair
    pub fn register_fn<C, F>(&mut self, can_convert: C, convert: F) -> &mut Self
    where
        C: Fn(&ValueType, &ValueType) -> bool + Send + Sync + 'static,
        F: Fn(&Value, &ValueType) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.register(FnConverter {
            can_convert,
            convert,
        })
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// First strategy that reports it can convert `from` into `to`
    fn find(&self, from: &ValueType, to: &ValueType) -> Option<&dyn Converter> {
        self.strategies
            .iter()
            .find(|s| s.can_convert(from, to))
            .map(|s| s.as_ref())
    }
}

impl Default for Converters {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Converters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converters")
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

/// Coerce `value` into `target`, degrading to the zero value
pub fn coerce(value: Value, target: &ValueType, converters: &Converters) -> Value {
    if value.is_null() {
        return target.zero_value();
    }
    if target.accepts(&value) {
        return value;
    }

    if let (Value::Model(model), ValueType::Object(ty)) = (&value, target) {
        if let Some(object) = ty.construct() {
            for member in ty.members().iter().filter(|m| m.writable) {
                if let Some(entry) = model.get(&member.name) {
                    let coerced = coerce(entry.clone(), &member.ty, converters);
                    object.set_raw(&member.name, coerced);
                }
            }
            trace!(ty = ty.name(), "constructed object from model");
            return Value::Object(object);
        }
    }

    let from = value.value_type();
    if let Some(converter) = converters.find(&from, target) {
        match converter.convert(&value, target) {
            Ok(converted) => return converted,
            Err(error) => {
                warn!(from = %from, to = %target, %error, "coercion failed, using zero value");
            }
        }
    }

    target.zero_value()
}

// ─────────────────────────────────────────────────────────────
// Built-in converters
// ─────────────────────────────────────────────────────────────

struct FnConverter<C, F> {
    can_convert: C,
    convert: F,
}

impl<C, F> Converter for FnConverter<C, F>
where
    C: Fn(&ValueType, &ValueType) -> bool + Send + Sync,
    F: Fn(&Value, &ValueType) -> Result<Value, ConversionError> + Send + Sync,
{
    fn can_convert(&self, from: &ValueType, to: &ValueType) -> bool {
        (self.can_convert)(from, to)
    }

    fn convert(&self, value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
        (self.convert)(value, to)
    }
}

/// Between bool, int and float
pub struct NumericConverter;

impl Converter for NumericConverter {
    fn can_convert(&self, from: &ValueType, to: &ValueType) -> bool {
        from.is_value_kind() && to.is_value_kind()
    }

    fn convert(&self, value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
        match (value, to) {
            (Value::Int(i), ValueType::Float) => Ok(Value::Float(*i as f64)),
            (Value::Int(i), ValueType::Bool) => Ok(Value::Bool(*i != 0)),
            (Value::Float(f), ValueType::Bool) => Ok(Value::Bool(*f != 0.0)),
            (Value::Bool(b), ValueType::Int) => Ok(Value::Int(i64::from(*b))),
            (Value::Bool(b), ValueType::Float) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
            (Value::Float(f), ValueType::Int) => float_to_int(*f),
            _ => Err(ConversionError::Custom(format!("no numeric conversion to {to}"))),
        }
    }
}

/// Rounds half to even; rejects NaN, infinities and out-of-range values
fn float_to_int(f: f64) -> Result<Value, ConversionError> {
    let rounded = f.round_ties_even();
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return Err(ConversionError::OutOfRange {
            value: f.to_string(),
            target: ValueType::Int,
        });
    }
    Ok(Value::Int(rounded as i64))
}

/// Parses strings into bool, int and float
pub struct ParseConverter;

impl Converter for ParseConverter {
    fn can_convert(&self, from: &ValueType, to: &ValueType) -> bool {
        *from == ValueType::String && to.is_value_kind()
    }

    fn convert(&self, value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
        let text = value.as_str().unwrap_or_default().trim();
        let parse_error = || ConversionError::Parse {
            input: text.to_string(),
            target: to.clone(),
        };
        match to {
            ValueType::Bool => match text.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(parse_error()),
            },
            ValueType::Int => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| parse_error()),
            ValueType::Float => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| parse_error()),
            _ => Err(parse_error()),
        }
    }
}

/// Formats scalars as strings
pub struct FormatConverter;

impl Converter for FormatConverter {
    fn can_convert(&self, from: &ValueType, to: &ValueType) -> bool {
        from.is_value_kind() && *to == ValueType::String
    }

    fn convert(&self, value: &Value, _to: &ValueType) -> Result<Value, ConversionError> {
        match value {
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::Int(i) => Ok(Value::String(i.to_string())),
            Value::Float(f) => Ok(Value::String(f.to_string())),
            other => Err(ConversionError::Custom(format!(
                "cannot format {} as string",
                other.value_type()
            ))),
        }
    }
}
