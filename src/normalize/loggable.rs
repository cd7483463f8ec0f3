//! Capability trait describing how a value can be turned into JSON.

use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Named entries returned by a dict-style conversion.
pub type Entries<'a> = Vec<(String, Box<dyn Loggable + 'a>)>;

/// A value that can be logged as a JSON artifact.
///
/// Each method advertises one capability the normalizer may use. The defaults
/// declare the capability absent, so an implementation only overrides what the
/// type actually offers. [`Loggable::describe`] is the one capability every value
/// has; it defaults to the `Debug` representation.
pub trait Loggable: fmt::Debug {
    /// Encode the value as JSON without any conversion.
    ///
    /// `None` means the type has no direct encoding; `Some(Err(_))` means it has
    /// one but this particular value cannot be encoded.
    fn encode(&self) -> Option<Result<Value, String>> {
        None
    }

    /// Elements of an ordered sequence or fixed tuple.
    fn elements(&self) -> Option<Vec<&dyn Loggable>> {
        None
    }

    /// Fields of an immutable structured record, in declaration order.
    fn record(&self) -> Option<Vec<(&str, &dyn Loggable)>> {
        None
    }

    /// Explicit conversion into named entries.
    fn to_dict(&self) -> Option<Result<Entries<'_>, String>> {
        None
    }

    /// The full attribute table, including names marked internal with a leading `_`.
    fn fields(&self) -> Option<Vec<(&str, &dyn Loggable)>> {
        None
    }

    /// Look up a single named attribute.
    fn attribute(&self, name: &str) -> Option<&dyn Loggable> {
        let _ = name;
        None
    }

    /// Plain string representation.
    fn describe(&self) -> String {
        format!("{self:?}")
    }

    /// Type name reported in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Adapter that logs any `Serialize` type through serde.
///
/// Encoding goes through `serde_json::to_value`, so non-finite floats inside the
/// wrapped value become `null` rather than their string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Serialized<T>(pub T);

impl<T: Serialize + fmt::Debug> Loggable for Serialized<T> {
    fn encode(&self) -> Option<Result<Value, String>> {
        Some(serde_json::to_value(&self.0).map_err(|err| err.to_string()))
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

macro_rules! loggable_via_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Loggable for $ty {
                fn encode(&self) -> Option<Result<Value, String>> {
                    Some(Ok(Value::from(*self)))
                }
            }
        )*
    };
}

loggable_via_from!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

fn encode_float(value: f64) -> Option<Result<Value, String>> {
    Some(
        Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| format!("{value} has no JSON representation")),
    )
}

impl Loggable for f64 {
    fn encode(&self) -> Option<Result<Value, String>> {
        encode_float(*self)
    }
}

impl Loggable for f32 {
    fn encode(&self) -> Option<Result<Value, String>> {
        encode_float(f64::from(*self))
    }
}

impl Loggable for char {
    fn encode(&self) -> Option<Result<Value, String>> {
        Some(Ok(Value::String(self.to_string())))
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl Loggable for str {
    fn encode(&self) -> Option<Result<Value, String>> {
        Some(Ok(Value::String(self.to_string())))
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl Loggable for String {
    fn encode(&self) -> Option<Result<Value, String>> {
        self.as_str().encode()
    }

    fn describe(&self) -> String {
        self.clone()
    }
}

impl Loggable for () {
    fn encode(&self) -> Option<Result<Value, String>> {
        Some(Ok(Value::Null))
    }
}

impl Loggable for Value {
    fn encode(&self) -> Option<Result<Value, String>> {
        Some(Ok(self.clone()))
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

/// Pointer-like wrappers that forward every capability to their target.
trait Forward {
    type Target: Loggable + ?Sized;

    fn target(&self) -> &Self::Target;
}

impl<T: Loggable + ?Sized> Forward for &T {
    type Target = T;

    fn target(&self) -> &T {
        self
    }
}

impl<T: Loggable + ?Sized> Forward for Box<T> {
    type Target = T;

    fn target(&self) -> &T {
        self.as_ref()
    }
}

macro_rules! forward_loggable {
    ($($wrapper:ty),*) => {
        $(
            impl<T: Loggable + ?Sized> Loggable for $wrapper {
                fn encode(&self) -> Option<Result<Value, String>> {
                    self.target().encode()
                }

                fn elements(&self) -> Option<Vec<&dyn Loggable>> {
                    self.target().elements()
                }

                fn record(&self) -> Option<Vec<(&str, &dyn Loggable)>> {
                    self.target().record()
                }

                fn to_dict(&self) -> Option<Result<Entries<'_>, String>> {
                    self.target().to_dict()
                }

                fn fields(&self) -> Option<Vec<(&str, &dyn Loggable)>> {
                    self.target().fields()
                }

                fn attribute(&self, name: &str) -> Option<&dyn Loggable> {
                    self.target().attribute(name)
                }

                fn describe(&self) -> String {
                    self.target().describe()
                }

                fn type_name(&self) -> &'static str {
                    self.target().type_name()
                }
            }
        )*
    };
}

forward_loggable!(&T, Box<T>);

impl<T: Loggable> Loggable for Option<T> {
    fn encode(&self) -> Option<Result<Value, String>> {
        match self {
            Some(value) => value.encode(),
            None => Some(Ok(Value::Null)),
        }
    }

    fn elements(&self) -> Option<Vec<&dyn Loggable>> {
        self.as_ref()?.elements()
    }

    fn record(&self) -> Option<Vec<(&str, &dyn Loggable)>> {
        self.as_ref()?.record()
    }

    fn to_dict(&self) -> Option<Result<Entries<'_>, String>> {
        self.as_ref()?.to_dict()
    }

    fn fields(&self) -> Option<Vec<(&str, &dyn Loggable)>> {
        self.as_ref()?.fields()
    }

    fn attribute(&self, name: &str) -> Option<&dyn Loggable> {
        self.as_ref()?.attribute(name)
    }

    fn describe(&self) -> String {
        match self {
            Some(value) => value.describe(),
            None => "None".to_string(),
        }
    }
}

/// Encode every item directly, failing as soon as one item cannot be.
fn encode_items<'a>(
    items: impl IntoIterator<Item = &'a dyn Loggable>,
) -> Result<Vec<Value>, String> {
    items
        .into_iter()
        .map(|item| match item.encode() {
            Some(result) => result,
            None => Err(format!("{} is not directly encodable", item.type_name())),
        })
        .collect()
}

fn encode_sequence(items: Vec<&dyn Loggable>) -> Option<Result<Value, String>> {
    Some(encode_items(items).map(Value::Array))
}

impl<T: Loggable> Loggable for [T] {
    fn encode(&self) -> Option<Result<Value, String>> {
        encode_sequence(self.elements()?)
    }

    fn elements(&self) -> Option<Vec<&dyn Loggable>> {
        Some(self.iter().map(|item| item as &dyn Loggable).collect())
    }
}

impl<T: Loggable, const N: usize> Loggable for [T; N] {
    fn encode(&self) -> Option<Result<Value, String>> {
        self.as_slice().encode()
    }

    fn elements(&self) -> Option<Vec<&dyn Loggable>> {
        self.as_slice().elements()
    }
}

impl<T: Loggable> Loggable for Vec<T> {
    fn encode(&self) -> Option<Result<Value, String>> {
        self.as_slice().encode()
    }

    fn elements(&self) -> Option<Vec<&dyn Loggable>> {
        self.as_slice().elements()
    }
}

macro_rules! loggable_tuple {
    ($($name:ident),+) => {
        impl<$($name: Loggable),+> Loggable for ($($name,)+) {
            fn encode(&self) -> Option<Result<Value, String>> {
                encode_sequence(self.elements()?)
            }

            #[allow(non_snake_case)]
            fn elements(&self) -> Option<Vec<&dyn Loggable>> {
                let ($($name,)+) = self;
                Some(vec![$($name as &dyn Loggable),+])
            }
        }
    };
}

loggable_tuple!(A);
loggable_tuple!(A, B);
loggable_tuple!(A, B, C);
loggable_tuple!(A, B, C, D);

fn encode_map<'a>(
    entries: impl Iterator<Item = (&'a String, &'a dyn Loggable)>,
) -> Option<Result<Value, String>> {
    let mut object = serde_json::Map::new();
    for (key, value) in entries {
        let encoded = match value.encode() {
            Some(Ok(encoded)) => encoded,
            Some(Err(reason)) => return Some(Err(reason)),
            None => {
                return Some(Err(format!(
                    "value for key '{key}' ({}) is not directly encodable",
                    value.type_name()
                )));
            }
        };
        object.insert(key.clone(), encoded);
    }
    Some(Ok(Value::Object(object)))
}

fn map_entries<'a, V: Loggable + 'a>(
    entries: impl Iterator<Item = (&'a String, &'a V)>,
) -> Entries<'a> {
    entries
        .map(|(key, value)| (key.clone(), Box::new(value) as Box<dyn Loggable + 'a>))
        .collect()
}

impl<V: Loggable> Loggable for BTreeMap<String, V> {
    fn encode(&self) -> Option<Result<Value, String>> {
        encode_map(self.iter().map(|(key, value)| (key, value as &dyn Loggable)))
    }

    fn to_dict(&self) -> Option<Result<Entries<'_>, String>> {
        Some(Ok(map_entries(self.iter())))
    }
}

impl<V: Loggable, S> Loggable for HashMap<String, V, S> {
    fn encode(&self) -> Option<Result<Value, String>> {
        encode_map(self.iter().map(|(key, value)| (key, value as &dyn Loggable)))
    }

    fn to_dict(&self) -> Option<Result<Entries<'_>, String>> {
        Some(Ok(map_entries(self.iter())))
    }
}
