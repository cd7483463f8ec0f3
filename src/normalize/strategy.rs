//! Ordered conversion strategies tried by the normalizer.

use serde_json::{Map, Value};

use super::{Loggable, Normalizer};

/// Why a strategy did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// The value lacks the capability this strategy relies on.
    Inapplicable,
    /// The capability exists but failed for this value.
    Failed(String),
}

/// Single step of the normalization fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Encode the value as-is.
    DirectEncode,
    /// Normalize each element of a sequence independently.
    SequenceElementwise,
    /// Map record field names to their normalized values.
    StructuredRecord,
    /// Use the value's explicit dict conversion.
    DictConversion,
    /// Dump every public field of the attribute table.
    GenericFieldDump,
    /// Circle-like values exposing `x`, `y` and `radius`.
    ///
    /// This matches exact attribute names only and is not a general shape mechanism.
    KnownShape,
    /// Plain string representation. Always succeeds.
    StringFallback,
}

impl Strategy {
    /// Chain used by [`Normalizer::default`].
    pub const DEFAULT_CHAIN: [Self; 7] = [
        Self::DirectEncode,
        Self::SequenceElementwise,
        Self::StructuredRecord,
        Self::DictConversion,
        Self::GenericFieldDump,
        Self::KnownShape,
        Self::StringFallback,
    ];

    /// Stable label used in log output.
    pub const fn label(self) -> &'static str {
        match self {
            Self::DirectEncode => "direct_encode",
            Self::SequenceElementwise => "sequence_elementwise",
            Self::StructuredRecord => "structured_record",
            Self::DictConversion => "dict_conversion",
            Self::GenericFieldDump => "generic_field_dump",
            Self::KnownShape => "known_shape",
            Self::StringFallback => "string_fallback",
        }
    }

    pub(crate) fn attempt(
        self,
        value: &dyn Loggable,
        normalizer: &Normalizer,
        depth: usize,
    ) -> Result<Value, Skip> {
        let child = |item: &dyn Loggable| normalizer.convert_child(item, depth + 1);

        match self {
            Self::DirectEncode => match value.encode() {
                Some(Ok(encoded)) => Ok(encoded),
                Some(Err(reason)) => Err(Skip::Failed(reason)),
                None => Err(Skip::Inapplicable),
            },
            Self::SequenceElementwise => {
                let items = value.elements().ok_or(Skip::Inapplicable)?;
                Ok(Value::Array(items.into_iter().map(child).collect()))
            }
            Self::StructuredRecord => {
                let fields = value.record().ok_or(Skip::Inapplicable)?;
                Ok(object(fields.into_iter().map(|(name, field)| (name, child(field)))))
            }
            Self::DictConversion => {
                let entries = value
                    .to_dict()
                    .ok_or(Skip::Inapplicable)?
                    .map_err(Skip::Failed)?;
                Ok(object(
                    entries
                        .iter()
                        .map(|(name, entry)| (name.as_str(), child(entry.as_ref()))),
                ))
            }
            Self::GenericFieldDump => {
                let fields = value.fields().ok_or(Skip::Inapplicable)?;
                Ok(object(
                    fields
                        .into_iter()
                        .filter(|(name, _)| !name.starts_with('_'))
                        .map(|(name, field)| (name, child(field))),
                ))
            }
            Self::KnownShape => {
                let (Some(x), Some(y), Some(radius)) = (
                    value.attribute("x"),
                    value.attribute("y"),
                    value.attribute("radius"),
                ) else {
                    return Err(Skip::Inapplicable);
                };
                let marked = value
                    .attribute("marked")
                    .map(child)
                    .unwrap_or(Value::Bool(false));
                Ok(object([
                    ("x", child(x)),
                    ("y", child(y)),
                    ("radius", child(radius)),
                    ("marked", marked),
                ]))
            }
            Self::StringFallback => Ok(Value::String(value.describe())),
        }
    }
}

fn object<'a>(entries: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
    let map: Map<String, Value> = entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    Value::Object(map)
}
