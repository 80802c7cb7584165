//! Discriminator-based dispatch for closed record families.
//!
//! # Invariants
//! - Each variant's discriminator value is fixed and distinct in its family.
//! - An unrecognized value resolves to the family's catch-all variant when one
//!   exists, otherwise to `RecordError::UnknownVariant`.

use super::{into_mapping, parse_mapping, Mapping, RecordError, RecordResult};
use serde_json::Value;

/// A closed family of record shapes selected by a discriminator field.
pub trait Discriminated: Sized {
    /// Name used in error reports.
    const FAMILY: &'static str;
    /// Key holding the variant tag.
    const DISCRIMINATOR: &'static str;

    /// Tag of this value's variant.
    fn tag(&self) -> &str;

    /// Builds the variant for `tag`, or `None` when no variant claims it.
    fn construct(tag: &str, mapping: &Mapping, fill_missing: bool) -> Option<RecordResult<Self>>;

    /// Mapping of the variant's own fields, without the discriminator.
    fn variant_mapping(&self) -> RecordResult<Mapping>;

    fn resolve(mapping: &Mapping, fill_missing: bool) -> RecordResult<Self> {
        let tag = mapping
            .get(Self::DISCRIMINATOR)
            .ok_or(RecordError::MissingDiscriminator {
                family: Self::FAMILY,
                discriminator: Self::DISCRIMINATOR,
            })?;
        let Value::String(tag) = tag else {
            return Err(RecordError::UnknownVariant {
                family: Self::FAMILY,
                value: tag.to_string(),
            });
        };
        Self::construct(tag, mapping, fill_missing).unwrap_or_else(|| {
            Err(RecordError::UnknownVariant {
                family: Self::FAMILY,
                value: tag.clone(),
            })
        })
    }

    /// Resolves a JSON object, or JSON text holding one.
    fn resolve_value(value: Value, fill_missing: bool) -> RecordResult<Self> {
        let mapping = into_mapping(Self::FAMILY, value)?;
        Self::resolve(&mapping, fill_missing)
    }

    fn resolve_text(text: &str) -> RecordResult<Self> {
        let mapping = parse_mapping(Self::FAMILY, text)?;
        Self::resolve(&mapping, false)
    }

    fn resolve_list(mappings: &[Mapping]) -> RecordResult<Vec<Self>> {
        mappings
            .iter()
            .map(|mapping| Self::resolve(mapping, false))
            .collect()
    }

    /// Variant fields plus the discriminator.
    fn as_mapping(&self) -> RecordResult<Mapping> {
        let mut mapping = self.variant_mapping()?;
        mapping.insert(
            Self::DISCRIMINATOR.to_string(),
            Value::String(self.tag().to_string()),
        );
        Ok(mapping)
    }
}

/// Implements serde for a `Discriminated` enum through `as_mapping`/`resolve`,
/// so the family can nest inside other records.
macro_rules! discriminated_serde {
    ($family:ty) => {
        impl serde::Serialize for $family {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                use $crate::record::Discriminated;
                let mapping = self.as_mapping().map_err(serde::ser::Error::custom)?;
                serde::Serialize::serialize(&mapping, serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $family {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                use $crate::record::Discriminated;
                let mapping = <$crate::record::Mapping as serde::Deserialize>::deserialize(deserializer)?;
                Self::resolve(&mapping, false).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use discriminated_serde;
