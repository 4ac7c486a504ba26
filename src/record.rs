//! Populating records from hash fields
//!
//! HGETALL returns field names and values as text. [`from_fields`] feeds
//! them to `serde` as a map, so any `Deserialize` struct can be the
//! destination: fields are matched by name, values are parsed into the
//! field's type (integers, floats, booleans, strings, options and unit
//! enum variants). Fields missing from the hash need `#[serde(default)]`;
//! fields the record does not declare are ignored.

use crate::core::error::{ClientError, ClientResult};
use serde::de::{
    self, value::MapDeserializer, DeserializeOwned, IntoDeserializer, Unexpected, Visitor,
};
use serde::forward_to_deserialize_any;
use std::marker::PhantomData;

/// Build a `T` from field/value pairs
pub fn from_fields<T: DeserializeOwned>(fields: Vec<(String, String)>) -> ClientResult<T> {
    let map = MapDeserializer::<_, de::value::Error>::new(
        fields.into_iter().map(|(field, value)| (field, FieldValue(value))),
    );
    T::deserialize(map).map_err(|e| ClientError::Record(e.to_string()))
}

struct FieldValue(String);

impl<'de, E: de::Error> IntoDeserializer<'de, E> for FieldValue {
    type Deserializer = FieldDeserializer<E>;

    fn into_deserializer(self) -> Self::Deserializer {
        FieldDeserializer {
            value: self.0,
            marker: PhantomData,
        }
    }
}

struct FieldDeserializer<E> {
    value: String,
    marker: PhantomData<E>,
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
                match self.value.trim().parse::<$ty>() {
                    Ok(parsed) => visitor.$visit(parsed),
                    Err(_) => Err(E::invalid_value(Unexpected::Str(&self.value), &visitor)),
                }
            }
        )*
    };
}

impl<'de, E: de::Error> de::Deserializer<'de> for FieldDeserializer<E> {
    type Error = E;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        visitor.visit_string(self.value)
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value.trim() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => visitor.visit_bool(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => visitor.visit_bool(false),
            _ => Err(E::invalid_value(Unexpected::Str(&self.value), &visitor)),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, E> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, E> {
        let variant: de::value::StringDeserializer<E> = self.value.into_deserializer();
        visitor.visit_enum(variant)
    }

    forward_to_deserialize_any! {
        i128 u128 char str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}
