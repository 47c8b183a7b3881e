//! Pre-pass that rejects NaN and infinite floats before variables reach
//! `serde_json`, which would otherwise encode them silently as `null`.

use std::fmt;

use serde::ser::{
    self, Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant, Serializer,
};

/// Walks `value` and fails on the first non-finite float.
pub(super) fn ensure_finite<T>(value: &T) -> Result<(), Rejected>
where
    T: Serialize + ?Sized,
{
    value.serialize(FiniteCheck)
}

/// Reason a value was refused by [`FiniteCheck`].
#[derive(Debug)]
pub(super) struct Rejected(String);

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Rejected {}

impl ser::Error for Rejected {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Rejected(msg.to_string())
    }
}

fn check_float(f: f64) -> Result<(), Rejected> {
    if f.is_finite() {
        Ok(())
    } else {
        Err(Rejected(format!("non-finite float {f}")))
    }
}

struct FiniteCheck;

macro_rules! accept {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _v: $ty) -> Result<(), Rejected> {
                Ok(())
            }
        )*
    };
}

impl Serializer for FiniteCheck {
    type Ok = ();
    type Error = Rejected;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    accept!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
        serialize_unit_struct(&'static str),
    );

    fn serialize_f32(self, v: f32) -> Result<(), Rejected> {
        check_float(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), Rejected> {
        check_float(v)
    }

    fn serialize_none(self) -> Result<(), Rejected> {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), Rejected> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), Rejected> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<(), Rejected> {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), Rejected> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), Rejected> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self, Rejected> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, Rejected> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self, Rejected> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, Rejected> {
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self, Rejected> {
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, Rejected> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, Rejected> {
        Ok(self)
    }
}

impl SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = Rejected;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Rejected> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = Rejected;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Rejected> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = Rejected;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Rejected> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = Rejected;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Rejected> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = Rejected;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Rejected> {
        key.serialize(FiniteCheck)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Rejected> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = Rejected;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), Rejected> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = Rejected;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), Rejected> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}
