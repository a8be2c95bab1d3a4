use crate::error::TemplateError;
use crate::tpl::render_context::RenderContext;
use serde::Serialize;
use serde::ser::{self, Impossible, SerializeMap, SerializeStruct};

pub(crate) fn to_context<T: Serialize + ?Sized>(t: &T) -> Result<RenderContext, TemplateError> {
    t.serialize(ContextSerializer)
}

/// What a single field contributes to the context.
enum Binding {
    Flag(bool),
    Var(String),
    Absent,
}

fn not_a_record() -> TemplateError {
    TemplateError::Context("a render context must be built from a struct or map".into())
}

fn nested(kind: &str) -> TemplateError {
    TemplateError::Context(format!("{} values cannot be bound in a render context", kind))
}

struct ContextSerializer;

macro_rules! reject_scalar {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _: $ty) -> Result<Self::Ok, Self::Error> {
                Err(not_a_record())
            }
        )*
    };
}

impl ser::Serializer for ContextSerializer {
    type Ok = RenderContext;
    type Error = TemplateError;
    type SerializeSeq = Impossible<RenderContext, TemplateError>;
    type SerializeTuple = Impossible<RenderContext, TemplateError>;
    type SerializeTupleStruct = Impossible<RenderContext, TemplateError>;
    type SerializeTupleVariant = Impossible<RenderContext, TemplateError>;
    type SerializeMap = ContextBuilder;
    type SerializeStruct = ContextBuilder;
    type SerializeStructVariant = Impossible<RenderContext, TemplateError>;

    reject_scalar!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    );

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(RenderContext::new())
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Ok(RenderContext::new())
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<Self::Ok, Self::Error> {
        Ok(RenderContext::new())
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record())
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record())
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Err(not_a_record())
    }
    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(not_a_record())
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(not_a_record())
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(not_a_record())
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(ContextBuilder::default())
    }
    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(ContextBuilder::default())
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(not_a_record())
    }
}

#[derive(Default)]
struct ContextBuilder {
    ctx: RenderContext,
    key: Option<String>,
}

impl ContextBuilder {
    fn bind(&mut self, key: String, binding: Binding) {
        match binding {
            Binding::Flag(b) => self.ctx.set_flag(key, b),
            Binding::Var(s) => self.ctx.set_var(key, s),
            Binding::Absent => {}
        }
    }
}

impl SerializeMap for ContextBuilder {
    type Ok = RenderContext;
    type Error = TemplateError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Self::Error> {
        match key.serialize(BindingSerializer)? {
            Binding::Var(s) => {
                self.key = Some(s);
                Ok(())
            }
            _ => Err(TemplateError::Context("map keys must be strings".into())),
        }
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        let binding = value.serialize(BindingSerializer)?;
        let key = self
            .key
            .take()
            .ok_or_else(|| TemplateError::Context("missing key for value".into()))?;
        self.bind(key, binding);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(self.ctx)
    }
}

impl SerializeStruct for ContextBuilder {
    type Ok = RenderContext;
    type Error = TemplateError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        let binding = value.serialize(BindingSerializer)?;
        self.bind(key.to_string(), binding);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(self.ctx)
    }
}

struct BindingSerializer;

macro_rules! bind_display {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<Self::Ok, Self::Error> {
                Ok(Binding::Var(v.to_string()))
            }
        )*
    };
}

impl ser::Serializer for BindingSerializer {
    type Ok = Binding;
    type Error = TemplateError;
    type SerializeSeq = Impossible<Binding, TemplateError>;
    type SerializeTuple = Impossible<Binding, TemplateError>;
    type SerializeTupleStruct = Impossible<Binding, TemplateError>;
    type SerializeTupleVariant = Impossible<Binding, TemplateError>;
    type SerializeMap = Impossible<Binding, TemplateError>;
    type SerializeStruct = Impossible<Binding, TemplateError>;
    type SerializeStructVariant = Impossible<Binding, TemplateError>;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        Ok(Binding::Flag(v))
    }

    bind_display!(
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
    );

    fn serialize_bytes(self, _: &[u8]) -> Result<Self::Ok, Self::Error> {
        Err(nested("byte"))
    }
    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(Binding::Absent)
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Ok(Binding::Absent)
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<Self::Ok, Self::Error> {
        Ok(Binding::Absent)
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(Binding::Var(variant.to_string()))
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<Self::Ok, Self::Error> {
        Err(nested("enum"))
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Err(nested("sequence"))
    }
    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(nested("tuple"))
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(nested("tuple"))
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(nested("enum"))
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Err(nested("map"))
    }
    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Err(nested("struct"))
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(nested("enum"))
    }
}
