use std::fmt::Write;

use smol_str::{SmolStr, ToSmolStr};

use crate::writer::{FormatContext, FormatWriter};

/// A scalar value written into sql or read back from a result.
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    Null,
    String(String),
    Bool(bool),
    F32(f32),
    F64(f64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl Bind {
    pub fn is_null(&self) -> bool {
        matches!(self, Bind::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bind::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Bind::I8(v) => Some(v.into()),
            Bind::I16(v) => Some(v.into()),
            Bind::I32(v) => Some(v.into()),
            Bind::I64(v) => Some(v),
            Bind::U8(v) => Some(v.into()),
            Bind::U16(v) => Some(v.into()),
            Bind::U32(v) => Some(v.into()),
            Bind::U64(v) => i64::try_from(v).ok(),
            Bind::Bool(v) => Some(v.into()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Bind::F32(v) => Some(v.into()),
            Bind::F64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Bind::Bool(v) => Some(v),
            _ => self.as_i64().map(|v| v != 0),
        }
    }

    /// Text stored by a comparison, and whether it must be quoted.
    /// Booleans collapse to `1`/`0`, null has no text.
    pub(crate) fn comparison_value(&self) -> Option<(SmolStr, bool)> {
        let value = match self {
            Bind::Null => return None,
            Bind::String(value) => return Some((SmolStr::new(value), true)),
            Bind::Bool(true) => SmolStr::new_static("1"),
            Bind::Bool(false) => SmolStr::new_static("0"),
            Bind::F32(v) => v.to_smolstr(),
            Bind::F64(v) => v.to_smolstr(),
            Bind::I8(v) => v.to_smolstr(),
            Bind::I16(v) => v.to_smolstr(),
            Bind::I32(v) => v.to_smolstr(),
            Bind::I64(v) => v.to_smolstr(),
            Bind::U8(v) => v.to_smolstr(),
            Bind::U16(v) => v.to_smolstr(),
            Bind::U32(v) => v.to_smolstr(),
            Bind::U64(v) => v.to_smolstr(),
        };
        Some((value, false))
    }
}

impl FormatWriter for Bind {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        match self.comparison_value() {
            None => context.writer.write_str("NULL"),
            Some((value, true)) => context.write_literal(&value),
            Some((value, false)) => context.writer.write_str(&value),
        }
    }
}

pub type Binds = Array<Bind>;

impl FormatWriter for Binds {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> std::fmt::Result {
        for (index, bind) in self.iter().enumerate() {
            if index > 0 {
                context.writer.write_char(',')?;
            }
            bind.format_writer(context)?;
        }
        Ok(())
    }
}

impl IntoBinds for Binds {
    fn into_binds(self) -> Binds {
        self
    }
}

impl IntoBinds for () {
    fn into_binds(self) -> Binds {
        Binds::None
    }
}

/// Zero, one or many values; the single value case stays off the heap.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Array<T> {
    #[default]
    None,
    One(T),
    Many(Vec<T>)
}

impl<T> Array<T> {
    pub fn append(&mut self, other: Self) {
        let combined = match (std::mem::replace(self, Self::None), other) {
            (Self::None, cols) | (cols, Self::None) => cols,
            (Self::One(a), Self::One(b)) =>
                Self::Many(vec![a, b]),
            (Self::One(a), Self::Many(mut b)) => {
                b.insert(0, a);
                Self::Many(b)
            }
            (Self::Many(mut a), Self::One(b)) => {
                a.push(b);
                Self::Many(a)
            }
            (Self::Many(mut a), Self::Many(mut b)) => {
                a.append(&mut b);
                Self::Many(a)
            }
        };
        *self = combined;
    }

    pub fn push(&mut self, value: T) {
        self.append(Self::One(value));
    }

    pub fn len(&self) -> usize {
        match self {
            Array::None => 0,
            Array::One(_) => 1,
            Array::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Array::None => &[],
            Array::One(one) => std::slice::from_ref(one),
            Array::Many(many) => many.as_slice(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::None => Vec::new(),
            Self::One(one) => Vec::from([one]),
            Self::Many(many) => many,
        }
    }
}

pub trait IntoBind {
    fn into_bind(self) -> Bind;
}

pub trait IntoBinds {
    fn into_binds(self) -> Binds;
}

impl<T> IntoBinds for T
where
    T: IntoBind
{
    fn into_binds(self) -> Binds {
        Binds::One(self.into_bind())
    }
}

impl<T> IntoBinds for Vec<T>
where
    T: IntoBind
{
    fn into_binds(self) -> Binds {
        Binds::Many(self.into_iter().map(IntoBind::into_bind).collect())
    }
}

impl<T, const N: usize> IntoBinds for [T; N]
where
    T: IntoBind
{
    fn into_binds(self) -> Binds {
        let mut iter = self.into_iter().map(IntoBind::into_bind);
        match (N, iter.next()) {
            (_, None) => Binds::None,
            (1, Some(one)) => Binds::One(one),
            (_, Some(first)) => {
                let mut many = Vec::with_capacity(N);
                many.push(first);
                many.extend(iter);
                Binds::Many(many)
            }
        }
    }
}

impl IntoBind for Bind {
    fn into_bind(self) -> Bind {
        self
    }
}

impl<T> IntoBind for Option<T>
where
    T: IntoBind
{
    fn into_bind(self) -> Bind {
        if let Some(value) = self {
            value.into_bind()
        } else {
            Bind::Null
        }
    }
}

macro_rules! into_bind {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl IntoBind for $ty {
                #[inline]
                fn into_bind(self) -> Bind {
                    Bind::$variant(self)
                }
            }
        )+
    };
}

into_bind! {
    bool => Bool,
    f32 => F32,
    f64 => F64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    String => String,
}

impl IntoBind for &str {
    fn into_bind(self) -> Bind {
        Bind::String(self.to_owned())
    }
}

impl IntoBind for &String {
    fn into_bind(self) -> Bind {
        Bind::String(self.clone())
    }
}

impl IntoBind for SmolStr {
    fn into_bind(self) -> Bind {
        Bind::String(self.to_string())
    }
}

#[cfg(feature = "chrono")]
impl IntoBind for chrono::NaiveDate {
    fn into_bind(self) -> Bind {
        Bind::String(self.format("%Y-%m-%d").to_string())
    }
}

#[cfg(feature = "chrono")]
impl IntoBind for chrono::NaiveDateTime {
    fn into_bind(self) -> Bind {
        Bind::String(self.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
    }
}

#[cfg(feature = "chrono")]
impl<Tz: chrono::TimeZone> IntoBind for chrono::DateTime<Tz> {
    fn into_bind(self) -> Bind {
        self.naive_utc().into_bind()
    }
}

#[cfg(feature = "uuid")]
impl IntoBind for uuid::Uuid {
    fn into_bind(self) -> Bind {
        Bind::String(self.to_string())
    }
}

/// Reads a typed value back out of a result cell.
pub trait FromBind: Sized {
    const EXPECTED: &'static str;

    fn from_bind(bind: &Bind) -> Option<Self>;
}

impl FromBind for Bind {
    const EXPECTED: &'static str = "any value";

    fn from_bind(bind: &Bind) -> Option<Self> {
        Some(bind.clone())
    }
}

impl FromBind for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_bind(bind: &Bind) -> Option<Self> {
        bind.as_i64()
    }
}

impl FromBind for i32 {
    const EXPECTED: &'static str = "a 32 bit integer";

    fn from_bind(bind: &Bind) -> Option<Self> {
        bind.as_i64().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromBind for f64 {
    const EXPECTED: &'static str = "a float";

    fn from_bind(bind: &Bind) -> Option<Self> {
        bind.as_f64()
    }
}

impl FromBind for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_bind(bind: &Bind) -> Option<Self> {
        bind.as_bool()
    }
}

impl FromBind for String {
    const EXPECTED: &'static str = "a string";

    fn from_bind(bind: &Bind) -> Option<Self> {
        bind.as_str().map(str::to_owned)
    }
}

impl FromBind for SmolStr {
    const EXPECTED: &'static str = "a string";

    fn from_bind(bind: &Bind) -> Option<Self> {
        bind.as_str().map(SmolStr::new)
    }
}

impl<T: FromBind> FromBind for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_bind(bind: &Bind) -> Option<Self> {
        if bind.is_null() {
            Some(None)
        } else {
            T::from_bind(bind).map(Some)
        }
    }
}
