//! Numeric values and the delta protocol.
//!
//! All supported numeric kinds are carried by [`Number`]. A delta is applied
//! in the stored value's own type: the amount is converted to that type with
//! `as` semantics first, then integers add or subtract with wrapping
//! arithmetic and floats with IEEE arithmetic. Overflow is not reported.
//!
//! ```
//! use flashcache::{Direction, Number};
//!
//! let n = Number::from(250u8).apply(Number::from(10i64), Direction::Increment);
//! assert_eq!(n, Number::U8(4));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way a delta moves a stored number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increment,
    Decrement,
}

/// A number of one of the supported kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Number {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
}

/// A primitive type that can live inside a [`Number`].
pub trait Numeric: Copy + Into<Number> + Send + Sync + 'static {
    /// Converts any number to this type with `as` semantics.
    fn cast_from(number: Number) -> Self;

    /// Extracts the value only if `number` is exactly this kind.
    fn exact_from(number: Number) -> Option<Self>;

    /// `self ± amount`, wrapping for integers.
    fn offset(self, amount: Self, direction: Direction) -> Self;
}

/// Lossless-enough intermediate for `as` conversions between kinds.
///
/// Integer to integer through `i128` keeps the same low bits as a direct
/// `as` cast; floats go through `f64`, which holds every `f32` exactly.
#[derive(Clone, Copy)]
enum Wide {
    Int(i128),
    Float(f64),
}

macro_rules! numeric_kinds {
    (int: $($int:ty => $ivariant:ident),* ; float: $($float:ty => $fvariant:ident),*) => {
        $(
            impl From<$int> for Number {
                fn from(value: $int) -> Self {
                    Number::$ivariant(value)
                }
            }

            impl Numeric for $int {
                fn cast_from(number: Number) -> Self {
                    match number.wide() {
                        Wide::Int(value) => value as $int,
                        Wide::Float(value) => value as $int,
                    }
                }

                fn exact_from(number: Number) -> Option<Self> {
                    match number {
                        Number::$ivariant(value) => Some(value),
                        _ => None,
                    }
                }

                fn offset(self, amount: Self, direction: Direction) -> Self {
                    match direction {
                        Direction::Increment => self.wrapping_add(amount),
                        Direction::Decrement => self.wrapping_sub(amount),
                    }
                }
            }
        )*
        $(
            impl From<$float> for Number {
                fn from(value: $float) -> Self {
                    Number::$fvariant(value)
                }
            }

            impl Numeric for $float {
                fn cast_from(number: Number) -> Self {
                    match number.wide() {
                        Wide::Int(value) => value as $float,
                        Wide::Float(value) => value as $float,
                    }
                }

                fn exact_from(number: Number) -> Option<Self> {
                    match number {
                        Number::$fvariant(value) => Some(value),
                        _ => None,
                    }
                }

                fn offset(self, amount: Self, direction: Direction) -> Self {
                    match direction {
                        Direction::Increment => self + amount,
                        Direction::Decrement => self - amount,
                    }
                }
            }
        )*

        impl Number {
            fn wide(self) -> Wide {
                match self {
                    $(Number::$ivariant(value) => Wide::Int(value as i128),)*
                    $(Number::$fvariant(value) => Wide::Float(value as f64),)*
                }
            }

            /// Applies `amount` in this number's own kind.
            pub fn apply(self, amount: Number, direction: Direction) -> Number {
                match self {
                    $(Number::$ivariant(value) => {
                        Number::$ivariant(value.offset(<$int>::cast_from(amount), direction))
                    })*
                    $(Number::$fvariant(value) => {
                        Number::$fvariant(value.offset(<$float>::cast_from(amount), direction))
                    })*
                }
            }

            /// Name of the numeric kind, e.g. `"i32"`.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Number::$ivariant(_) => stringify!($int),)*
                    $(Number::$fvariant(_) => stringify!($float),)*
                }
            }
        }

        impl fmt::Display for Number {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Number::$ivariant(value) => write!(f, "{}", value),)*
                    $(Number::$fvariant(value) => write!(f, "{}", value),)*
                }
            }
        }
    };
}

numeric_kinds!(
    int: i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize,
         u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => Usize ;
    float: f32 => F32, f64 => F64
);

impl Number {
    /// Converts to `N` with `as` semantics (truncating, saturating for float
    /// to integer, NaN to zero).
    pub fn cast<N: Numeric>(self) -> N {
        N::cast_from(self)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::F32(_) | Number::F64(_))
    }
}

/// A stored value the numeric delta can read and write.
///
/// Implemented for [`crate::Value`] and for every primitive numeric type, so
/// both `Cache<Value>` and e.g. `Cache<i64>` support `delta`.
pub trait NumericValue: Sized {
    /// The value as a number, or None if it is not numeric.
    fn to_number(&self) -> Option<Number>;

    /// Builds a value of this type from a number of the same kind.
    fn from_number(number: Number) -> Option<Self>;

    /// Name of the stored type, for error messages.
    fn type_name(&self) -> &'static str;
}

impl<N: Numeric> NumericValue for N {
    fn to_number(&self) -> Option<Number> {
        Some((*self).into())
    }

    fn from_number(number: Number) -> Option<Self> {
        N::exact_from(number)
    }

    fn type_name(&self) -> &'static str {
        Into::<Number>::into(*self).kind()
    }
}
