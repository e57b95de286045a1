//! Built-in type codes
//!
//! The closed set of primitive and structural kinds known to the compiler,
//! with the bidirectional mapping between codes and source spellings.

use std::fmt;

use thiserror::Error;

/// Violation of the type tag contract.
///
/// These never come from user input: the analyzer only asks for spellings of
/// tags it obtained from this module. Seeing one is a compiler bug.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeTagError {
    #[error("unknown type code {0}")]
    UnknownCode(u8),
    #[error("unknown type spelling '{0}'")]
    UnknownSpelling(String),
    #[error("type code {0:?} has no source spelling")]
    NoSpelling(TypeTag),
}

/// Built-in type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    Void = 0,
    I8 = 1,
    I16 = 2,
    I32 = 3,
    I64 = 4,
    U8 = 5,
    U16 = 6,
    U32 = 7,
    U64 = 8,
    Bool = 9,
    Str = 10,
    F32 = 11,
    F64 = 12,
    Any = 13,
    Char = 14,
    /// Identifier placeholder used while a name is being resolved
    Id = 15,
    Func = 16,
    Nil = 17,
    UInt = 18,
    Int = 19,
    Map = 20,
    Voidptr = 21,
    Intptr = 22,
    UIntptr = 23,
    Enum = 24,
    Struct = 25,
}

impl TypeTag {
    /// Every defined tag, in code order
    pub const ALL: [TypeTag; 26] = [
        TypeTag::Void,
        TypeTag::I8,
        TypeTag::I16,
        TypeTag::I32,
        TypeTag::I64,
        TypeTag::U8,
        TypeTag::U16,
        TypeTag::U32,
        TypeTag::U64,
        TypeTag::Bool,
        TypeTag::Str,
        TypeTag::F32,
        TypeTag::F64,
        TypeTag::Any,
        TypeTag::Char,
        TypeTag::Id,
        TypeTag::Func,
        TypeTag::Nil,
        TypeTag::UInt,
        TypeTag::Int,
        TypeTag::Map,
        TypeTag::Voidptr,
        TypeTag::Intptr,
        TypeTag::UIntptr,
        TypeTag::Enum,
        TypeTag::Struct,
    ];

    /// Tags that have a source spelling
    pub const PRIMITIVES: [TypeTag; 21] = [
        TypeTag::Void,
        TypeTag::I8,
        TypeTag::I16,
        TypeTag::I32,
        TypeTag::I64,
        TypeTag::U8,
        TypeTag::U16,
        TypeTag::U32,
        TypeTag::U64,
        TypeTag::Bool,
        TypeTag::Str,
        TypeTag::F32,
        TypeTag::F64,
        TypeTag::Any,
        TypeTag::Char,
        TypeTag::Nil,
        TypeTag::UInt,
        TypeTag::Int,
        TypeTag::Voidptr,
        TypeTag::Intptr,
        TypeTag::UIntptr,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<TypeTag, TypeTagError> {
        TypeTag::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(TypeTagError::UnknownCode(code))
    }

    /// Canonical source spelling
    pub fn spelling(self) -> Result<&'static str, TypeTagError> {
        let s = match self {
            TypeTag::Void => "void",
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::U8 => "u8",
            TypeTag::U16 => "u16",
            TypeTag::U32 => "u32",
            TypeTag::U64 => "u64",
            TypeTag::Bool => "bool",
            TypeTag::Str => "str",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
            TypeTag::Any => "any",
            TypeTag::Char => "char",
            TypeTag::Nil => "nil",
            TypeTag::UInt => "uint",
            TypeTag::Int => "int",
            TypeTag::Voidptr => "voidptr",
            TypeTag::Intptr => "intptr",
            TypeTag::UIntptr => "uintptr",
            TypeTag::Id | TypeTag::Func | TypeTag::Map | TypeTag::Enum | TypeTag::Struct => {
                return Err(TypeTagError::NoSpelling(self));
            }
        };
        Ok(s)
    }

    /// Inverse of [`TypeTag::spelling`]
    pub fn from_spelling(spelling: &str) -> Result<TypeTag, TypeTagError> {
        TypeTag::primitive(spelling)
            .ok_or_else(|| TypeTagError::UnknownSpelling(spelling.to_string()))
    }

    /// Probe a user-written name; `None` means "not a built-in type"
    pub fn primitive(name: &str) -> Option<TypeTag> {
        TypeTag::PRIMITIVES
            .iter()
            .copied()
            .find(|tag| tag.spelling().is_ok_and(|s| s == name))
    }

    /// Name of the prelude definition emitted for this tag.
    ///
    /// Every primitive tag must map to something the prelude defines;
    /// structural kinds are emitted from their descriptors instead.
    pub fn cpp_name(self) -> Result<&'static str, TypeTagError> {
        let s = match self {
            TypeTag::Void => "void",
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::U8 => "u8",
            TypeTag::U16 => "u16",
            TypeTag::U32 => "u32",
            TypeTag::U64 => "u64",
            TypeTag::Bool => "bool",
            TypeTag::Str => "str",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
            TypeTag::Any => "any",
            TypeTag::Char => "rune",
            TypeTag::Nil => "nil_t",
            TypeTag::UInt => "size",
            TypeTag::Int => "ssize",
            TypeTag::Voidptr => "voidptr",
            TypeTag::Intptr => "intptr",
            TypeTag::UIntptr => "uintptr",
            TypeTag::Id | TypeTag::Func | TypeTag::Map | TypeTag::Enum | TypeTag::Struct => {
                return Err(TypeTagError::NoSpelling(self));
            }
        };
        Ok(s)
    }

    pub fn is_primitive(self) -> bool {
        self.spelling().is_ok()
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            TypeTag::I8
                | TypeTag::I16
                | TypeTag::I32
                | TypeTag::I64
                | TypeTag::U8
                | TypeTag::U16
                | TypeTag::U32
                | TypeTag::U64
                | TypeTag::Int
                | TypeTag::UInt
                | TypeTag::Intptr
                | TypeTag::UIntptr
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            TypeTag::I8 | TypeTag::I16 | TypeTag::I32 | TypeTag::I64 | TypeTag::Int | TypeTag::Intptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, TypeTag::F32 | TypeTag::F64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Raw pointer-valued built-ins
    pub fn is_pointer(self) -> bool {
        matches!(self, TypeTag::Voidptr)
    }

    /// Bit width of integer and float tags
    pub fn bits(self) -> Option<u32> {
        match self {
            TypeTag::I8 | TypeTag::U8 => Some(8),
            TypeTag::I16 | TypeTag::U16 => Some(16),
            TypeTag::I32 | TypeTag::U32 | TypeTag::F32 | TypeTag::Char => Some(32),
            TypeTag::I64 | TypeTag::U64 | TypeTag::F64 => Some(64),
            TypeTag::Int | TypeTag::UInt | TypeTag::Intptr | TypeTag::UIntptr => Some(64),
            _ => None,
        }
    }

    /// Whether an integer constant fits this tag
    pub fn fits(self, value: i128) -> bool {
        if self.is_float() {
            return true;
        }
        if !self.is_integer() {
            return false;
        }
        let Some(bits) = self.bits() else {
            return false;
        };
        if self.is_signed() {
            let max = (1i128 << (bits - 1)) - 1;
            (-max - 1..=max).contains(&value)
        } else {
            (0..1i128 << bits).contains(&value)
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spelling() {
            Ok(s) => f.write_str(s),
            Err(_) => match self {
                TypeTag::Id => f.write_str("<id>"),
                TypeTag::Func => f.write_str("<fn>"),
                TypeTag::Map => f.write_str("<map>"),
                TypeTag::Enum => f.write_str("<enum>"),
                _ => f.write_str("<struct>"),
            },
        }
    }
}

/// Spelling of a raw type code
pub fn spelling_of_code(code: u8) -> Result<&'static str, TypeTagError> {
    TypeTag::from_code(code)?.spelling()
}

/// Code of a source spelling
pub fn code_of_spelling(spelling: &str) -> Result<u8, TypeTagError> {
    TypeTag::from_spelling(spelling).map(TypeTag::code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_codes_are_stable() {
        for (i, tag) in TypeTag::ALL.iter().enumerate() {
            assert_eq!(usize::from(tag.code()), i);
            assert_eq!(TypeTag::from_code(tag.code()), Ok(*tag));
        }
        assert_eq!(TypeTag::from_code(26), Err(TypeTagError::UnknownCode(26)));
    }

    #[test]
    fn test_spelling_round_trip() {
        for tag in TypeTag::PRIMITIVES {
            let spelling = tag.spelling().unwrap();
            assert_eq!(TypeTag::from_spelling(spelling), Ok(tag));
            assert_eq!(spelling_of_code(code_of_spelling(spelling).unwrap()), Ok(spelling));
        }
    }

    #[test]
    fn test_spellings_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for tag in TypeTag::PRIMITIVES {
            assert!(seen.insert(tag.spelling().unwrap()));
        }
    }

    #[test]
    fn test_composite_kinds_have_no_spelling() {
        for tag in [TypeTag::Id, TypeTag::Func, TypeTag::Map, TypeTag::Enum, TypeTag::Struct] {
            assert_eq!(tag.spelling(), Err(TypeTagError::NoSpelling(tag)));
            assert!(tag.cpp_name().is_err());
            assert!(!TypeTag::PRIMITIVES.contains(&tag));
        }
    }

    #[test]
    fn test_unknown_spelling_is_contract_error() {
        assert_eq!(
            TypeTag::from_spelling("Point"),
            Err(TypeTagError::UnknownSpelling("Point".to_string()))
        );
        assert_eq!(TypeTag::primitive("Point"), None);
        assert_eq!(TypeTag::primitive("u16"), Some(TypeTag::U16));
    }

    #[test]
    fn test_fits() {
        assert!(TypeTag::U8.fits(255));
        assert!(!TypeTag::U8.fits(256));
        assert!(!TypeTag::U8.fits(-1));
        assert!(TypeTag::I8.fits(-128));
        assert!(!TypeTag::I8.fits(128));
        assert!(TypeTag::I64.fits(i64::MIN.into()));
        assert!(!TypeTag::I64.fits(i128::from(i64::MAX) + 1));
        assert!(!TypeTag::Int.fits(i128::from(i64::MIN) - 1));
        assert!(TypeTag::U64.fits(u64::MAX.into()));
        assert!(!TypeTag::U64.fits(i128::from(u64::MAX) + 1));
        assert!(!TypeTag::UInt.fits(-1));
        assert!(TypeTag::F32.fits(3));
        assert!(!TypeTag::Bool.fits(1));
    }
}
