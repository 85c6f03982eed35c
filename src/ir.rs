//! Token IR
//!
//! A schema is described to the runtime as a flat list of [`Token`]s, in the
//! form produced by an SBE schema parser. Every structural element of a
//! message is bracketed by a `Begin*`/`End*` pair of [`Signal`]s, and leaf
//! values are described by [`Signal::Encoding`] tokens.
//!
//! This module only models the IR and offers the small set of helpers that
//! [`crate::layout`] and the `from_tokens` constructors use to walk it.
//! Parsing a schema into tokens happens elsewhere.

use lazy_static::lazy_static;

use crate::error::{LayoutError, LayoutResult};
use crate::prim::{ByteOrder, PrimitiveType, UintField, UintType};

#[cfg(feature = "serde_impls")]
use serde::Serialize;

/// Structural role of a token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub enum Signal {
    BeginMessage,
    EndMessage,
    BeginComposite,
    EndComposite,
    BeginField,
    EndField,
    BeginGroup,
    EndGroup,
    BeginEnum,
    ValidValue,
    EndEnum,
    BeginSet,
    Choice,
    EndSet,
    BeginVarData,
    EndVarData,
    Encoding,
}

impl Signal {
    /// Returns the signal that closes a construct opened by `self`, if any
    #[must_use]
    pub const fn closing(self) -> Option<Signal> {
        match self {
            Signal::BeginMessage => Some(Signal::EndMessage),
            Signal::BeginComposite => Some(Signal::EndComposite),
            Signal::BeginField => Some(Signal::EndField),
            Signal::BeginGroup => Some(Signal::EndGroup),
            Signal::BeginEnum => Some(Signal::EndEnum),
            Signal::BeginSet => Some(Signal::EndSet),
            Signal::BeginVarData => Some(Signal::EndVarData),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub enum Presence {
    #[default]
    Required,
    Optional,
    Constant,
}

/// Literal value attached to an encoding: a null, constant, valid value, or
/// choice bit position.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub enum PrimitiveValue {
    Long(i64),
    ULong(u64),
    Double(f64),
    Bytes(Vec<u8>),
}

impl PrimitiveValue {
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            PrimitiveValue::Long(x) => Some(x),
            PrimitiveValue::ULong(x) => i64::try_from(x).ok(),
            PrimitiveValue::Bytes(ref b) if b.len() == 1 => Some(i64::from(b[0])),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            PrimitiveValue::Long(x) => u64::try_from(x).ok(),
            PrimitiveValue::ULong(x) => Some(x),
            PrimitiveValue::Bytes(ref b) if b.len() == 1 => Some(u64::from(b[0])),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            PrimitiveValue::Double(x) => Some(x),
            PrimitiveValue::Long(x) => Some(x as f64),
            PrimitiveValue::ULong(x) => Some(x as f64),
            PrimitiveValue::Bytes(_) => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PrimitiveValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }
}

/// Conversion from an IR literal into a concrete primitive
pub trait FromValue: Sized {
    fn from_value(value: &PrimitiveValue) -> Option<Self>;
}

macro_rules! from_value_int {
    ( $( $t:ty ),+ ) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &PrimitiveValue) -> Option<Self> {
                    match *value {
                        PrimitiveValue::Long(x) => <$t>::try_from(x).ok(),
                        PrimitiveValue::ULong(x) => <$t>::try_from(x).ok(),
                        PrimitiveValue::Bytes(ref b) if b.len() == 1 => <$t>::try_from(b[0]).ok(),
                        _ => None,
                    }
                }
            }
        )+
    };
}

from_value_int!(u8, i8, u16, i16, u32, i32, u64, i64);

impl FromValue for f32 {
    fn from_value(value: &PrimitiveValue) -> Option<Self> {
        value.as_f64().map(|x| x as f32)
    }
}

impl FromValue for f64 {
    fn from_value(value: &PrimitiveValue) -> Option<Self> {
        value.as_f64()
    }
}

/// Encoding of a token's value
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct Encoding {
    pub primitive_type: Option<PrimitiveType>,
    pub byte_order: ByteOrder,
    pub presence: Presence,
    pub null_value: Option<PrimitiveValue>,
    pub const_value: Option<PrimitiveValue>,
    pub character_encoding: Option<String>,
}

impl Encoding {
    #[must_use]
    pub fn new(primitive_type: PrimitiveType) -> Self {
        Self {
            primitive_type: Some(primitive_type),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    #[must_use]
    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    #[must_use]
    pub fn with_null(mut self, null_value: PrimitiveValue) -> Self {
        self.null_value = Some(null_value);
        self
    }

    /// Sets the constant value, marking the encoding [`Presence::Constant`]
    #[must_use]
    pub fn with_const(mut self, const_value: PrimitiveValue) -> Self {
        self.presence = Presence::Constant;
        self.const_value = Some(const_value);
        self
    }

    /// Sets the value of a `ValidValue` or `Choice` token without changing
    /// its presence
    #[must_use]
    pub fn with_value(mut self, value: PrimitiveValue) -> Self {
        self.const_value = Some(value);
        self
    }

    #[must_use]
    pub fn with_character_encoding(mut self, character_encoding: impl Into<String>) -> Self {
        self.character_encoding = Some(character_encoding.into());
        self
    }
}

/// Single element of the IR
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct Token {
    pub signal: Signal,
    pub name: String,
    pub schema_id: u16,
    pub version: u16,
    pub offset: usize,
    pub size: usize,
    pub encoding: Encoding,
}

impl Token {
    #[must_use]
    pub fn new(signal: Signal, name: impl Into<String>) -> Self {
        Self {
            signal,
            name: name.into(),
            schema_id: 0,
            version: 0,
            offset: 0,
            size: 0,
            encoding: Encoding::default(),
        }
    }

    /// Shorthand for an [`Signal::Encoding`] token of a single primitive
    #[must_use]
    pub fn primitive(name: impl Into<String>, ty: PrimitiveType, offset: usize) -> Self {
        Self::new(Signal::Encoding, name)
            .at(offset)
            .sized(ty.size())
            .encoded(Encoding::new(ty))
    }

    #[must_use]
    pub fn with_id(mut self, schema_id: u16) -> Self {
        self.schema_id = schema_id;
        self
    }

    #[must_use]
    pub fn since(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn sized(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn encoded(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Number of primitive elements encoded by this token: `1` for scalars
    /// and non-primitive tokens
    #[must_use]
    pub fn array_length(&self) -> usize {
        match self.encoding.primitive_type {
            Some(ty) if self.size != 0 => self.size / ty.size(),
            _ => 1,
        }
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.encoding.presence == Presence::Constant
    }
}

pub(crate) fn expect_signal(token: &Token, index: usize, expected: Signal) -> LayoutResult<()> {
    if token.signal == expected {
        Ok(())
    } else {
        Err(LayoutError::UnexpectedSignal {
            index,
            expected,
            found: token.signal,
        })
    }
}

/// Returns the index of the token closing the construct opened at `start`.
pub(crate) fn find_end(
    tokens: &[Token],
    start: usize,
    begin: Signal,
    end: Signal,
) -> LayoutResult<usize> {
    let first = tokens
        .get(start)
        .ok_or(LayoutError::UnexpectedEnd { expected: begin })?;
    expect_signal(first, start, begin)?;
    let mut depth = 0usize;
    for (ix, token) in tokens.iter().enumerate().skip(start) {
        if token.signal == begin {
            depth += 1;
        } else if token.signal == end {
            depth -= 1;
            if depth == 0 {
                return Ok(ix);
            }
        }
    }
    Err(LayoutError::UnexpectedEnd { expected: end })
}

/// Splits a complete composite token list into its opening token and
/// its members.
pub(crate) fn split_composite(tokens: &[Token]) -> LayoutResult<(&Token, &[Token])> {
    let end = find_end(tokens, 0, Signal::BeginComposite, Signal::EndComposite)?;
    Ok((&tokens[0], &tokens[1..end]))
}

/// Finds the unsigned encoding member `name` of a composite.
pub(crate) fn uint_member(
    composite: &Token,
    members: &[Token],
    name: &'static str,
) -> LayoutResult<UintField> {
    let token = members
        .iter()
        .find(|t| t.signal == Signal::Encoding && t.name == name)
        .ok_or_else(|| LayoutError::MissingMember {
            composite: composite.name.clone(),
            member: name,
        })?;
    let ty = uint_type(token)?;
    Ok(UintField::new(token.offset, ty, token.encoding.byte_order))
}

pub(crate) fn uint_type(token: &Token) -> LayoutResult<UintType> {
    let ty = token
        .encoding
        .primitive_type
        .ok_or_else(|| LayoutError::MissingPrimitiveType {
            name: token.name.clone(),
        })?;
    UintType::from_primitive(ty).ok_or_else(|| LayoutError::UnsupportedWidth {
        name: token.name.clone(),
        ty,
    })
}

fn composite(name: &str, size: usize, members: Vec<Token>) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(members.len() + 2);
    tokens.push(Token::new(Signal::BeginComposite, name).sized(size));
    tokens.extend(members);
    tokens.push(Token::new(Signal::EndComposite, name).sized(size));
    tokens
}

lazy_static! {
    /// Token list of the standard `messageHeader` composite
    pub static ref MESSAGE_HEADER: Vec<Token> = composite(
        "messageHeader",
        8,
        vec![
            Token::primitive("blockLength", PrimitiveType::Uint16, 0),
            Token::primitive("templateId", PrimitiveType::Uint16, 2),
            Token::primitive("schemaId", PrimitiveType::Uint16, 4),
            Token::primitive("version", PrimitiveType::Uint16, 6),
        ],
    );

    /// Token list of the standard `groupSizeEncoding` composite
    pub static ref GROUP_SIZE_ENCODING: Vec<Token> = composite(
        "groupSizeEncoding",
        4,
        vec![
            Token::primitive("blockLength", PrimitiveType::Uint16, 0),
            Token::primitive("numInGroup", PrimitiveType::Uint16, 2),
        ],
    );

    /// Token list of the standard `varDataEncoding` composite, whose data
    /// member has no fixed size
    pub static ref VAR_DATA_ENCODING: Vec<Token> = composite(
        "varDataEncoding",
        0,
        vec![
            Token::primitive("length", PrimitiveType::Uint32, 0),
            Token::new(Signal::Encoding, "varData")
                .at(4)
                .encoded(Encoding::new(PrimitiveType::Uint8).with_character_encoding("UTF-8")),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_length() {
        let t = Token::primitive("vin", PrimitiveType::Char, 0).sized(17);
        assert_eq!(t.array_length(), 17);
        assert_eq!(Token::new(Signal::BeginGroup, "g").array_length(), 1);
        assert_eq!(
            Token::primitive("x", PrimitiveType::Int32, 0).array_length(),
            1
        );
    }

    #[test]
    fn nested_constructs_are_matched() {
        let tokens = vec![
            Token::new(Signal::BeginComposite, "outer"),
            Token::new(Signal::BeginComposite, "inner"),
            Token::new(Signal::EndComposite, "inner"),
            Token::new(Signal::EndComposite, "outer"),
        ];
        assert_eq!(
            find_end(&tokens, 0, Signal::BeginComposite, Signal::EndComposite).unwrap(),
            3
        );
        assert_eq!(
            find_end(&tokens[..3], 0, Signal::BeginComposite, Signal::EndComposite),
            Err(LayoutError::UnexpectedEnd {
                expected: Signal::EndComposite
            })
        );
    }

    #[test]
    fn standard_composites() {
        let (begin, members) = split_composite(&MESSAGE_HEADER).unwrap();
        assert_eq!(begin.size, 8);
        assert_eq!(
            uint_member(begin, members, "schemaId").unwrap(),
            UintField::new(4, UintType::U16, ByteOrder::LittleEndian)
        );
        assert!(matches!(
            uint_member(begin, members, "numInGroup"),
            Err(LayoutError::MissingMember { .. })
        ));
        assert_eq!(VAR_DATA_ENCODING[2].encoding.character_encoding.as_deref(), Some("UTF-8"));
        assert_eq!(Signal::BeginSet.closing(), Some(Signal::EndSet));
    }

    #[test]
    fn literal_conversions() {
        assert_eq!(u8::from_value(&PrimitiveValue::Bytes(vec![b'A'])), Some(65));
        assert_eq!(i8::from_value(&PrimitiveValue::Long(300)), None);
        assert_eq!(f32::from_value(&PrimitiveValue::Double(1.5)), Some(1.5));
        assert_eq!(PrimitiveValue::ULong(7).as_i64(), Some(7));
    }
}
