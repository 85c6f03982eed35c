//! Runtime descriptors derived from the token IR
//!
//! A generated codec hard-codes the offsets, widths and versions of every
//! field it accesses. [`MessageLayout::from_tokens`] derives the same
//! information from a message's token list at runtime, in the shape the
//! flyweights consume it: a [`Template`], the root-block fields, the
//! repeating groups (nested to any depth) and the var-data sections, in
//! schema order.
//!
//! The token list must be well formed. Beyond locating the tokens it needs
//! and checking that every choice bit fits its set, this pass performs no
//! validation of the schema.

use crate::bitset::{BitRepr, Choice};
use crate::enumeration::SbeEnum;
use crate::error::{LayoutError, LayoutResult};
use crate::field::{ArrayField, BitSetField, CompositeField, ConstField, EnumField, Field};
use crate::group::GroupLayout;
use crate::ir::{expect_signal, find_end, split_composite, uint_type, FromValue, PrimitiveValue, Signal, Token};
use crate::message::Template;
use crate::prim::{ByteOrder, Primitive, PrimitiveType, CHAR_NULL};
use crate::vardata::VarDataField;

#[cfg(feature = "serde_impls")]
use serde::Serialize;

/// Returns `true` if a value of primitive type `ty` is carried by `T`
fn carries<T: Primitive>(ty: PrimitiveType) -> bool {
    ty == T::PRIMITIVE_TYPE || (ty == PrimitiveType::Char && T::PRIMITIVE_TYPE == PrimitiveType::Uint8)
}

fn primitive_type(token: &Token) -> LayoutResult<PrimitiveType> {
    token
        .encoding
        .primitive_type
        .ok_or_else(|| LayoutError::MissingPrimitiveType {
            name: token.name.clone(),
        })
}

/// Encoding-specific part of a field
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub enum FieldKind {
    /// Single primitive (`array_length == 1`) or fixed-length array
    Primitive {
        ty: PrimitiveType,
        byte_order: ByteOrder,
        array_length: usize,
        null_value: Option<PrimitiveValue>,
        character_encoding: Option<String>,
    },
    Constant {
        ty: PrimitiveType,
        value: PrimitiveValue,
    },
    Enum {
        ty: PrimitiveType,
        byte_order: ByteOrder,
        null_value: Option<PrimitiveValue>,
        values: Vec<(String, PrimitiveValue)>,
    },
    Set {
        ty: PrimitiveType,
        byte_order: ByteOrder,
        choices: Vec<(String, Choice)>,
    },
    Composite {
        size: usize,
        members: Vec<FieldLayout>,
    },
}

/// Field of a message, group element or composite
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct FieldLayout {
    pub name: String,
    pub schema_id: u16,
    pub offset: usize,
    pub since_version: u16,
    pub kind: FieldKind,
}

impl FieldLayout {
    /// Reads a field from a token list running from its `BeginField` to its
    /// `EndField` token.
    pub fn from_tokens(tokens: &[Token]) -> LayoutResult<Self> {
        let field_end = find_end(tokens, 0, Signal::BeginField, Signal::EndField)?;
        let tokens = &tokens[..=field_end];
        let begin = &tokens[0];
        let type_token = tokens.get(1).ok_or(LayoutError::UnexpectedEnd {
            expected: Signal::Encoding,
        })?;
        let kind = match type_token.signal {
            Signal::Encoding => Self::encoding_kind(type_token)?,
            Signal::BeginEnum => {
                let end = find_end(tokens, 1, Signal::BeginEnum, Signal::EndEnum)?;
                FieldKind::Enum {
                    ty: primitive_type(type_token)?,
                    byte_order: type_token.encoding.byte_order,
                    null_value: type_token.encoding.null_value.clone(),
                    values: tokens[2..end]
                        .iter()
                        .filter(|t| t.signal == Signal::ValidValue)
                        .map(|t| {
                            t.encoding
                                .const_value
                                .clone()
                                .map(|v| (t.name.clone(), v))
                                .ok_or_else(|| LayoutError::MissingConstValue {
                                    name: t.name.clone(),
                                })
                        })
                        .collect::<LayoutResult<_>>()?,
                }
            }
            Signal::BeginSet => {
                let end = find_end(tokens, 1, Signal::BeginSet, Signal::EndSet)?;
                let ty = primitive_type(type_token)?;
                let bits = ty.size() * 8;
                FieldKind::Set {
                    ty,
                    byte_order: type_token.encoding.byte_order,
                    choices: tokens[2..end]
                        .iter()
                        .filter(|t| t.signal == Signal::Choice)
                        .map(|t| -> LayoutResult<(String, Choice)> {
                            let bit = t
                                .encoding
                                .const_value
                                .as_ref()
                                .and_then(PrimitiveValue::as_u64)
                                .ok_or_else(|| LayoutError::MissingConstValue {
                                    name: t.name.clone(),
                                })?;
                            match u8::try_from(bit) {
                                Ok(b) if usize::from(b) < bits => {
                                    Ok((t.name.clone(), Choice::versioned(b, t.version)))
                                }
                                _ => Err(LayoutError::ChoiceOutOfRange {
                                    name: t.name.clone(),
                                    bit,
                                    bits,
                                }),
                            }
                        })
                        .collect::<LayoutResult<_>>()?,
                }
            }
            Signal::BeginComposite => {
                let end = find_end(tokens, 1, Signal::BeginComposite, Signal::EndComposite)?;
                let (outer, members) = split_composite(&tokens[1..=end])?;
                FieldKind::Composite {
                    size: outer.size,
                    members: members
                        .iter()
                        .enumerate()
                        .map(|(ix, t)| {
                            expect_signal(t, ix + 2, Signal::Encoding)?;
                            Ok(FieldLayout {
                                name: t.name.clone(),
                                schema_id: t.schema_id,
                                offset: t.offset,
                                since_version: t.version,
                                kind: Self::encoding_kind(t)?,
                            })
                        })
                        .collect::<LayoutResult<_>>()?,
                }
            }
            found => {
                return Err(LayoutError::UnexpectedSignal {
                    index: 1,
                    expected: Signal::Encoding,
                    found,
                })
            }
        };
        Ok(Self {
            name: begin.name.clone(),
            schema_id: begin.schema_id,
            offset: type_token.offset,
            since_version: type_token.version,
            kind,
        })
    }

    fn encoding_kind(token: &Token) -> LayoutResult<FieldKind> {
        let ty = primitive_type(token)?;
        if token.is_constant() {
            let value = token
                .encoding
                .const_value
                .clone()
                .ok_or_else(|| LayoutError::MissingConstValue {
                    name: token.name.clone(),
                })?;
            return Ok(FieldKind::Constant { ty, value });
        }
        Ok(FieldKind::Primitive {
            ty,
            byte_order: token.encoding.byte_order,
            array_length: token.array_length(),
            null_value: token.encoding.null_value.clone(),
            character_encoding: token.encoding.character_encoding.clone(),
        })
    }

    /// Returns a scalar descriptor if this field is a single value carried
    /// by `T`. The absent-value is the schema's `nullValue` if declared.
    #[must_use]
    pub fn field<T: Primitive + FromValue>(&self) -> Option<Field<T>> {
        match self.kind {
            FieldKind::Primitive {
                ty,
                byte_order,
                array_length: 1,
                ref null_value,
                ..
            } if carries::<T>(ty) => {
                let null = match null_value {
                    Some(v) => T::from_value(v)?,
                    None if ty == PrimitiveType::Char => {
                        T::from_value(&PrimitiveValue::ULong(u64::from(CHAR_NULL)))?
                    }
                    None => T::NULL,
                };
                Some(Field::with_null(
                    self.offset,
                    byte_order,
                    self.since_version,
                    null,
                ))
            }
            _ => None,
        }
    }

    /// Returns an array descriptor if this field is an array of exactly `N`
    /// elements carried by `T`.
    #[must_use]
    pub fn array<T: Primitive + FromValue, const N: usize>(&self) -> Option<ArrayField<T, N>> {
        match self.kind {
            FieldKind::Primitive {
                ty,
                byte_order,
                array_length,
                ref null_value,
                ..
            } if carries::<T>(ty) && array_length == N => {
                let mut field = ArrayField::new(self.offset, byte_order, self.since_version);
                if let Some(v) = null_value {
                    field.null = T::from_value(v)?;
                } else if ty == PrimitiveType::Char {
                    field.null = T::from_value(&PrimitiveValue::ULong(u64::from(CHAR_NULL)))?;
                }
                Some(field)
            }
            _ => None,
        }
    }

    /// Character encoding of a `char` array
    #[must_use]
    pub fn character_encoding(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Primitive {
                character_encoding, ..
            } => character_encoding.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn constant<T: Primitive + FromValue>(&self) -> Option<ConstField<T>> {
        match &self.kind {
            FieldKind::Constant { ty, value } if carries::<T>(*ty) => {
                T::from_value(value).map(ConstField::new)
            }
            _ => None,
        }
    }

    /// Literal of a constant `char` array
    #[must_use]
    pub fn constant_bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            FieldKind::Constant { value, .. } => value.as_bytes(),
            _ => None,
        }
    }

    #[must_use]
    pub fn enum_field<E: SbeEnum>(&self) -> Option<EnumField<E>> {
        match self.kind {
            FieldKind::Enum { ty, byte_order, .. } if carries::<E::Repr>(ty) => {
                Some(EnumField::new(self.offset, byte_order, self.since_version))
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn bit_set<R: BitRepr>(&self) -> Option<BitSetField<R>> {
        match self.kind {
            FieldKind::Set { ty, byte_order, .. } if carries::<R>(ty) => {
                Some(BitSetField::new(self.offset, byte_order, self.since_version))
            }
            _ => None,
        }
    }

    /// Looks up a choice of a bit set by name
    #[must_use]
    pub fn choice(&self, name: &str) -> Option<Choice> {
        match &self.kind {
            FieldKind::Set { choices, .. } => choices
                .iter()
                .find(|(n, _)| n == name)
                .map(|&(_, choice)| choice),
            _ => None,
        }
    }

    #[must_use]
    pub fn composite(&self) -> Option<CompositeField> {
        match self.kind {
            FieldKind::Composite { size, .. } => {
                Some(CompositeField::new(self.offset, size, self.since_version))
            }
            _ => None,
        }
    }

    /// Looks up a member of a composite by name
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&FieldLayout> {
        match &self.kind {
            FieldKind::Composite { members, .. } => members.iter().find(|m| m.name == name),
            _ => None,
        }
    }
}

/// Var-data section of a message or group
///
/// The data member's character encoding is kept here as an owned string;
/// `field.character_encoding` is always `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct VarDataLayout {
    pub name: String,
    pub schema_id: u16,
    pub field: VarDataField,
    pub character_encoding: Option<String>,
}

impl VarDataLayout {
    /// Reads a section from a token list running from its `BeginVarData` to
    /// its `EndVarData` token. The composite that follows `BeginVarData`
    /// holds the length member first and the data member second.
    pub fn from_tokens(tokens: &[Token]) -> LayoutResult<Self> {
        let begin = tokens.first().ok_or(LayoutError::UnexpectedEnd {
            expected: Signal::BeginVarData,
        })?;
        expect_signal(begin, 0, Signal::BeginVarData)?;
        let (_, members) = split_composite(&tokens[1..])?;
        let length = members.first().ok_or(LayoutError::UnexpectedEnd {
            expected: Signal::Encoding,
        })?;
        expect_signal(length, 2, Signal::Encoding)?;
        let character_encoding = members
            .get(1)
            .and_then(|data| data.encoding.character_encoding.clone());
        Ok(Self {
            name: begin.name.clone(),
            schema_id: begin.schema_id,
            field: VarDataField::new(
                uint_type(length)?,
                length.encoding.byte_order,
                begin.version,
                None,
            ),
            character_encoding,
        })
    }
}

/// Repeating group together with its own fields, nested groups and var-data
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct GroupNode {
    pub name: String,
    pub schema_id: u16,
    pub layout: GroupLayout,
    pub fields: Vec<FieldLayout>,
    pub groups: Vec<GroupNode>,
    pub var_data: Vec<VarDataLayout>,
}

impl GroupNode {
    /// Reads a group from a token list running from its `BeginGroup` to its
    /// `EndGroup` token.
    pub fn from_tokens(tokens: &[Token]) -> LayoutResult<Self> {
        let end = find_end(tokens, 0, Signal::BeginGroup, Signal::EndGroup)?;
        let tokens = &tokens[..=end];
        let layout = GroupLayout::from_tokens(tokens)?;
        let dims_end = find_end(tokens, 1, Signal::BeginComposite, Signal::EndComposite)?;
        let Members {
            fields,
            groups,
            var_data,
        } = Members::collect(&tokens[dims_end + 1..end])?;
        Ok(Self {
            name: tokens[0].name.clone(),
            schema_id: tokens[0].schema_id,
            layout,
            fields,
            groups,
            var_data,
        })
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&GroupNode> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Members of a message body or group element, in schema order
struct Members {
    fields: Vec<FieldLayout>,
    groups: Vec<GroupNode>,
    var_data: Vec<VarDataLayout>,
}

impl Members {
    fn collect(tokens: &[Token]) -> LayoutResult<Self> {
        let mut members = Members {
            fields: Vec::new(),
            groups: Vec::new(),
            var_data: Vec::new(),
        };
        let mut ix = 0;
        while let Some(token) = tokens.get(ix) {
            let end = match token.signal {
                Signal::BeginField => {
                    let end = find_end(tokens, ix, Signal::BeginField, Signal::EndField)?;
                    members.fields.push(FieldLayout::from_tokens(&tokens[ix..=end])?);
                    end
                }
                Signal::BeginGroup => {
                    let end = find_end(tokens, ix, Signal::BeginGroup, Signal::EndGroup)?;
                    members.groups.push(GroupNode::from_tokens(&tokens[ix..=end])?);
                    end
                }
                Signal::BeginVarData => {
                    let end = find_end(tokens, ix, Signal::BeginVarData, Signal::EndVarData)?;
                    members.var_data.push(VarDataLayout::from_tokens(&tokens[ix..=end])?);
                    end
                }
                found => {
                    return Err(LayoutError::UnexpectedSignal {
                        index: ix,
                        expected: Signal::BeginField,
                        found,
                    })
                }
            };
            ix = end + 1;
        }
        Ok(members)
    }
}

/// Complete runtime description of one message type
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize))]
pub struct MessageLayout {
    pub name: String,
    pub template: Template,
    pub fields: Vec<FieldLayout>,
    pub groups: Vec<GroupNode>,
    pub var_data: Vec<VarDataLayout>,
}

impl MessageLayout {
    /// Reads a message from a token list running from its `BeginMessage` to
    /// its `EndMessage` token.
    ///
    /// The template's schema id is left at `0`, as it belongs to the schema
    /// rather than to the message; see [`MessageLayout::with_schema_id`].
    pub fn from_tokens(tokens: &[Token]) -> LayoutResult<Self> {
        let end = find_end(tokens, 0, Signal::BeginMessage, Signal::EndMessage)?;
        let begin = &tokens[0];
        let block_length =
            u16::try_from(begin.size).map_err(|_| LayoutError::OversizedBlock {
                name: begin.name.clone(),
                size: begin.size,
            })?;
        let Members {
            fields,
            groups,
            var_data,
        } = Members::collect(&tokens[1..end])?;
        tracing::debug!(
            message = %begin.name,
            fields = fields.len(),
            groups = groups.len(),
            var_data = var_data.len(),
            "derived message layout"
        );
        Ok(Self {
            name: begin.name.clone(),
            template: Template::new(begin.schema_id, 0, begin.version, block_length),
            fields,
            groups,
            var_data,
        })
    }

    #[must_use]
    pub fn with_schema_id(mut self, schema_id: u16) -> Self {
        self.template.schema_id = schema_id;
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&GroupNode> {
        self.groups.iter().find(|g| g.name == name)
    }

    #[must_use]
    pub fn var_data(&self, name: &str) -> Option<&VarDataLayout> {
        self.var_data.iter().find(|v| v.name == name)
    }
}
