//! Packed record layouts and byte-order inference
//!
//! A [`Layout`] describes one fixed-width struct as it appears on disk: an
//! ordered list of named primitive fields with no alignment padding. Every
//! header and payload shape in the trace formats is a `const` layout.
//!
//! Trace files carry no byte-order marker. [`infer_byte_order`] decodes the
//! first header under each candidate order and accepts the first one whose
//! `sample_size` field names a known payload width that fits in the file.

use crate::types::{ByteOrder, FieldType, Value};

/// One named field of a packed layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

impl Field {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// Fixed-width packed struct layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    name: &'static str,
    fields: &'static [Field],
    size: usize,
}

impl Layout {
    pub const fn new(name: &'static str, fields: &'static [Field]) -> Self {
        let mut size = 0;
        let mut i = 0;
        while i < fields.len() {
            size += fields[i].ty.size_bytes();
            i += 1;
        }
        Self { name, fields, size }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }

    /// Total width in bytes
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Decode the layout at `offset`
    ///
    /// Returns `None` if the buffer does not hold the whole struct.
    pub fn decode(&self, content: &[u8], offset: usize, order: ByteOrder) -> Option<Vec<Value>> {
        let end = offset.checked_add(self.size)?;
        let mut bytes = content.get(offset..end)?;
        let mut values = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            values.push(field.ty.decode(bytes, order)?);
            bytes = &bytes[field.ty.size_bytes()..];
        }
        Some(values)
    }
}

/// Check that a `sample_size` extracted from a header is plausible
///
/// True iff the size is positive, belongs to the format's known payload
/// widths, and does not exceed the bytes left after the header.
pub fn valid_sample_size(sample_size: i64, remaining: usize, known_sizes: &[usize]) -> bool {
    let Ok(size) = usize::try_from(sample_size) else {
        return false;
    };
    size > 0 && known_sizes.contains(&size) && size <= remaining
}

/// Guess the byte order of a trace from its first header
///
/// Little-endian is tried before big-endian. A candidate that cannot decode
/// the header, or whose discriminator is not an integer, simply fails. If no
/// candidate validates (or `content` is empty) the host order is returned.
pub fn infer_byte_order(
    header: &Layout,
    discriminator_index: usize,
    content: &[u8],
    known_sizes: &[usize],
) -> ByteOrder {
    if content.is_empty() {
        return ByteOrder::NATIVE;
    }

    for order in ByteOrder::CANDIDATES {
        if content.len() < header.size() {
            continue;
        }

        let sample_size = header
            .decode(content, 0, order)
            .and_then(|values| values.get(discriminator_index).and_then(Value::as_i64));

        if let Some(sample_size) = sample_size {
            let remaining = content.len() - header.size();
            if valid_sample_size(sample_size, remaining, known_sizes) {
                tracing::debug!(
                    "Inferred {} from header '{}' (sample_size={})",
                    order,
                    header.name(),
                    sample_size
                );
                return order;
            }
        }
    }

    tracing::debug!(
        "Could not infer byte order for header '{}', using {}",
        header.name(),
        ByteOrder::NATIVE
    );
    ByteOrder::NATIVE
}
