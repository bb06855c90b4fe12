//! Generic header + payload record walker
//!
//! Every trace format is a flat sequence of records: a fixed header whose
//! `sample_size` field (the discriminator) tells which payload follows. The
//! [`RecordReader`] owns the walking loop; formats plug in one
//! [`PayloadHandler`] per payload width.
//!
//! The walk never fails. An unregistered discriminator, a handler that
//! rejects its record, or a trailing partial record all end the walk, and
//! whatever was decoded up to that point is returned.

use std::collections::BTreeMap;

use crate::error::{Result, TraceError};
use crate::frame::{validate_time_columns, Frame};
use crate::schema::Layout;
use crate::types::{ByteOrder, Value};

/// Decoded output of one record
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Collection the rows belong to (e.g. `"pe"`)
    pub label: String,
    pub frame: Frame,
    /// Columns of `frame` that must hold finite times
    pub time_columns: Vec<String>,
}

/// What a handler did with one record
#[derive(Debug, Clone)]
pub struct Step {
    /// Cursor position after the payload
    pub offset: usize,
    pub fragment: Option<Fragment>,
}

/// Interprets the payload at `offset` given the already decoded header
///
/// Returning `None` halts the walk (e.g. the payload is cut short).
pub type PayloadHandler = Box<dyn Fn(&[u8], usize, &[Value]) -> Option<Step> + Send + Sync>;

struct Registered {
    name: String,
    handler: PayloadHandler,
}

/// Walks a buffer of header + payload records
pub struct RecordReader {
    header: Layout,
    discriminator_index: usize,
    byte_order: ByteOrder,
    handlers: BTreeMap<usize, Registered>,
    priorities: Vec<usize>,
}

impl std::fmt::Debug for RecordReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordReader")
            .field("header", &self.header.name())
            .field("discriminator_index", &self.discriminator_index)
            .field("byte_order", &self.byte_order)
            .field("payload_widths", &self.priorities)
            .finish()
    }
}

impl RecordReader {
    /// Create a reader for `header`, dispatching on the field at `discriminator_index`
    pub fn new(header: Layout, discriminator_index: usize, byte_order: ByteOrder) -> Result<Self> {
        let valid = header
            .fields()
            .get(discriminator_index)
            .is_some_and(|f| f.ty.is_integer());
        if !valid {
            return Err(TraceError::InvalidDiscriminatorIndex {
                index: discriminator_index,
                layout: header.name(),
            });
        }

        Ok(Self {
            header,
            discriminator_index,
            byte_order,
            handlers: BTreeMap::new(),
            priorities: Vec::new(),
        })
    }

    /// Register the handler for payloads of `width` bytes
    ///
    /// Widths must be unique within a format; a second registration for the
    /// same width is rejected since dispatch would be ambiguous.
    pub fn register(
        mut self,
        width: usize,
        name: impl Into<String>,
        handler: PayloadHandler,
    ) -> Result<Self> {
        let name = name.into();
        if let Some(existing) = self.handlers.get(&width) {
            return Err(TraceError::DuplicatePayloadWidth {
                width,
                existing: existing.name.clone(),
                duplicate: name,
            });
        }
        self.handlers.insert(width, Registered { name, handler });
        self.priorities.push(width);
        Ok(self)
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Walk `content` and collect one table per fragment label
    pub fn read(&self, content: &[u8]) -> BTreeMap<String, Frame> {
        let header_size = self.header.size();
        let mut collected: BTreeMap<String, (Vec<Frame>, Vec<String>)> = BTreeMap::new();
        let mut offset = 0usize;
        let mut records = 0usize;

        while content.len() - offset >= header_size {
            let Some(header) = self.header.decode(content, offset, self.byte_order) else {
                break;
            };
            offset += header_size;

            let sample_size = header[self.discriminator_index].as_i64().unwrap_or(-1);
            let registered = usize::try_from(sample_size)
                .ok()
                .and_then(|w| self.handlers.get(&w));
            let Some(registered) = registered else {
                tracing::warn!(
                    "Stopping parse due to invalid payload size: size={}, remaining={}",
                    sample_size,
                    content.len() - offset
                );
                break;
            };

            let step = match (registered.handler)(content, offset, &header) {
                Some(step) if step.offset >= offset && step.offset <= content.len() => step,
                _ => {
                    tracing::warn!(
                        "Stopping parse: '{}' payload rejected at offset {} (size={}, remaining={})",
                        registered.name,
                        offset,
                        sample_size,
                        content.len() - offset
                    );
                    break;
                }
            };

            offset = step.offset;
            records += 1;
            if let Some(fragment) = step.fragment {
                let entry = collected.entry(fragment.label).or_default();
                entry.0.push(fragment.frame);
                for col in fragment.time_columns {
                    if !entry.1.contains(&col) {
                        entry.1.push(col);
                    }
                }
            }
        }

        tracing::debug!(
            "Walked {} '{}' records, {} of {} bytes consumed",
            records,
            self.header.name(),
            offset,
            content.len()
        );

        collected
            .into_iter()
            .map(|(label, (frames, time_columns))| {
                let columns: Vec<&str> = time_columns.iter().map(String::as_str).collect();
                let frame = validate_time_columns(Frame::concat(frames), &columns);
                (label, frame)
            })
            .collect()
    }
}

/// Standard handler: decode `payload` and append selected header fields
///
/// `header_columns` lists `(header field index, output column name)` pairs
/// appended after the payload fields. `time_columns` names the output columns
/// that must hold finite times. The handler halts the walk if the buffer does
/// not hold the whole payload.
pub fn payload_handler(
    label: &str,
    payload: Layout,
    byte_order: ByteOrder,
    header_columns: &[(usize, &'static str)],
    time_columns: &[&'static str],
) -> PayloadHandler {
    let label = label.to_string();
    let header_columns = header_columns.to_vec();
    let columns: Vec<String> = payload
        .field_names()
        .chain(header_columns.iter().map(|(_, name)| *name))
        .map(str::to_string)
        .collect();
    let time_columns: Vec<String> = time_columns.iter().map(|c| c.to_string()).collect();

    Box::new(move |content: &[u8], offset: usize, header: &[Value]| {
        let mut row = payload.decode(content, offset, byte_order)?;
        for (idx, _) in &header_columns {
            row.push(header.get(*idx)?.clone());
        }

        let mut frame = Frame::new(columns.iter().cloned());
        frame.push_row(row).ok()?;
        Some(Step {
            offset: offset + payload.size(),
            fragment: Some(Fragment {
                label: label.clone(),
                frame,
                time_columns: time_columns.clone(),
            }),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use crate::types::FieldType;

    const HEADER_FIELDS: &[Field] = &[
        Field::new("time", FieldType::F32),
        Field::new("sample_size", FieldType::U32),
    ];
    const HEADER: Layout = Layout::new("test_header", HEADER_FIELDS);

    const SMALL_FIELDS: &[Field] = &[Field::new("a", FieldType::U32)];
    const SMALL: Layout = Layout::new("small", SMALL_FIELDS);

    const WIDE_FIELDS: &[Field] = &[
        Field::new("a", FieldType::U32),
        Field::new("b", FieldType::F32),
    ];
    const WIDE: Layout = Layout::new("wide", WIDE_FIELDS);

    fn record(time: f32, sample_size: u32, payload: &[u32]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&time.to_le_bytes());
        buf.extend_from_slice(&sample_size.to_le_bytes());
        for v in payload {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    fn reader() -> RecordReader {
        let order = ByteOrder::Little;
        RecordReader::new(HEADER, 1, order)
            .unwrap()
            .register(
                SMALL.size(),
                "small",
                payload_handler("small", SMALL, order, &[(0, "time")], &["time"]),
            )
            .unwrap()
            .register(
                WIDE.size(),
                "wide",
                payload_handler("wide", WIDE, order, &[(0, "time")], &["time"]),
            )
            .unwrap()
    }

    #[test]
    fn test_dispatch_by_width() {
        let mut buf = record(0.5, 4, &[7]);
        buf.extend(record(1.0, 8, &[9, 0]));
        buf.extend(record(1.5, 4, &[11]));

        let frames = reader().read(&buf);
        assert_eq!(frames["small"].len(), 2);
        assert_eq!(frames["wide"].len(), 1);
        assert_eq!(frames["small"].value(1, "a"), Some(&Value::UInt(11)));
        assert_eq!(frames["wide"].value(0, "time"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn test_unknown_width_halts() {
        let mut buf = record(0.5, 4, &[7]);
        buf.extend(record(1.0, 12, &[1, 2, 3]));
        buf.extend(record(1.5, 4, &[11]));

        let frames = reader().read(&buf);
        assert_eq!(frames["small"].len(), 1);
        assert!(!frames.contains_key("wide"));
    }

    #[test]
    fn test_truncated_payload_halts() {
        let mut buf = record(0.5, 4, &[7]);
        buf.extend(record(1.0, 8, &[9, 0]));
        buf.truncate(buf.len() - 1);

        let frames = reader().read(&buf);
        assert_eq!(frames["small"].len(), 1);
        assert!(!frames.contains_key("wide"));
    }

    #[test]
    fn test_non_finite_times_filtered() {
        let mut buf = record(0.5, 4, &[7]);
        buf.extend(record(f32::NAN, 4, &[8]));
        buf.extend(record(f32::INFINITY, 4, &[9]));

        let frames = reader().read(&buf);
        assert_eq!(frames["small"].len(), 1);
    }

    #[test]
    fn test_duplicate_width_rejected() {
        let order = ByteOrder::Little;
        let err = RecordReader::new(HEADER, 1, order)
            .unwrap()
            .register(4, "first", payload_handler("first", SMALL, order, &[], &[]))
            .unwrap()
            .register(4, "second", payload_handler("second", SMALL, order, &[], &[]))
            .unwrap_err();
        assert!(matches!(err, TraceError::DuplicatePayloadWidth { width: 4, .. }));
    }

    #[test]
    fn test_invalid_discriminator_index() {
        assert!(RecordReader::new(HEADER, 0, ByteOrder::Little).is_err());
        assert!(RecordReader::new(HEADER, 2, ByteOrder::Little).is_err());
    }

    #[test]
    fn test_empty_and_short_buffers() {
        assert!(reader().read(&[]).is_empty());
        assert!(reader().read(&[0u8; 7]).is_empty());
    }
}
