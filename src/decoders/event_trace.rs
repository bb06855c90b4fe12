//! Event trace decoder
//!
//! An event trace is a flat sequence of 24-byte headers, each followed by a
//! payload of `sample_size` bytes. Only the 4-byte `SimpleP2P` payload is
//! understood; zero-length records are skipped, and any other size ends the
//! walk.

use serde::Serialize;
use std::path::Path;

use super::{read_content, TraceDecoder};
use crate::error::Result;
use crate::frame::{validate_time_columns, Frame};
use crate::schema::{infer_byte_order, Field, Layout};
use crate::types::{ByteOrder, FieldType, Value};
use crate::window::{TimeVariable, WindowedFrame};

const HEADER_FIELDS: &[Field] = &[
    Field::new("source_lp", FieldType::U32),
    Field::new("dest_lp", FieldType::U32),
    Field::new("virtual_send", FieldType::F32),
    Field::new("virtual_receive", FieldType::F32),
    Field::new("real_times", FieldType::F32),
    Field::new("sample_size", FieldType::U32),
];

/// Per-record header (24 bytes)
pub const HEADER: Layout = Layout::new("event_header", HEADER_FIELDS);

/// Index of `sample_size` in [`HEADER`]
pub const SAMPLE_SIZE_INDEX: usize = 5;

const SIMPLE_P2P_FIELDS: &[Field] = &[Field::new("event_type", FieldType::I32)];

/// Point-to-point event payload (4 bytes)
pub const SIMPLE_P2P: Layout = Layout::new("simple_p2p", SIMPLE_P2P_FIELDS);

/// Output columns, in order
pub const COLUMNS: [&str; 6] = [
    "source_lp",
    "dest_lp",
    "virtual_send",
    "virtual_receive",
    "event_type",
    "time_step",
];

const TIME_COLUMNS: [&str; 2] = ["virtual_send", "virtual_receive"];

const NAME: &str = "event trace";

/// One decoded point-to-point event
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventRecord {
    pub source_lp: u32,
    pub dest_lp: u32,
    pub virtual_send: f64,
    pub virtual_receive: f64,
    /// Wall-clock stamp from the header; not part of the table
    #[serde(skip)]
    pub real_time: f64,
    pub event_type: i32,
    /// 0-based index among decoded events (skipped records do not count)
    pub time_step: u64,
}

impl EventRecord {
    /// Whether both virtual times are finite
    pub fn has_finite_times(&self) -> bool {
        self.virtual_send.is_finite() && self.virtual_receive.is_finite()
    }

    /// Table row in [`COLUMNS`] order
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::UInt(self.source_lp as u64),
            Value::UInt(self.dest_lp as u64),
            Value::Float(self.virtual_send),
            Value::Float(self.virtual_receive),
            Value::Int(self.event_type as i64),
            Value::UInt(self.time_step),
        ]
    }
}

struct EventHeader {
    source_lp: u32,
    dest_lp: u32,
    virtual_send: f64,
    virtual_receive: f64,
    real_time: f64,
    sample_size: u64,
}

impl EventHeader {
    fn decode(content: &[u8], offset: usize, order: ByteOrder) -> Option<Self> {
        let v = HEADER.decode(content, offset, order)?;
        Some(Self {
            source_lp: u32::try_from(v[0].as_u64()?).ok()?,
            dest_lp: u32::try_from(v[1].as_u64()?).ok()?,
            virtual_send: v[2].as_f64(),
            virtual_receive: v[3].as_f64(),
            real_time: v[4].as_f64(),
            sample_size: v[SAMPLE_SIZE_INDEX].as_u64()?,
        })
    }
}

/// Lazy walk over the events of a buffer
///
/// Yields records one at a time without building a table. Records are
/// yielded as decoded; non-finite times are not filtered here.
#[derive(Debug, Clone)]
pub struct EventRecords<'a> {
    content: &'a [u8],
    offset: usize,
    byte_order: ByteOrder,
    time_step: u64,
    skipped: usize,
    done: bool,
}

impl<'a> EventRecords<'a> {
    pub fn new(content: &'a [u8], byte_order: ByteOrder) -> Self {
        Self {
            content,
            offset: 0,
            byte_order,
            time_step: 0,
            skipped: 0,
            done: false,
        }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Zero-length records skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn halt(&mut self) -> Option<EventRecord> {
        self.done = true;
        None
    }
}

impl Iterator for EventRecords<'_> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<EventRecord> {
        while !self.done {
            if self.content.len() - self.offset < HEADER.size() {
                return self.halt();
            }
            let Some(header) = EventHeader::decode(self.content, self.offset, self.byte_order)
            else {
                return self.halt();
            };

            let payload_at = self.offset + HEADER.size();
            let remaining = self.content.len() - payload_at;

            if header.sample_size == 0 {
                self.offset = payload_at;
                self.skipped += 1;
                continue;
            }

            if header.sample_size != SIMPLE_P2P.size() as u64 || remaining < SIMPLE_P2P.size() {
                tracing::warn!(
                    "Stopping parse due to invalid payload size: size={}, remaining={}",
                    header.sample_size,
                    remaining
                );
                return self.halt();
            }

            let Some(event_type) = SIMPLE_P2P
                .decode(self.content, payload_at, self.byte_order)
                .and_then(|v| v[0].as_i64())
                .and_then(|t| i32::try_from(t).ok())
            else {
                return self.halt();
            };

            self.offset = payload_at + SIMPLE_P2P.size();
            let record = EventRecord {
                source_lp: header.source_lp,
                dest_lp: header.dest_lp,
                virtual_send: header.virtual_send,
                virtual_receive: header.virtual_receive,
                real_time: header.real_time,
                event_type,
                time_step: self.time_step,
            };
            self.time_step += 1;
            return Some(record);
        }
        None
    }
}

impl std::iter::FusedIterator for EventRecords<'_> {}

/// Decoder for `*-evtrace.bin` files
#[derive(Debug, Clone)]
pub struct EventTraceFile {
    content: Vec<u8>,
    byte_order: ByteOrder,
    table: WindowedFrame,
}

impl EventTraceFile {
    /// Load a trace from disk and infer its byte order
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_bytes(read_content(path.as_ref())?))
    }

    /// Wrap an in-memory trace and infer its byte order
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        let order = infer_byte_order(&HEADER, SAMPLE_SIZE_INDEX, &content, &[SIMPLE_P2P.size()]);
        Self::with_byte_order(content, order)
    }

    /// Wrap an in-memory trace with a known byte order
    pub fn with_byte_order(content: impl Into<Vec<u8>>, byte_order: ByteOrder) -> Self {
        Self {
            content: content.into(),
            byte_order,
            table: WindowedFrame::new(
                NAME,
                [TimeVariable::VirtualSend, TimeVariable::VirtualReceive],
            ),
        }
    }

    /// Lazily decode the events without touching the table
    pub fn records(&self) -> EventRecords<'_> {
        EventRecords::new(&self.content, self.byte_order)
    }

    /// Events inside the current time window
    pub fn network_frame(&self) -> Frame {
        self.table.windowed()
    }
}

impl TraceDecoder for EventTraceFile {
    fn name(&self) -> &'static str {
        NAME
    }

    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn read(&mut self) {
        let mut records = self.records();
        let rows: Vec<Vec<Value>> = records.by_ref().map(|r| r.to_row()).collect();
        let decoded = rows.len();
        let (consumed, skipped) = (records.offset(), records.skipped());

        let columns = COLUMNS.iter().map(|c| c.to_string()).collect();
        let frame = validate_time_columns(Frame::from_rows(columns, rows), &TIME_COLUMNS);
        tracing::debug!(
            "Decoded {} events ({} kept, {} empty records skipped), {} of {} bytes consumed",
            decoded,
            frame.len(),
            skipped,
            consumed,
            self.content.len()
        );
        self.table.set_frame(frame);
    }

    fn table(&self) -> &WindowedFrame {
        &self.table
    }

    fn table_mut(&mut self) -> &mut WindowedFrame {
        &mut self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order: ByteOrder, src: u32, dst: u32, send: f32, recv: f32, size: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        macro_rules! put {
            ($v:expr) => {
                match order {
                    ByteOrder::Little => buf.extend_from_slice(&$v.to_le_bytes()),
                    ByteOrder::Big => buf.extend_from_slice(&$v.to_be_bytes()),
                }
            };
        }
        put!(src);
        put!(dst);
        put!(send);
        put!(recv);
        put!(0.0f32);
        put!(size);
        buf
    }

    fn event(order: ByteOrder, src: u32, dst: u32, send: f32, recv: f32, ty: i32) -> Vec<u8> {
        let mut buf = record(order, src, dst, send, recv, 4);
        match order {
            ByteOrder::Little => buf.extend_from_slice(&ty.to_le_bytes()),
            ByteOrder::Big => buf.extend_from_slice(&ty.to_be_bytes()),
        }
        buf
    }

    #[test]
    fn test_layout_widths() {
        assert_eq!(HEADER.size(), 24);
        assert_eq!(SIMPLE_P2P.size(), 4);
    }

    #[test]
    fn test_single_record() {
        let mut trace = EventTraceFile::from_bytes(event(ByteOrder::Little, 1, 2, 0.5, 0.6, 7));
        assert_eq!(trace.byte_order(), ByteOrder::Little);
        trace.read();

        let frame = trace.frame();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.columns(), COLUMNS.map(String::from).as_slice());
        assert_eq!(frame.value(0, "source_lp"), Some(&Value::UInt(1)));
        assert_eq!(frame.value(0, "dest_lp"), Some(&Value::UInt(2)));
        assert_eq!(frame.value(0, "virtual_send"), Some(&Value::Float(0.5)));
        assert_eq!(
            frame.value(0, "virtual_receive"),
            Some(&Value::Float(0.6f32 as f64))
        );
        assert_eq!(frame.value(0, "event_type"), Some(&Value::Int(7)));
        assert_eq!(frame.value(0, "time_step"), Some(&Value::UInt(0)));
        assert_eq!(trace.min_time(), Some(0.5));
        assert_eq!(trace.max_time(), Some(0.5));
    }

    #[test]
    fn test_zero_length_records_skipped_without_step() {
        let order = ByteOrder::Little;
        let mut buf = event(order, 1, 2, 0.1, 0.2, 1);
        buf.extend(record(order, 9, 9, 0.15, 0.15, 0));
        buf.extend(event(order, 3, 4, 0.3, 0.4, 2));

        let records: Vec<_> = EventTraceFile::from_bytes(buf).records().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].time_step, 0);
        assert_eq!(records[1].time_step, 1);
        assert_eq!(records[1].source_lp, 3);
    }

    #[test]
    fn test_unknown_size_halts() {
        let order = ByteOrder::Little;
        let mut buf = event(order, 1, 2, 0.1, 0.2, 1);
        buf.extend(record(order, 1, 2, 0.3, 0.4, 8));
        buf.extend_from_slice(&[0; 8]);
        buf.extend(event(order, 3, 4, 0.5, 0.6, 2));

        let mut trace = EventTraceFile::from_bytes(buf);
        trace.read();
        assert_eq!(trace.frame().len(), 1);
    }

    #[test]
    fn test_truncated_payload_halts() {
        let order = ByteOrder::Big;
        let mut buf = event(order, 1, 2, 0.1, 0.2, 1);
        buf.extend(record(order, 1, 2, 0.3, 0.4, 4));
        buf.extend_from_slice(&[0; 2]);

        let mut trace = EventTraceFile::from_bytes(buf);
        assert_eq!(trace.byte_order(), ByteOrder::Big);
        trace.read();
        assert_eq!(trace.frame().len(), 1);
    }

    #[test]
    fn test_non_finite_times_dropped_from_table_only() {
        let order = ByteOrder::Little;
        let mut buf = event(order, 1, 2, 0.1, 0.2, 1);
        buf.extend(event(order, 1, 2, f32::NAN, 0.4, 1));

        let mut trace = EventTraceFile::from_bytes(buf);
        assert_eq!(trace.records().count(), 2);
        trace.read();
        assert_eq!(trace.frame().len(), 1);
    }

    #[test]
    fn test_select_and_window() {
        let order = ByteOrder::Little;
        let mut buf = event(order, 1, 2, 1.0, 5.0, 1);
        buf.extend(event(order, 2, 3, 2.0, 3.0, 1));
        buf.extend(event(order, 3, 4, 3.0, 4.0, 1));

        let mut trace = EventTraceFile::from_bytes(buf);
        trace.read();
        trace.set_time_range(1.5, 3.0);
        assert_eq!(trace.network_frame().len(), 2);

        let state = trace.select_time_variable("virtual_receive").unwrap();
        assert_eq!(state.min_time(), Some(3.0));
        assert_eq!(state.max_time(), Some(5.0));
        assert_eq!(trace.network_frame().len(), 3);

        assert!(trace.select_time_variable("virtual_time").is_err());
    }

    #[test]
    fn test_read_is_idempotent() {
        let order = ByteOrder::Little;
        let mut buf = event(order, 1, 2, 0.1, 0.2, 1);
        buf.extend(event(order, 3, 4, 0.3, 0.4, 2));

        let mut trace = EventTraceFile::from_bytes(buf);
        trace.read();
        let first = trace.frame().clone();
        trace.read();
        assert_eq!(trace.frame(), &first);
    }
}
