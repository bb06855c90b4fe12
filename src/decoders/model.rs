//! Model analysis decoder
//!
//! Each record is a 40-byte header followed by a 40-byte per-LP sample. Only
//! records flagged as model data (`flag == 3`) are decoded.

use std::path::Path;

use super::{read_content, TraceDecoder};
use crate::error::Result;
use crate::frame::Frame;
use crate::reader::{Fragment, PayloadHandler, RecordReader, Step};
use crate::schema::{infer_byte_order, Field, Layout};
use crate::types::{ByteOrder, FieldType, Value};
use crate::window::{TimeVariable, WindowedFrame};

const HEADER_FIELDS: &[Field] = &[
    Field::new("lp_id", FieldType::U64),
    Field::new("kp_id", FieldType::U32),
    Field::new("pe_id", FieldType::U32),
    Field::new("virtual_time", FieldType::F64),
    Field::new("real_time", FieldType::F64),
    Field::new("sample_size", FieldType::I32),
    Field::new("flag", FieldType::I32),
];

/// Per-record header (40 bytes, packed)
pub const HEADER: Layout = Layout::new("model_header", HEADER_FIELDS);

pub const SAMPLE_SIZE_INDEX: usize = 5;
pub const FLAG_INDEX: usize = 6;

/// `flag` value marking a model data sample
pub const FLAG_MODEL_DATA: i64 = 3;

const PAYLOAD_FIELDS: &[Field] = &[
    Field::new("component_id", FieldType::U64),
    Field::new("send_count", FieldType::I32),
    Field::new("send_bytes", FieldType::I32),
    Field::new("send_time", FieldType::F64),
    Field::new("receive_count", FieldType::I32),
    Field::new("receive_bytes", FieldType::I32),
    Field::new("receive_time", FieldType::F64),
];

/// Per-LP model sample (40 bytes)
pub const PAYLOAD: Layout = Layout::new("model_sample", PAYLOAD_FIELDS);

const LABEL: &str = "model";
const NAME: &str = "model analysis";

// (header index, column name) copied in front of the payload
const HEADER_COLUMNS: [(usize, &str); 3] = [(0, "lp_id"), (3, "virtual_time"), (4, "real_time")];
const TIME_COLUMNS: [&str; 2] = ["virtual_time", "real_time"];

/// Output columns, in order
pub fn columns() -> Vec<String> {
    HEADER_COLUMNS
        .iter()
        .map(|(_, name)| *name)
        .chain(PAYLOAD.field_names())
        .map(str::to_string)
        .collect()
}

fn model_handler(byte_order: ByteOrder) -> PayloadHandler {
    let columns = columns();
    Box::new(move |content: &[u8], offset: usize, header: &[Value]| {
        let flag = header.get(FLAG_INDEX)?.as_i64()?;
        if flag != FLAG_MODEL_DATA {
            tracing::debug!("Record at offset {} is not model data (flag={})", offset, flag);
            return None;
        }

        let payload = PAYLOAD.decode(content, offset, byte_order)?;
        let mut row: Vec<Value> = HEADER_COLUMNS
            .iter()
            .map(|(idx, _)| header.get(*idx).cloned())
            .collect::<Option<_>>()?;
        row.extend(payload);

        Some(Step {
            offset: offset + PAYLOAD.size(),
            fragment: Some(Fragment {
                label: LABEL.to_string(),
                frame: Frame::from_rows(columns.clone(), vec![row]),
                time_columns: TIME_COLUMNS.iter().map(|c| c.to_string()).collect(),
            }),
        })
    })
}

/// Decoder for `*-analysis-lps.bin` files
#[derive(Debug)]
pub struct ModelFile {
    content: Vec<u8>,
    reader: RecordReader,
    table: WindowedFrame,
}

impl ModelFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(read_content(path.as_ref())?)
    }

    /// Wrap an in-memory file and infer its byte order
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Result<Self> {
        let content = content.into();
        let order = infer_byte_order(&HEADER, SAMPLE_SIZE_INDEX, &content, &[PAYLOAD.size()]);
        Self::with_byte_order(content, order)
    }

    pub fn with_byte_order(content: impl Into<Vec<u8>>, byte_order: ByteOrder) -> Result<Self> {
        let reader = RecordReader::new(HEADER, SAMPLE_SIZE_INDEX, byte_order)?.register(
            PAYLOAD.size(),
            LABEL,
            model_handler(byte_order),
        )?;

        Ok(Self {
            content: content.into(),
            reader,
            table: WindowedFrame::new(NAME, [TimeVariable::VirtualTime, TimeVariable::RealTime]),
        })
    }

    /// Samples inside the current time window
    pub fn model_frame(&self) -> Frame {
        self.table.windowed()
    }
}

impl TraceDecoder for ModelFile {
    fn name(&self) -> &'static str {
        NAME
    }

    fn byte_order(&self) -> ByteOrder {
        self.reader.byte_order()
    }

    fn read(&mut self) {
        let mut frames = self.reader.read(&self.content);
        let frame = frames
            .remove(LABEL)
            .unwrap_or_else(|| Frame::new(columns()));
        tracing::debug!("Decoded {} model samples", frame.len());
        self.table.set_frame(frame);
    }

    fn table(&self) -> &WindowedFrame {
        &self.table
    }

    fn table_mut(&mut self) -> &mut WindowedFrame {
        &mut self.table
    }
}
