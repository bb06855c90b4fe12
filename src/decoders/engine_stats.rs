//! ROSS engine statistics decoder
//!
//! Engine statistics interleave three record shapes behind one 24-byte
//! header, told apart only by `sample_size`:
//!
//! | Shape | Width | Fields          |
//! |-------|-------|-----------------|
//! | PE    | 104   | 13 u32 + 13 f32 |
//! | KP    | 44    | 9 u32 + 2 f32   |
//! | LP    | 36    | 8 u32 + 1 f32   |
//!
//! Every collection gets the header's `virtual_time` and `real_time`
//! appended. The time window is computed from the PE collection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use super::{read_content, TraceDecoder};
use crate::error::{Result, TraceError};
use crate::frame::Frame;
use crate::reader::{payload_handler, RecordReader};
use crate::schema::{infer_byte_order, Field, Layout};
use crate::types::{ByteOrder, FieldType};
use crate::window::{TimeVariable, WindowedFrame};

const HEADER_FIELDS: &[Field] = &[
    Field::new("flag", FieldType::I32),
    Field::new("sample_size", FieldType::I32),
    Field::new("virtual_time", FieldType::F64),
    Field::new("real_time", FieldType::F64),
];

/// Per-record header (24 bytes)
pub const HEADER: Layout = Layout::new("engine_header", HEADER_FIELDS);

pub const SAMPLE_SIZE_INDEX: usize = 1;

const PE_FIELDS: &[Field] = &[
    Field::new("PE_ID", FieldType::U32),
    Field::new("events_processed", FieldType::U32),
    Field::new("events_aborted", FieldType::U32),
    Field::new("events_rolled_back", FieldType::U32),
    Field::new("total_rollbacks", FieldType::U32),
    Field::new("secondary_rollbacks", FieldType::U32),
    Field::new("fossil_collection_attempts", FieldType::U32),
    Field::new("pq_queue_size", FieldType::U32),
    Field::new("network_sends", FieldType::U32),
    Field::new("network_reads", FieldType::U32),
    Field::new("number_gvt", FieldType::U32),
    Field::new("pe_event_ties", FieldType::U32),
    Field::new("all_reduce", FieldType::U32),
    Field::new("efficiency", FieldType::F32),
    Field::new("network_read_time", FieldType::F32),
    Field::new("network_other_time", FieldType::F32),
    Field::new("gvt_time", FieldType::F32),
    Field::new("fossil_collect_time", FieldType::F32),
    Field::new("event_abort_time", FieldType::F32),
    Field::new("event_process_time", FieldType::F32),
    Field::new("pq_time", FieldType::F32),
    Field::new("rollback_time", FieldType::F32),
    Field::new("cancel_q_time", FieldType::F32),
    Field::new("avl_time", FieldType::F32),
    Field::new("buddy_time", FieldType::F32),
    Field::new("lz4_time", FieldType::F32),
];

/// Processing-element statistics (104 bytes)
pub const PE_LAYOUT: Layout = Layout::new("pe_engine_stats", PE_FIELDS);

const KP_FIELDS: &[Field] = &[
    Field::new("PE_ID", FieldType::U32),
    Field::new("KP_ID", FieldType::U32),
    Field::new("events_processed", FieldType::U32),
    Field::new("events_abort", FieldType::U32),
    Field::new("events_rolled_back", FieldType::U32),
    Field::new("total_rollbacks", FieldType::U32),
    Field::new("secondary_rollbacks", FieldType::U32),
    Field::new("network_sends", FieldType::U32),
    Field::new("network_reads", FieldType::U32),
    Field::new("time_ahead_gvt", FieldType::F32),
    Field::new("efficiency", FieldType::F32),
];

/// Kernel-process statistics (44 bytes)
pub const KP_LAYOUT: Layout = Layout::new("kp_engine_stats", KP_FIELDS);

const LP_FIELDS: &[Field] = &[
    Field::new("PE_ID", FieldType::U32),
    Field::new("KP_ID", FieldType::U32),
    Field::new("LP_ID", FieldType::U32),
    Field::new("events_processed", FieldType::U32),
    Field::new("events_abort", FieldType::U32),
    Field::new("events_rolled_back", FieldType::U32),
    Field::new("network_sends", FieldType::U32),
    Field::new("network_reads", FieldType::U32),
    Field::new("efficiency", FieldType::F32),
];

/// Logical-process statistics (36 bytes)
pub const LP_LAYOUT: Layout = Layout::new("lp_engine_stats", LP_FIELDS);

const HEADER_COLUMNS: [(usize, &str); 2] = [(2, "virtual_time"), (3, "real_time")];
const TIME_COLUMNS: [&str; 2] = ["virtual_time", "real_time"];

const NAME: &str = "engine statistics";

/// One of the three engine statistics collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineCollection {
    Pe,
    Kp,
    Lp,
}

impl EngineCollection {
    /// Dispatch priority order
    pub const ALL: [EngineCollection; 3] =
        [EngineCollection::Pe, EngineCollection::Kp, EngineCollection::Lp];

    pub fn label(&self) -> &'static str {
        match self {
            EngineCollection::Pe => "pe",
            EngineCollection::Kp => "kp",
            EngineCollection::Lp => "lp",
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            EngineCollection::Pe => PE_LAYOUT,
            EngineCollection::Kp => KP_LAYOUT,
            EngineCollection::Lp => LP_LAYOUT,
        }
    }

    /// Output columns: payload fields, then the header times
    pub fn columns(&self) -> Vec<String> {
        self.layout()
            .field_names()
            .chain(HEADER_COLUMNS.iter().map(|(_, name)| *name))
            .map(str::to_string)
            .collect()
    }
}

impl std::fmt::Display for EngineCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EngineCollection {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        EngineCollection::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                TraceError::Config(format!("unknown collection '{}' (expected pe, kp or lp)", s))
            })
    }
}

/// Widths of every collection, in priority order
pub fn known_sizes() -> [usize; 3] {
    EngineCollection::ALL.map(|c| c.layout().size())
}

fn build_reader(byte_order: ByteOrder) -> Result<RecordReader> {
    let mut reader = RecordReader::new(HEADER, SAMPLE_SIZE_INDEX, byte_order)?;
    for collection in EngineCollection::ALL {
        let layout = collection.layout();
        reader = reader.register(
            layout.size(),
            collection.label(),
            payload_handler(
                collection.label(),
                layout,
                byte_order,
                &HEADER_COLUMNS,
                &TIME_COLUMNS,
            ),
        )?;
    }
    Ok(reader)
}

/// Decoder for `ross-stats-*.bin` files
#[derive(Debug)]
pub struct EngineStatsFile {
    content: Vec<u8>,
    reader: RecordReader,
    pe: WindowedFrame,
    kp: Frame,
    lp: Frame,
}

impl EngineStatsFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(read_content(path.as_ref())?)
    }

    /// Wrap an in-memory file and infer its byte order
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Result<Self> {
        let content = content.into();
        let order = infer_byte_order(&HEADER, SAMPLE_SIZE_INDEX, &content, &known_sizes());
        Self::with_byte_order(content, order)
    }

    pub fn with_byte_order(content: impl Into<Vec<u8>>, byte_order: ByteOrder) -> Result<Self> {
        Ok(Self {
            content: content.into(),
            reader: build_reader(byte_order)?,
            pe: WindowedFrame::new(NAME, [TimeVariable::VirtualTime, TimeVariable::RealTime]),
            kp: Frame::new(EngineCollection::Kp.columns()),
            lp: Frame::new(EngineCollection::Lp.columns()),
        })
    }

    /// PE statistics inside the current time window
    pub fn pe_engine_frame(&self) -> Frame {
        self.pe.windowed()
    }

    pub fn pe_frame(&self) -> &Frame {
        self.pe.frame()
    }

    /// All KP statistics (not windowed)
    pub fn kp_frame(&self) -> &Frame {
        &self.kp
    }

    /// All LP statistics (not windowed)
    pub fn lp_frame(&self) -> &Frame {
        &self.lp
    }

    /// Full table of one collection
    pub fn collection(&self, kind: EngineCollection) -> &Frame {
        match kind {
            EngineCollection::Pe => self.pe.frame(),
            EngineCollection::Kp => &self.kp,
            EngineCollection::Lp => &self.lp,
        }
    }

    /// One collection filtered by the PE-derived window
    pub fn windowed_collection(&self, kind: EngineCollection) -> Frame {
        self.pe.state().apply(self.collection(kind))
    }
}

impl TraceDecoder for EngineStatsFile {
    fn name(&self) -> &'static str {
        NAME
    }

    fn byte_order(&self) -> ByteOrder {
        self.reader.byte_order()
    }

    fn read(&mut self) {
        let mut frames = self.reader.read(&self.content);
        let mut take = |kind: EngineCollection| {
            frames
                .remove(kind.label())
                .unwrap_or_else(|| Frame::new(kind.columns()))
        };
        let (pe, kp, lp) = (
            take(EngineCollection::Pe),
            take(EngineCollection::Kp),
            take(EngineCollection::Lp),
        );
        tracing::debug!(
            "Decoded engine statistics: {} PE, {} KP, {} LP records",
            pe.len(),
            kp.len(),
            lp.len()
        );
        self.pe.set_frame(pe);
        self.kp = kp;
        self.lp = lp;
    }

    fn table(&self) -> &WindowedFrame {
        &self.pe
    }

    fn table_mut(&mut self) -> &mut WindowedFrame {
        &mut self.pe
    }
}
