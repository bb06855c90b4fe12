//! Concrete trace decoders
//!
//! One decoder per binary format produced by the simulator:
//!
//! - [`EventTraceFile`] - point-to-point event records
//! - [`ModelFile`] - per-LP model analysis samples
//! - [`EngineStatsFile`] - ROSS engine statistics (PE/KP/LP records)
//!
//! All three follow the same lifecycle: construct from a path or buffer
//! (byte order is inferred from the first header unless given), call
//! [`TraceDecoder::read`] once, then use the read-only views. Reading again
//! re-derives identical results from the same buffer.

pub mod engine_stats;
pub mod event_trace;
pub mod model;

pub use engine_stats::{EngineCollection, EngineStatsFile};
pub use event_trace::{EventRecord, EventRecords, EventTraceFile};
pub use model::ModelFile;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, ResultExt};
use crate::frame::Frame;
use crate::types::ByteOrder;
use crate::window::{TimeVariable, WindowState, WindowedFrame};

/// Which binary format a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderKind {
    /// Event trace (`*-evtrace.bin`)
    Event,
    /// Model analysis (`*-analysis-lps.bin`)
    Model,
    /// Engine statistics (`ross-stats-*.bin`)
    Engine,
}

impl DecoderKind {
    pub const ALL: [DecoderKind; 3] = [DecoderKind::Event, DecoderKind::Model, DecoderKind::Engine];

    pub fn name(&self) -> &'static str {
        match self {
            DecoderKind::Event => "event",
            DecoderKind::Model => "model",
            DecoderKind::Engine => "engine",
        }
    }
}

impl std::fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DecoderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "event" | "events" => Ok(DecoderKind::Event),
            "model" | "models" => Ok(DecoderKind::Model),
            "engine" | "ross" | "simulations" => Ok(DecoderKind::Engine),
            _ => Err(format!("unknown decoder '{}' (expected event, model or engine)", s)),
        }
    }
}

/// Behavior shared by every decoder
///
/// Implementors provide their primary windowed table; the window operations
/// are derived from it.
pub trait TraceDecoder: Send + Sync {
    /// Human-readable format name
    fn name(&self) -> &'static str;

    /// Byte order used for the whole file
    fn byte_order(&self) -> ByteOrder;

    /// Walk the buffer and rebuild every table
    fn read(&mut self);

    /// Primary table with its time window
    fn table(&self) -> &WindowedFrame;

    fn table_mut(&mut self) -> &mut WindowedFrame;

    /// Full decoded (and time-validated) primary table
    fn frame(&self) -> &Frame {
        self.table().frame()
    }

    /// Primary table restricted to the current window
    fn windowed(&self) -> Frame {
        self.table().windowed()
    }

    fn window(&self) -> WindowState {
        self.table().state()
    }

    fn time_variable(&self) -> TimeVariable {
        self.table().time_variable()
    }

    fn min_time(&self) -> Option<f64> {
        self.table().min_time()
    }

    fn max_time(&self) -> Option<f64> {
        self.table().max_time()
    }

    /// Switch the active time column; the window resets to its full range
    fn select_time_variable(&mut self, name: &str) -> Result<WindowState> {
        self.table_mut().select_time_variable(name)
    }

    fn set_time_range(&mut self, min: f64, max: f64) -> WindowState {
        self.table_mut().set_time_range(min, max)
    }

    fn reset_time_range(&mut self) -> WindowState {
        self.table_mut().reset_time_range()
    }
}

/// Read a whole trace file into memory
pub(crate) fn read_content(path: &Path) -> Result<Vec<u8>> {
    let content = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    tracing::debug!("Loaded {} bytes from {:?}", content.len(), path);
    Ok(content)
}

/// Open `path` with the decoder for `kind`
///
/// `byte_order` forces an order; `None` infers it from the first header.
pub fn open_decoder(
    kind: DecoderKind,
    path: impl AsRef<Path>,
    byte_order: Option<ByteOrder>,
) -> Result<Box<dyn TraceDecoder>> {
    let content = read_content(path.as_ref())?;
    decoder_from_bytes(kind, content, byte_order)
}

/// Build the decoder for `kind` over an in-memory buffer
pub fn decoder_from_bytes(
    kind: DecoderKind,
    content: Vec<u8>,
    byte_order: Option<ByteOrder>,
) -> Result<Box<dyn TraceDecoder>> {
    let decoder: Box<dyn TraceDecoder> = match (kind, byte_order) {
        (DecoderKind::Event, None) => Box::new(EventTraceFile::from_bytes(content)),
        (DecoderKind::Event, Some(order)) => {
            Box::new(EventTraceFile::with_byte_order(content, order))
        }
        (DecoderKind::Model, None) => Box::new(ModelFile::from_bytes(content)?),
        (DecoderKind::Model, Some(order)) => Box::new(ModelFile::with_byte_order(content, order)?),
        (DecoderKind::Engine, None) => Box::new(EngineStatsFile::from_bytes(content)?),
        (DecoderKind::Engine, Some(order)) => {
            Box::new(EngineStatsFile::with_byte_order(content, order)?)
        }
    };
    Ok(decoder)
}
