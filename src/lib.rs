//! # simtrace-rs: Decoders for ROSS/CODES simulation traces
//!
//! Parallel discrete-event simulations built on ROSS write their
//! instrumentation as flat binary files of fixed-width records. This crate
//! turns those files into tables that can be filtered by time and exported.
//!
//! ## Architecture
//!
//! - **Schema**: packed [`Layout`]s describe every header and payload shape;
//!   byte order is inferred from the first header of a file
//! - **Reader**: a generic [`RecordReader`] walks header + payload records and
//!   dispatches on the header's `sample_size`
//! - **Decoders**: [`EventTraceFile`], [`ModelFile`] and [`EngineStatsFile`]
//!   build [`Frame`]s and keep a time [`WindowState`] over them
//! - **Catalog**: [`DataCatalog`] lists and resolves files under a data directory
//!
//! Structural damage in a file (an unknown payload size, a truncated final
//! record) is not an error: decoding stops there and keeps what was read.
//!
//! ## Example
//!
//! ```no_run
//! use simtrace_rs::{EventTraceFile, TraceDecoder};
//!
//! let mut trace = EventTraceFile::open("data/events/esnet-model-inst-evtrace.bin")?;
//! trace.read();
//! println!("{} events, {:?}", trace.frame().len(), trace.window());
//!
//! trace.select_time_variable("virtual_receive")?;
//! trace.set_time_range(0.0, 1000.0);
//! let visible = trace.network_frame();
//! # Ok::<(), simtrace_rs::TraceError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod decoders;
pub mod error;
pub mod export;
pub mod frame;
pub mod reader;
pub mod schema;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use catalog::{DataCatalog, DataCategory};
pub use config::AppConfig;
pub use decoders::{
    open_decoder, DecoderKind, EngineCollection, EngineStatsFile, EventRecord, EventTraceFile,
    ModelFile, TraceDecoder,
};
pub use error::{Result, TraceError};
pub use export::ExportFormat;
pub use frame::{validate_time_columns, Frame};
pub use reader::RecordReader;
pub use schema::{infer_byte_order, valid_sample_size, Field, Layout};
pub use types::{ByteOrder, FieldType, Value};
pub use window::{TimeVariable, TimeWindow, WindowState};
