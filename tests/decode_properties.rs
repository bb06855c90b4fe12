//! Property-based tests for decoding invariants

mod common;

use common::builders::TraceBuilder;
use proptest::prelude::*;
use simtrace_rs::{
    validate_time_columns, ByteOrder, EngineCollection, EngineStatsFile, EventTraceFile, Frame,
    ModelFile, TraceDecoder, Value,
};

fn event_trace(order: ByteOrder, events: &[(u32, u32, f32, f32, i32)]) -> Vec<u8> {
    events
        .iter()
        .fold(TraceBuilder::new(order), |b, &(src, dst, send, recv, ty)| {
            b.event(src, dst, send, recv, ty)
        })
        .build()
}

fn event_strategy() -> impl Strategy<Value = Vec<(u32, u32, f32, f32, i32)>> {
    prop::collection::vec(
        (0u32..64, 0u32..64, 0.0f32..1e6, 0.0f32..1e6, any::<i32>()),
        1..40,
    )
}

fn engine_strategy() -> impl Strategy<Value = Vec<(usize, u32, f64)>> {
    prop::collection::vec((0usize..3, 0u32..16, 0.0f64..1e4), 1..30)
}

fn engine_trace(order: ByteOrder, records: &[(usize, u32, f64)]) -> Vec<u8> {
    records
        .iter()
        .fold(TraceBuilder::new(order), |b, &(kind, id, t)| {
            b.engine(EngineCollection::ALL[kind], id, t, t / 100.0)
        })
        .build()
}

fn model_strategy() -> impl Strategy<Value = Vec<(u64, f64, f64)>> {
    prop::collection::vec((0u64..1024, 0.0f64..1e6, 0.0f64..1e3), 1..20)
}

fn model_trace(order: ByteOrder, samples: &[(u64, f64, f64)]) -> Vec<u8> {
    samples
        .iter()
        .fold(TraceBuilder::new(order), |b, &(lp, vt, rt)| b.model(lp, vt, rt))
        .build()
}

fn decode_events(content: Vec<u8>, order: ByteOrder) -> Frame {
    let mut trace = EventTraceFile::with_byte_order(content, order);
    trace.read();
    trace.frame().clone()
}

proptest! {
    #[test]
    fn test_event_byte_order_roundtrip(events in event_strategy()) {
        let mut le = EventTraceFile::from_bytes(event_trace(ByteOrder::Little, &events));
        let mut be = EventTraceFile::from_bytes(event_trace(ByteOrder::Big, &events));
        prop_assert_eq!(le.byte_order(), ByteOrder::Little);
        prop_assert_eq!(be.byte_order(), ByteOrder::Big);

        le.read();
        be.read();
        prop_assert_eq!(le.frame(), be.frame());
        prop_assert_eq!(le.frame().len(), events.len());
    }

    #[test]
    fn test_event_truncation_keeps_prefix(events in event_strategy(), cut in 0usize..2000) {
        let content = event_trace(ByteOrder::Little, &events);
        let full = decode_events(content.clone(), ByteOrder::Little);
        let cut = cut.min(content.len());
        let prefix = decode_events(content[..cut].to_vec(), ByteOrder::Little);

        // Property: a truncated file decodes to exactly the complete records before the cut
        prop_assert_eq!(prefix.len(), cut / 28);
        for i in 0..prefix.len() {
            prop_assert_eq!(prefix.row(i).unwrap().values(), full.row(i).unwrap().values());
        }
    }

    #[test]
    fn test_model_truncation_keeps_prefix(samples in model_strategy(), cut in 0usize..2000) {
        let content = model_trace(ByteOrder::Big, &samples);
        let cut = cut.min(content.len());

        let mut full = ModelFile::with_byte_order(content.clone(), ByteOrder::Big).unwrap();
        let mut prefix =
            ModelFile::with_byte_order(content[..cut].to_vec(), ByteOrder::Big).unwrap();
        full.read();
        prefix.read();

        prop_assert_eq!(prefix.frame().len(), cut / 80);
        for i in 0..prefix.frame().len() {
            prop_assert_eq!(
                prefix.frame().row(i).unwrap().values(),
                full.frame().row(i).unwrap().values()
            );
        }
    }

    #[test]
    fn test_engine_truncation_is_monotonic(records in engine_strategy(), cut in 0usize..4000) {
        let content = engine_trace(ByteOrder::Big, &records);
        let cut = cut.min(content.len());

        let mut full = EngineStatsFile::with_byte_order(content.clone(), ByteOrder::Big).unwrap();
        let mut prefix =
            EngineStatsFile::with_byte_order(content[..cut].to_vec(), ByteOrder::Big).unwrap();
        full.read();
        prefix.read();

        for kind in EngineCollection::ALL {
            let (p, f) = (prefix.collection(kind), full.collection(kind));
            prop_assert!(p.len() <= f.len());
            for i in 0..p.len() {
                prop_assert_eq!(p.row(i).unwrap().values(), f.row(i).unwrap().values());
            }
        }
    }

    #[test]
    fn test_time_filter_leaves_only_finite(times in prop::collection::vec(
        prop_oneof![
            (-1e9f64..1e9).boxed(),
            Just(f64::NAN).boxed(),
            Just(f64::INFINITY).boxed(),
            Just(f64::NEG_INFINITY).boxed(),
        ],
        0..50,
    )) {
        let mut frame = Frame::new(["t", "other"]);
        for t in &times {
            frame.push_row(vec![Value::Float(*t), Value::Float(f64::NAN)]).unwrap();
        }

        let clean = validate_time_columns(frame, &["t", "missing"]);
        let expected = times.iter().filter(|t| t.is_finite()).count();
        prop_assert_eq!(clean.len(), expected);
        prop_assert!(clean.column_f64("t").unwrap().iter().all(|t| t.is_finite()));
    }
}
