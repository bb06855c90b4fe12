//! Byte builders for synthetic trace files

use simtrace_rs::{ByteOrder, EngineCollection, FieldType};

/// Builder for trace file contents in a fixed byte order
pub struct TraceBuilder {
    order: ByteOrder,
    buf: Vec<u8>,
}

impl TraceBuilder {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            buf: Vec::new(),
        }
    }

    fn push<const N: usize>(mut self, le: [u8; N], be: [u8; N]) -> Self {
        match self.order {
            ByteOrder::Little => self.buf.extend_from_slice(&le),
            ByteOrder::Big => self.buf.extend_from_slice(&be),
        }
        self
    }

    pub fn u32(self, v: u32) -> Self {
        self.push(v.to_le_bytes(), v.to_be_bytes())
    }

    pub fn i32(self, v: i32) -> Self {
        self.push(v.to_le_bytes(), v.to_be_bytes())
    }

    pub fn u64(self, v: u64) -> Self {
        self.push(v.to_le_bytes(), v.to_be_bytes())
    }

    pub fn f32(self, v: f32) -> Self {
        self.push(v.to_le_bytes(), v.to_be_bytes())
    }

    pub fn f64(self, v: f64) -> Self {
        self.push(v.to_le_bytes(), v.to_be_bytes())
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Event header with an arbitrary `sample_size`
    pub fn event_header(self, src: u32, dst: u32, send: f32, recv: f32, sample_size: u32) -> Self {
        self.u32(src)
            .u32(dst)
            .f32(send)
            .f32(recv)
            .f32(0.0)
            .u32(sample_size)
    }

    /// Complete point-to-point event record
    pub fn event(self, src: u32, dst: u32, send: f32, recv: f32, event_type: i32) -> Self {
        self.event_header(src, dst, send, recv, 4).i32(event_type)
    }

    /// Model header with an arbitrary size and flag
    pub fn model_header(self, lp_id: u64, vt: f64, rt: f64, sample_size: i32, flag: i32) -> Self {
        self.u64(lp_id)
            .u32(0)
            .u32(0)
            .f64(vt)
            .f64(rt)
            .i32(sample_size)
            .i32(flag)
    }

    /// Complete model sample flagged as model data
    pub fn model(self, lp_id: u64, vt: f64, rt: f64) -> Self {
        self.model_header(lp_id, vt, rt, 40, 3)
            .u64(lp_id)
            .i32(1)
            .i32(64)
            .f64(0.5)
            .i32(2)
            .i32(128)
            .f64(0.25)
    }

    /// Engine header with an arbitrary size
    pub fn engine_header(self, sample_size: i32, vt: f64, rt: f64) -> Self {
        self.i32(1).i32(sample_size).f64(vt).f64(rt)
    }

    /// Complete engine record; every integer field holds `id`, every float 0.5
    pub fn engine(self, collection: EngineCollection, id: u32, vt: f64, rt: f64) -> Self {
        let layout = collection.layout();
        let mut builder = self.engine_header(layout.size() as i32, vt, rt);
        for field in layout.fields() {
            builder = match field.ty {
                FieldType::U32 => builder.u32(id),
                _ => builder.f32(0.5),
            };
        }
        builder
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_widths() {
        assert_eq!(TraceBuilder::new(ByteOrder::Little).event(1, 2, 0.0, 0.0, 0).len(), 28);
        assert_eq!(TraceBuilder::new(ByteOrder::Big).model(1, 0.0, 0.0).len(), 80);
        assert_eq!(
            TraceBuilder::new(ByteOrder::Little)
                .engine(EngineCollection::Pe, 0, 0.0, 0.0)
                .len(),
            128
        );
    }
}
