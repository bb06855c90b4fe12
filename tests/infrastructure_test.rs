//! Test to verify test infrastructure works correctly

mod common;

use common::builders::TraceBuilder;
use simtrace_rs::ByteOrder;

#[test]
fn test_infrastructure_setup() {
    // Test that builders honor the byte order
    let le = TraceBuilder::new(ByteOrder::Little).u32(1).build();
    let be = TraceBuilder::new(ByteOrder::Big).u32(1).build();

    assert_eq!(le, vec![1, 0, 0, 0]);
    assert_eq!(be, vec![0, 0, 0, 1]);
}

#[test]
fn test_data_file_helper() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = common::write_data_file(dir.path(), "events", "a.bin", b"xyz");
    assert_eq!(std::fs::read(path).unwrap(), b"xyz");
}
