//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use std::path::{Path, PathBuf};

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Write `content` to `dir/category/name`, creating the category directory
pub fn write_data_file(dir: &Path, category: &str, name: &str, content: &[u8]) -> PathBuf {
    let sub = dir.join(category);
    std::fs::create_dir_all(&sub).expect("create category dir");
    let path = sub.join(name);
    std::fs::write(&path, content).expect("write data file");
    path
}
