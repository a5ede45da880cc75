//! Human-readable formatting for sizes, shapes and counts

use crate::record::TensorRecord;
use crate::tree::GroupNode;

/// Format a byte count in human-readable form (`512 B`, `1.5 KB`, `7.0 GB`)
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Format a shape as a tuple: `(4096, 11008)`, `()` for a scalar
pub fn format_shape(shape: &[u64]) -> String {
    let dims: Vec<String> = shape.iter().map(u64::to_string).collect();
    format!("({})", dims.join(", "))
}

/// Format an element count with a K/M/B suffix (`950`, `1.2K`, `6.7B`)
pub fn format_count(n: u64) -> String {
    if n < 1_000 {
        n.to_string()
    } else if n < 1_000_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else if n < 1_000_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else {
        format!("{:.1}B", n as f64 / 1_000_000_000.0)
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Row label for a group: `layers (24 tensors, 1.2 GB)`
pub fn group_label(group: &GroupNode) -> String {
    let noun = if group.tensor_count() == 1 {
        "tensor"
    } else {
        "tensors"
    };
    format!(
        "{} ({} {}, {})",
        group.name(),
        format_number(group.tensor_count()),
        noun,
        format_size(group.total_bytes())
    )
}

/// Row label for a tensor: `weight [F16, (4096, 4096), 32.0 MB]`
pub fn leaf_label(record: &TensorRecord) -> String {
    format!(
        "{} [{}, {}, {}]",
        record.leaf_name(),
        record.dtype,
        format_shape(&record.shape),
        format_size(record.byte_size)
    )
}
