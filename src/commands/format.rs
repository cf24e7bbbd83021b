//! Output formatting for CLI commands.
//!
//! Human-readable tables and status lines on stdout.

use crate::snapshot::{ContentValue, Snapshot};
use crate::store::WriteReport;

/// Print stored snapshots as a table.
pub fn print_snapshots(snapshots: &[Snapshot]) {
    if snapshots.is_empty() {
        println!("No snapshots stored");
        return;
    }

    println!("{:>5} {:<32} {:<19} {:>7}", "INDEX", "NAME", "CAPTURED", "FORMATS");
    println!("{}", "-".repeat(66));
    for (i, s) in snapshots.iter().enumerate() {
        println!(
            "{:>5} {:<32} {:<19} {:>7}",
            i,
            truncate(s.name(), 32),
            s.captured_at(),
            s.len()
        );
    }
}

/// Print the formats held by one snapshot.
pub fn print_contents(index: usize, snapshot: &Snapshot) {
    println!("Snapshot: {index} ({})", snapshot.name());
    println!("Captured: {}", snapshot.captured_at());
    if snapshot.is_empty() {
        println!("No contents");
        return;
    }

    println!("{:<40} {:<7} DETAIL", "FORMAT", "KIND");
    println!("{}", "-".repeat(70));
    for (key, value) in snapshot.contents() {
        println!(
            "{:<40} {:<7} {}",
            truncate(&key.identifiers().join(", "), 40),
            value.kind(),
            describe_value(value)
        );
    }
}

pub fn print_captured(snapshot: &Snapshot) {
    println!(
        "Captured {} ({} formats, {} storable)",
        snapshot.name(),
        snapshot.len(),
        snapshot.persistable_count()
    );
}

pub fn print_saved(index: usize, report: &WriteReport) {
    println!("Saved as snapshot {index} ({} in store)", report.snapshots);
    if report.empty > 0 {
        println!("  note: {} snapshot(s) stored without content", report.empty);
    }
    for diagnostic in &report.diagnostics {
        println!("  note: {diagnostic}");
    }
}

pub fn print_pasted(index: usize) {
    println!("Pasted snapshot {index}");
}

pub fn print_renamed(index: usize, snapshot: &Snapshot) {
    println!("Renamed snapshot {index} to {}", snapshot.name());
}

pub fn print_removed(index: usize, snapshot: &Snapshot) {
    println!("Removed snapshot {index} ({})", snapshot.name());
}

/// One-line summary of a value.
fn describe_value(value: &ContentValue) -> String {
    match value {
        ContentValue::Bytes(b) => format!("{} bytes, cursor {}", b.payload().len(), b.cursor()),
        ContentValue::Opaque(serde_json::Value::String(s)) => {
            format!("{:?}", truncate(s, 40))
        }
        ContentValue::Opaque(other) => truncate(&other.to_string(), 40),
        ContentValue::NonPersistable(h) => format!("{} (not storable)", h.type_name()),
    }
}

/// Shorten to at most `max` characters, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ByteContent;
    use serde_json::json;

    #[test]
    fn truncate_short_unchanged() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcde", 5), "abcde");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn describe_bytes() {
        let v = ContentValue::Bytes(ByteContent::new(vec![0; 10], 4).unwrap());
        assert_eq!(describe_value(&v), "10 bytes, cursor 4");
    }

    #[test]
    fn describe_text_and_structured() {
        assert_eq!(describe_value(&ContentValue::Opaque(json!("hi"))), "\"hi\"");
        assert_eq!(describe_value(&ContentValue::Opaque(json!([1, 2]))), "[1,2]");
    }

    #[test]
    fn describe_native() {
        let v = ContentValue::native(1u8);
        assert_eq!(describe_value(&v), "u8 (not storable)");
    }
}
