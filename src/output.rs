//! CLI output formatting for one-shot resizes.
//!
//! # Output Format
//!
//! ```text
//! photo.jpg (4 sizes, quality 80)
//!     64x64: 2.1 KB
//!     128x128: 6.8 KB
//!     abc: failed (invalid size: size 'abc' is not of the form <width>x<height>)
//!     (blank): skipped
//! Encoded 2 of 3 sizes
//! ```
//!
//! Lines follow the label order of the request, not completion order.
//!
//! # Architecture
//!
//! [`format_resize_report`] returns `Vec<String>` for testability and
//! [`print_resize_report`] writes it to stdout. The format function is pure.

use crate::dispatch::ResultSet;
use crate::imaging::{ItemStatus, Quality, ResultItem};
use crate::sizes::SizeToken;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Byte count of the image inside a base64 data URI.
fn decoded_len(payload: &str) -> usize {
    let data = payload.split_once(',').map_or(payload, |(_, data)| data);
    let padding = data.bytes().rev().take_while(|b| *b == b'=').count();
    (data.len() / 4 * 3).saturating_sub(padding)
}

/// Human-readable size: bytes below 1 KiB, otherwise KB/MB with one decimal.
fn human_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let value = bytes as f64;
    if value < KB {
        format!("{bytes} B")
    } else if value < KB * KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{:.1} MB", value / (KB * KB))
    }
}

fn item_line(item: &ResultItem) -> String {
    let label = if item.label.is_empty() {
        "(blank)"
    } else {
        item.label.as_str()
    };
    let status = match &item.status {
        ItemStatus::Encoded => human_bytes(decoded_len(&item.payload)),
        ItemStatus::Blank => "skipped".to_string(),
        ItemStatus::Failed(reason) => format!("failed ({reason})"),
        ItemStatus::Cancelled => "cancelled".to_string(),
    };
    format!("{}{}: {}", indent(1), label, status)
}

/// Format the outcome of resizing `source` into the requested sizes.
///
/// `requested` fixes the display order; every result is matched to the first
/// unused token with the same label.
pub fn format_resize_report(
    source: &str,
    requested: &[SizeToken],
    quality: Quality,
    results: &ResultSet,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({} sizes, quality {})",
        source,
        requested.len(),
        quality
    )];

    let mut remaining: Vec<&ResultItem> = results.items().iter().collect();
    for token in requested {
        if let Some(pos) = remaining.iter().position(|item| item.label == token.as_str()) {
            lines.push(item_line(remaining.remove(pos)));
        }
    }
    // Anything not matched by label still gets shown.
    lines.extend(remaining.into_iter().map(item_line));

    let attempted = results
        .items()
        .iter()
        .filter(|item| item.status != ItemStatus::Blank)
        .count();
    let encoded = results.items().iter().filter(|i| i.is_usable()).count();
    lines.push(format!("Encoded {encoded} of {attempted} sizes"));
    lines
}

pub fn print_resize_report(
    source: &str,
    requested: &[SizeToken],
    quality: Quality,
    results: &ResultSet,
) {
    for line in format_resize_report(source, requested, quality, results) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{OutputFormat, to_data_uri};
    use crate::sizes::split_size_list;

    #[test]
    fn decoded_len_accounts_for_padding() {
        let uri = to_data_uri(b"hello", OutputFormat::Jpeg);
        assert_eq!(decoded_len(&uri), 5);
        let uri = to_data_uri(b"hello!", OutputFormat::Jpeg);
        assert_eq!(decoded_len(&uri), 6);
        assert_eq!(decoded_len(""), 0);
    }

    #[test]
    fn human_bytes_units() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KB");
        assert_eq!(human_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn report_follows_request_order() {
        let requested = split_size_list("5x5;abc;;20x20");
        let results = ResultSet::from(vec![
            ResultItem::encoded("20x20", to_data_uri(&[0; 2048], OutputFormat::Jpeg)),
            ResultItem::blank(),
            ResultItem::failed("abc", "invalid size"),
            ResultItem::encoded("5x5", to_data_uri(&[0; 100], OutputFormat::Jpeg)),
        ]);

        let lines =
            format_resize_report("photo.png", &requested, Quality::new(80).unwrap(), &results);
        assert_eq!(
            lines,
            vec![
                "photo.png (4 sizes, quality 80)",
                "    5x5: 100 B",
                "    abc: failed (invalid size)",
                "    (blank): skipped",
                "    20x20: 2.0 KB",
                "Encoded 2 of 3 sizes",
            ]
        );
    }

    #[test]
    fn duplicate_labels_each_get_a_line() {
        let requested = split_size_list("5x5;5x5");
        let results = ResultSet::from(vec![
            ResultItem::encoded("5x5", to_data_uri(b"a", OutputFormat::Jpeg)),
            ResultItem::cancelled("5x5"),
        ]);
        let lines = format_resize_report("a.png", &requested, Quality::default(), &results);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "    5x5: 1 B");
        assert_eq!(lines[2], "    5x5: cancelled");
        assert_eq!(lines[3], "Encoded 1 of 2 sizes");
    }
}
