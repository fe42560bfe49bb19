//! Plain-text renderings of datasets: the per-dataset report and the history listing.

use std::{collections::BTreeMap, fmt::Write as _};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::store::Dataset;

pub const REPORT_TITLE: &str = "Chemical Equipment Dataset Report";

/// Text of the dataset report, one line per entry.
///
/// Summary mappings are written the way a Python dict prints: quoted keys,
/// floats always carrying a fraction, `None` for a missing average.
pub fn render_report(dataset: &Dataset) -> String {
    let summary = &dataset.summary;
    let mut output = String::new();
    let _ = writeln!(output, "{REPORT_TITLE}");
    let _ = writeln!(output, "Dataset ID: {}", dataset.id);
    let _ = writeln!(output, "Uploaded at: {}", isoformat(&dataset.uploaded_at));
    let _ = writeln!(output, "Summary:");
    let _ = writeln!(output, "  total_count: {}", summary.total_count);
    let averages = summary.averages.iter().map(|(name, value)| {
        let rendered = value.map_or_else(|| "None".to_string(), format_float);
        (name.as_str(), rendered)
    });
    let _ = writeln!(output, "  averages: {}", format_dict(averages));
    let anomalies = summary
        .anomalies
        .iter()
        .map(|(name, count)| (name.as_str(), count.to_string()));
    let _ = writeln!(output, "  anomalies: {}", format_dict(anomalies));
    let _ = writeln!(
        output,
        "  type_distribution: {}",
        format_dict(ranked_counts(&summary.type_distribution))
    );
    output
}

/// ISO-8601 timestamp with microsecond precision, dropping a zero fraction.
pub fn isoformat(timestamp: &DateTime<Utc>) -> String {
    let precision = if timestamp.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    timestamp.to_rfc3339_opts(precision, false)
}

/// Categories by descending count, ties by name.
fn ranked_counts(counts: &BTreeMap<String, usize>) -> Vec<(&str, String)> {
    let mut items = counts.iter().collect::<Vec<_>>();
    items.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    items
        .into_iter()
        .map(|(name, count)| (name.as_str(), count.to_string()))
        .collect()
}

fn format_dict<'a>(entries: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let entries = entries
        .into_iter()
        .map(|(key, value)| format!("{}: {value}", quote(key)))
        .collect::<Vec<_>>();
    format!("{{{}}}", entries.join(", "))
}

fn quote(text: &str) -> String {
    let delimiter = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(delimiter);
    for ch in text.chars() {
        if ch == '\\' || ch == delimiter {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push(delimiter);
    quoted
}

/// Shortest round-trip float text with a fraction or exponent always present.
fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || (1e-4..1e16).contains(&magnitude) {
        let text = value.to_string();
        if text.contains('.') {
            text
        } else {
            format!("{text}.0")
        }
    } else {
        let text = format!("{value:e}");
        match text.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => text,
        }
    }
}

/// Aligned table of `id`, `uploaded_at` and `total_count`, newest first as given.
pub fn render_listing(datasets: &[Dataset]) -> String {
    let headers = ["id", "uploaded_at", "total_count"];
    let rows = datasets
        .iter()
        .map(|d| {
            [
                d.id.to_string(),
                isoformat(&d.uploaded_at),
                d.summary.total_count.to_string(),
            ]
        })
        .collect::<Vec<_>>();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(&headers, &widths));
    let separator = widths.map(|w| "-".repeat(w));
    let _ = writeln!(output, "{}", format_line(&separator, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

fn format_line<S: AsRef<str>>(cells: &[S; 3], widths: &[usize; 3]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike, Utc};

    use super::*;
    use crate::{storage::FileHandle, summary::Summary};

    fn dataset() -> Dataset {
        Dataset {
            id: 7,
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            file: FileHandle::new("datasets/x.csv"),
            summary: Summary {
                total_count: 3,
                averages: BTreeMap::from([
                    ("Flowrate".to_string(), Some(20.5)),
                    ("Pressure".to_string(), None),
                ]),
                anomalies: BTreeMap::from([
                    ("Flowrate".to_string(), 1),
                    ("Pressure".to_string(), 0),
                ]),
                type_distribution: BTreeMap::from([("Pump".to_string(), 3)]),
            },
        }
    }

    #[test]
    fn report_lists_header_and_summary_entries() {
        let text = render_report(&dataset());
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "Chemical Equipment Dataset Report",
                "Dataset ID: 7",
                "Uploaded at: 2024-03-01T12:30:00+00:00",
                "Summary:",
                "  total_count: 3",
                "  averages: {'Flowrate': 20.5, 'Pressure': None}",
                "  anomalies: {'Flowrate': 1, 'Pressure': 0}",
                "  type_distribution: {'Pump': 3}",
            ]
        );
    }

    #[test]
    fn report_prints_integral_means_as_floats_with_microsecond_timestamp() {
        let mut dataset = dataset();
        dataset.uploaded_at = Utc
            .with_ymd_and_hms(2026, 10, 19, 11, 6, 27)
            .unwrap()
            .with_nanosecond(146_609_000)
            .unwrap();
        dataset.summary.averages = BTreeMap::from([("Temperature".to_string(), Some(110.0))]);
        dataset.summary.type_distribution = BTreeMap::from([
            ("Pump".to_string(), 2),
            ("Valve".to_string(), 5),
            ("O'Ring".to_string(), 2),
        ]);

        let text = render_report(&dataset);
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[2], "Uploaded at: 2026-10-19T11:06:27.146609+00:00");
        assert_eq!(lines[5], "  averages: {'Temperature': 110.0}");
        assert_eq!(
            lines[7],
            "  type_distribution: {'Valve': 5, \"O'Ring\": 2, 'Pump': 2}"
        );
    }

    #[test]
    fn floats_follow_python_repr() {
        assert_eq!(format_float(110.0), "110.0");
        assert_eq!(format_float(111.5), "111.5");
        assert_eq!(format_float(-0.25), "-0.25");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
    }

    #[test]
    fn listing_aligns_columns() {
        let text = render_listing(&[dataset()]);
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "id  uploaded_at                total_count");
        assert_eq!(lines[2], "7   2024-03-01T12:30:00+00:00  3");
    }
}
