//! CSV report of the snapshot history
//!
//! One row per successful command. The header is the key set of the first
//! row in sorted order; later rows fill missing columns with empty cells.

use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Render `rows` as CSV text
pub fn render_csv(rows: &[BTreeMap<String, String>]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let header: Vec<&String> = first.keys().collect();

    let mut out = String::new();
    push_record(&mut out, header.iter().map(|key| key.as_str()));

    for (index, row) in rows.iter().enumerate() {
        let dropped = row.keys().filter(|key| !first.contains_key(*key)).count();
        if dropped > 0 {
            warn!("report row {}: {} column(s) not in header, dropped", index, dropped);
        }
        push_record(
            &mut out,
            header.iter().map(|key| row.get(*key).map(String::as_str).unwrap_or("")),
        );
    }
    out
}

/// Write the report to `path`
pub fn write_csv(path: &Path, rows: &[BTreeMap<String, String>]) -> Result<()> {
    fs::write(path, render_csv(rows))
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    info!("wrote {} row(s) to {}", rows.len(), path.display());
    Ok(())
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_header_from_first_row() {
        let rows = vec![
            row(&[("swapFee", "2000"), ("TKN.reserveRate", "1")]),
            row(&[("swapFee", "2000"), ("TKN.reserveRate", "2")]),
        ];

        let csv = render_csv(&rows);

        assert_eq!(csv, "TKN.reserveRate,swapFee\n1,2000\n2,2000\n");
    }

    #[test]
    fn test_missing_and_extra_columns() {
        let rows = vec![
            row(&[("a", "1"), ("b", "2")]),
            row(&[("a", "3"), ("c", "9")]),
        ];

        assert_eq!(render_csv(&rows), "a,b\n1,2\n3,\n");
    }

    #[test]
    fn test_quoting() {
        let rows = vec![row(&[("k", "say \"hi\", twice")])];
        assert_eq!(render_csv(&rows), "k\n\"say \"\"hi\"\", twice\"\n");
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(render_csv(&[]), "");
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        write_csv(&path, &[row(&[("swapFee", "0")])]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "swapFee\n0\n");
    }
}
