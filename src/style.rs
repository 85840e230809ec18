//! Style-file parsing and writing.
//!
//! A style file is line-oriented: `id=<int>` and `legend-support=<0|1>`
//! assignments plus one line per bin (`<color> <radius> <lower> <upper>`).
//! Bins are kept in file order; producers emit them ascending.

use crate::codec::ParseError;
use crate::models::{Abgr, COMMENT_FLAG, StyleBin, StyleTable};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

fn parse_style_line(table: &mut StyleTable, line: &str) -> Result<(), ParseError> {
    let first = line.split_whitespace().next().unwrap_or_default();
    if let Some((key, value)) = first.split_once('=') {
        match key {
            "id" => {
                table.style_id = value.parse().map_err(|_| ParseError::Number {
                    field: "style id",
                    token: value.to_string(),
                })?;
                return Ok(());
            }
            "legend-support" => {
                let flag: i32 = value.parse().map_err(|_| ParseError::Number {
                    field: "legend-support flag",
                    token: value.to_string(),
                })?;
                table.legend_support = flag != 0;
                return Ok(());
            }
            _ => {} // falls through to the bin parse below
        }
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(ParseError::FieldCount {
            keyword: "style bin",
            got: fields.len(),
            min: 4,
            max: 4,
        });
    }
    let color: Abgr = fields[0].parse().map_err(ParseError::Color)?;
    let radius: f64 = fields[1].parse().map_err(|_| ParseError::Number {
        field: "radius",
        token: fields[1].to_string(),
    })?;
    let lower_bound: f64 = fields[2].parse().map_err(|_| ParseError::Number {
        field: "lower bound",
        token: fields[2].to_string(),
    })?;
    let upper_bound: f64 = fields[3].parse().map_err(|_| ParseError::Number {
        field: "upper bound",
        token: fields[3].to_string(),
    })?;
    table.bins.push(StyleBin {
        color,
        radius,
        lower_bound,
        upper_bound,
    });
    Ok(())
}

/// Parse style-file contents. Comment and blank lines are skipped.
pub fn parse_style_str(input: &str) -> Result<StyleTable> {
    let mut table = StyleTable {
        style_id: 0,
        legend_support: false,
        bins: Vec::new(),
    };
    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT_FLAG) {
            continue;
        }
        parse_style_line(&mut table, line)
            .with_context(|| format!("invalid style line {}", idx + 1))?;
    }
    Ok(table)
}

/// Parse a style file from disk. See [`parse_style_str`].
pub fn parse_style_file<P: AsRef<Path>>(path: P) -> Result<StyleTable> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_style_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Render a table back to style-file text. Degenerate `(0, 0)` bins are
/// dropped, matching what binning produces for empty magnitude classes.
pub fn style_file_contents(table: &StyleTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id={}", table.style_id);
    if table.legend_support {
        out.push_str("legend-support=1\n");
    }
    for bin in &table.bins {
        if bin.lower_bound == 0.0 && bin.upper_bound == 0.0 {
            continue;
        }
        let _ = writeln!(
            out,
            "{} {} {} {}",
            bin.color, bin.radius, bin.lower_bound, bin.upper_bound
        );
    }
    out
}

/// Write a table to a style file.
pub fn write_style_file<P: AsRef<Path>>(table: &StyleTable, path: P) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, style_file_contents(table))
        .with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_style_file() {
        let input = "\
# population density style
id=2
legend-support=1
255.255.0.0 0 1 4
255.103.250.0 0 5 9
255.0.0.255 1.5 10 99
";
        let table = parse_style_str(input).unwrap();
        assert_eq!(table.style_id, 2);
        assert!(table.legend_support);
        assert_eq!(table.bins.len(), 3);
        assert_eq!(table.bins[0].color, Abgr::new(255, 255, 0, 0));
        assert_eq!(table.bins[2].radius, 1.5);
        assert_eq!(table.bins[2].lower_bound, 10.0);
        assert_eq!(table.bins[2].upper_bound, 99.0);
    }

    #[test]
    fn defaults_without_assignments() {
        let table = parse_style_str("255.0.0.0 0 1 2\n").unwrap();
        assert_eq!(table.style_id, 0);
        assert!(!table.legend_support);
        assert_eq!(table.bins.len(), 1);
    }

    #[test]
    fn bin_lines_keep_file_order() {
        // out-of-order bins are the producer's problem; the parser keeps them
        let input = "255.0.0.0 0 10 20\n255.0.0.1 0 1 5\n";
        let table = parse_style_str(input).unwrap();
        assert_eq!(table.bins[0].lower_bound, 10.0);
        assert_eq!(table.bins[1].lower_bound, 1.0);
    }

    #[test]
    fn bad_lines_name_their_position() {
        let err = parse_style_str("id=2\n255.0.0 0 1 2\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"), "{err:#}");

        let err = parse_style_str("255.0.0.0 0 1\n").unwrap_err();
        assert!(format!("{err:#}").contains("style bin"), "{err:#}");

        let err = parse_style_str("id=x\n").unwrap_err();
        assert!(format!("{err:#}").contains("style id"), "{err:#}");
    }

    #[test]
    fn contents_round_trip() {
        let input = "id=3\nlegend-support=1\n255.255.0.0 0 1 4\n255.0.0.255 0 5 9\n";
        let table = parse_style_str(input).unwrap();
        let text = style_file_contents(&table);
        let back = parse_style_str(&text).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn degenerate_bins_are_not_written() {
        let table = StyleTable::from_boundaries(
            1,
            false,
            &[(0.0, 0.0), (1.0, 5.0)],
            &[Abgr::new(255, 0, 0, 0), Abgr::new(255, 1, 1, 1)],
            0.0,
        );
        let text = style_file_contents(&table);
        assert!(!text.contains("0 0 0\n"));
        assert!(text.contains("255.1.1.1 0 1 5"));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.sty");
        let table = parse_style_str("id=9\n255.17.140.255 2 3 8\n").unwrap();
        write_style_file(&table, &path).unwrap();
        let back = parse_style_file(&path).unwrap();
        assert_eq!(back, table);
    }
}
