//! Line codec for the render-service input format.
//!
//! One element per line (`lonlat`, `usfips`, `hasc`, `lonlat-label`), except
//! paths and polygons which are spread over several lines sharing a leading
//! integer id. Parsing is all-or-nothing: any malformed line aborts the whole
//! input with an error naming the offending line.

use crate::models::{
    COMMENT_FLAG, CodingScheme, ColorParseError, DEFAULT_STYLE, DEFAULT_TIME_SEQ,
    VALUE_STYLE_DELIMITER, WrapperRecord,
};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Fatal record-format errors. Each one aborts the input; no partial record
/// list is ever produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{keyword} record has {got} fields, expected {min} to {max}")]
    FieldCount {
        keyword: &'static str,
        got: usize,
        min: usize,
        max: usize,
    },
    #[error("record has more than one `value:style` field")]
    AmbiguousStyle,
    #[error("lonlat-label record has no quoted label")]
    MissingLabel,
    #[error("lonlat-label record has an unterminated label quote")]
    UnterminatedLabel,
    #[error("unsupported element type `{0}`")]
    UnsupportedType(String),
    #[error("invalid {field} `{token}`")]
    Number { field: &'static str, token: String },
    #[error(transparent)]
    Color(#[from] ColorParseError),
    #[error("{keyword} {id} records disagree on value, time, or style")]
    InconsistentGroup { keyword: &'static str, id: i64 },
    #[error("{keyword} {id} needs at least two vertex records")]
    ShortGroup { keyword: &'static str, id: i64 },
    #[error("{0} records span multiple lines; parse them as a group")]
    MultiLineType(&'static str),
}

fn num<T: std::str::FromStr>(token: &str, field: &'static str) -> Result<T, ParseError> {
    token.parse::<T>().map_err(|_| ParseError::Number {
        field,
        token: token.to_string(),
    })
}

/// Pulls the single optional `<value>:<styleId>` suffix out of the remaining
/// fields, leaving the bare value behind. Two fields carrying the delimiter
/// is the ambiguous-style error.
fn extract_style(fields: &mut [String]) -> Result<i32, ParseError> {
    let mut style_id = DEFAULT_STYLE;
    let mut found = false;
    for field in fields.iter_mut() {
        if let Some((value_part, style_part)) = field.split_once(VALUE_STYLE_DELIMITER) {
            if found {
                return Err(ParseError::AmbiguousStyle);
            }
            found = true;
            let token = style_part
                .split(VALUE_STYLE_DELIMITER)
                .next()
                .unwrap_or(style_part);
            style_id = num(token, "style id")?;
            *field = value_part.to_string();
        }
    }
    Ok(style_id)
}

/// Splits off the trailing value/style/time fields shared by every type:
/// returns `(value, style_id, time)` and consumes all remaining fields.
fn parse_tail(mut fields: Vec<String>) -> Result<(f64, i32, f64), ParseError> {
    let style_id = extract_style(&mut fields)?;
    let mut rest = fields.into_iter();
    let value = match rest.next() {
        Some(token) => num(&token, "value")?,
        None => return Err(ParseError::Number {
            field: "value",
            token: String::new(),
        }),
    };
    let time = match rest.next() {
        Some(token) => num(&token, "time")?,
        None => DEFAULT_TIME_SEQ,
    };
    Ok((value, style_id, time))
}

fn check_field_count(
    keyword: &'static str,
    got: usize,
    min: usize,
    max: usize,
) -> Result<(), ParseError> {
    if got < min || got > max {
        return Err(ParseError::FieldCount {
            keyword,
            got,
            min,
            max,
        });
    }
    Ok(())
}

fn parse_point(rest: &str) -> Result<WrapperRecord, ParseError> {
    let mut fields: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
    check_field_count("lonlat", fields.len(), 3, 4)?;
    let lat: f64 = num(&fields.remove(0), "latitude")?;
    let lon: f64 = num(&fields.remove(0), "longitude")?;
    let (value, style_id, time) = parse_tail(fields)?;
    Ok(WrapperRecord::Point {
        lat,
        lon,
        value,
        style_id,
        time,
    })
}

fn parse_region(rest: &str, scheme: CodingScheme) -> Result<WrapperRecord, ParseError> {
    let mut fields: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
    check_field_count(scheme.keyword(), fields.len(), 2, 3)?;
    let code = fields.remove(0);
    let (value, style_id, time) = parse_tail(fields)?;
    Ok(WrapperRecord::Region {
        code,
        scheme,
        value,
        style_id,
        time,
    })
}

fn parse_label(rest: &str) -> Result<WrapperRecord, ParseError> {
    let open = rest.find('"').ok_or(ParseError::MissingLabel)?;
    let close = rest[open + 1..]
        .find('"')
        .map(|i| i + open + 1)
        .ok_or(ParseError::UnterminatedLabel)?;
    let label = rest[open + 1..close].to_string();
    let remainder = &rest[close + 1..];

    let mut fields: Vec<String> = remainder.split_whitespace().map(str::to_string).collect();
    check_field_count("lonlat-label", fields.len(), 3, 4)?;
    let lat: f64 = num(&fields.remove(0), "latitude")?;
    let lon: f64 = num(&fields.remove(0), "longitude")?;
    let (value, style_id, time) = parse_tail(fields)?;
    Ok(WrapperRecord::Label {
        lat,
        lon,
        label,
        value,
        style_id,
        time,
    })
}

/// Parses the collected lines of one path/polygon id. `rests` holds each
/// contributing line with the type keyword already stripped.
fn parse_vertex_group(
    keyword: &'static str,
    id: i64,
    rests: &[String],
) -> Result<WrapperRecord, ParseError> {
    if rests.len() < 2 {
        return Err(ParseError::ShortGroup { keyword, id });
    }

    let mut vertices = Vec::with_capacity(rests.len());
    let mut value = 0.0;
    let mut time = DEFAULT_TIME_SEQ;
    let mut style_id = DEFAULT_STYLE;
    for (i, rest) in rests.iter().enumerate() {
        let mut fields: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
        check_field_count(keyword, fields.len(), 4, 5)?;
        let line_id: i64 = num(&fields.remove(0), "id")?;
        let lat: f64 = num(&fields.remove(0), "latitude")?;
        let lon: f64 = num(&fields.remove(0), "longitude")?;
        let (line_value, line_style, line_time) = parse_tail(fields)?;

        if i == 0 {
            value = line_value;
            time = line_time;
            style_id = line_style;
        } else if line_id != id || line_value != value || line_time != time || line_style != style_id
        {
            return Err(ParseError::InconsistentGroup { keyword, id });
        }
        vertices.push((lon, lat));
    }

    Ok(if keyword == "lonlat-path" {
        WrapperRecord::Path {
            id,
            vertices,
            value,
            style_id,
            time,
        }
    } else {
        WrapperRecord::Polygon {
            id,
            vertices,
            value,
            style_id,
            time,
        }
    })
}

fn split_keyword(line: &str) -> (String, &str) {
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword.to_ascii_lowercase(), rest.trim_start()),
        None => (line.to_ascii_lowercase(), ""),
    }
}

/// Parse one single-line record (`lonlat`, `usfips`, `hasc`, `lonlat-label`).
///
/// Path and polygon lines are rejected here; feed those to [`parse_group`]
/// or parse the whole input with [`parse_records`].
pub fn parse_record(line: &str) -> Result<WrapperRecord, ParseError> {
    let (keyword, rest) = split_keyword(line.trim());
    match keyword.as_str() {
        "lonlat" => parse_point(rest),
        "usfips" => parse_region(rest, CodingScheme::UsFips),
        "hasc" => parse_region(rest, CodingScheme::Hasc),
        "lonlat-label" => parse_label(rest),
        "lonlat-path" => Err(ParseError::MultiLineType("lonlat-path")),
        "lonlat-poly" => Err(ParseError::MultiLineType("lonlat-poly")),
        other => Err(ParseError::UnsupportedType(other.to_string())),
    }
}

/// Parse the lines of one path or polygon (all sharing one leading id).
pub fn parse_group<S: AsRef<str>>(lines: &[S]) -> Result<WrapperRecord, ParseError> {
    let first = lines
        .first()
        .map(|l| l.as_ref().trim())
        .unwrap_or_default();
    let (first_keyword, first_rest) = split_keyword(first);
    let keyword = match first_keyword.as_str() {
        "lonlat-path" => "lonlat-path",
        "lonlat-poly" => "lonlat-poly",
        other => return Err(ParseError::UnsupportedType(other.to_string())),
    };
    let id_token = first_rest.split_whitespace().next().unwrap_or_default();
    let id: i64 = num(id_token, "id")?;

    let mut rests = Vec::with_capacity(lines.len());
    for line in lines {
        let (line_keyword, rest) = split_keyword(line.as_ref().trim());
        if line_keyword != keyword {
            return Err(ParseError::InconsistentGroup { keyword, id });
        }
        rests.push(rest.to_string());
    }
    parse_vertex_group(keyword, id, &rests)
}

struct PendingGroup {
    first_line: usize,
    rests: Vec<String>,
}

/// Parse a whole input into records.
///
/// Single-line records come out in input order, followed by paths and then
/// polygons, each ordered by the first appearance of their id. Comment lines
/// (`#`) and blank lines are skipped. The first malformed line fails the
/// whole parse.
pub fn parse_records(input: &str) -> Result<Vec<WrapperRecord>> {
    let mut singles: Vec<WrapperRecord> = Vec::new();
    let mut paths: IndexMap<i64, PendingGroup> = IndexMap::new();
    let mut polys: IndexMap<i64, PendingGroup> = IndexMap::new();

    for (idx, raw) in input.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT_FLAG) {
            continue;
        }
        let (keyword, rest) = split_keyword(line);
        match keyword.as_str() {
            "lonlat-path" | "lonlat-poly" => {
                let id_token = rest.split_whitespace().next().unwrap_or_default();
                let id: i64 = num(id_token, "id")
                    .with_context(|| format!("invalid record on line {lineno}"))?;
                let groups = if keyword == "lonlat-path" {
                    &mut paths
                } else {
                    &mut polys
                };
                groups
                    .entry(id)
                    .or_insert_with(|| PendingGroup {
                        first_line: lineno,
                        rests: Vec::new(),
                    })
                    .rests
                    .push(rest.to_string());
            }
            _ => {
                let record = parse_record(line)
                    .with_context(|| format!("invalid record on line {lineno}"))?;
                singles.push(record);
            }
        }
    }

    for (keyword, groups) in [("lonlat-path", paths), ("lonlat-poly", polys)] {
        for (id, group) in groups {
            let record = parse_vertex_group(keyword, id, &group.rests).with_context(|| {
                format!(
                    "invalid {keyword} group starting on line {}",
                    group.first_line
                )
            })?;
            singles.push(record);
        }
    }

    Ok(singles)
}

/// Parse a record file from disk. See [`parse_records`].
pub fn parse_record_file<P: AsRef<Path>>(path: P) -> Result<Vec<WrapperRecord>> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_records(&contents).with_context(|| format!("parse {}", path.display()))
}

fn push_tail(out: &mut String, value: f64, style_id: i32, time: f64) {
    if style_id == DEFAULT_STYLE {
        let _ = write!(out, " {value}");
    } else {
        let _ = write!(out, " {value}{VALUE_STYLE_DELIMITER}{style_id}");
    }
    if time != DEFAULT_TIME_SEQ {
        let _ = write!(out, " {time}");
    }
}

/// Serialize a record back to its input-format text.
///
/// The output is the exact inverse of parsing: default style and time are
/// omitted, and paths/polygons come out as one line per vertex, so
/// `parse_records(serialize(r)) == [r]` for any valid record.
pub fn serialize(record: &WrapperRecord) -> String {
    let mut out = String::new();
    match record {
        WrapperRecord::Point {
            lat,
            lon,
            value,
            style_id,
            time,
        } => {
            let _ = write!(out, "lonlat {lat} {lon}");
            push_tail(&mut out, *value, *style_id, *time);
        }
        WrapperRecord::Region {
            code,
            scheme,
            value,
            style_id,
            time,
        } => {
            let _ = write!(out, "{} {code}", scheme.keyword());
            push_tail(&mut out, *value, *style_id, *time);
        }
        WrapperRecord::Label {
            lat,
            lon,
            label,
            value,
            style_id,
            time,
        } => {
            let _ = write!(out, "lonlat-label \"{label}\" {lat} {lon}");
            push_tail(&mut out, *value, *style_id, *time);
        }
        WrapperRecord::Path {
            id,
            vertices,
            value,
            style_id,
            time,
        }
        | WrapperRecord::Polygon {
            id,
            vertices,
            value,
            style_id,
            time,
        } => {
            let keyword = record.keyword();
            for (i, (lon, lat)) in vertices.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                let _ = write!(out, "{keyword} {id} {lat} {lon}");
                push_tail(&mut out, *value, *style_id, *time);
            }
        }
    }
    out
}
