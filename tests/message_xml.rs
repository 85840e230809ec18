use gaia_rs::models::{DEFAULT_STYLE, DEFAULT_TIME_SEQ, StyleTable, WrapperRecord};
use gaia_rs::quantize;
use gaia_rs::{Abgr, PlotConfig, message};
use quick_xml::Reader;
use quick_xml::events::Event;

fn sample_records(n: usize) -> Vec<WrapperRecord> {
    (0..n)
        .map(|i| WrapperRecord::Point {
            lat: 40.0 + i as f64 / 100.0,
            lon: -80.0,
            value: i as f64,
            style_id: DEFAULT_STYLE,
            time: DEFAULT_TIME_SEQ,
        })
        .collect()
}

/// Collect (element name, text) pairs from a document.
fn flatten(xml: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut out = Vec::new();
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf).expect("well-formed xml") {
            Event::Start(e) => {
                current = String::from_utf8_lossy(e.name().as_ref()).to_string();
                text.clear();
            }
            Event::Text(t) => text.push_str(&t.unescape().expect("unescape")),
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == current {
                    out.push((name, text.clone()));
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    out
}

#[test]
fn document_is_well_formed_xml() {
    let (colors, boundaries) = quantize::compute_percent_boundaries(25.0, 8.0);
    let table = StyleTable::from_boundaries(2, true, &boundaries, &colors, 0.0);
    let config = PlotConfig {
        title: Some("Infection spread & recovery".into()),
        legend: Some("cases".into()),
        background_color: Some(Abgr::new(255, 255, 255, 255)),
        ..PlotConfig::default()
    };
    let records = sample_records(10);
    let xml = message::build_message(&config, &[table], &records);

    let elements = flatten(&xml);
    let names: Vec<&str> = elements.iter().map(|(n, _)| n.as_str()).collect();
    assert!(names.contains(&"output-format"));
    assert!(names.contains(&"title"));
    assert!(names.contains(&"wrapper-raw"));

    // escaping round-trips through a real XML parser
    let title = elements
        .iter()
        .find(|(n, _)| n == "title")
        .map(|(_, t)| t.as_str())
        .unwrap();
    assert_eq!(title, "Infection spread & recovery");
}

#[test]
fn style_list_carries_one_entry_per_bin() {
    let (colors, boundaries) = quantize::compute_percent_boundaries(25.0, 8.0);
    let table = StyleTable::from_boundaries(3, false, &boundaries, &colors, 0.5);
    let xml = message::build_message(&PlotConfig::default(), &[table], &[]);

    let elements = flatten(&xml);
    let color_count = elements.iter().filter(|(n, _)| n == "color").count();
    let lower_count = elements.iter().filter(|(n, _)| n == "lower-bound").count();
    assert_eq!(color_count, 6);
    assert_eq!(lower_count, 6);
    assert!(xml.contains(r#"<style-range-list style-id="3" legend-support="0">"#));
}

#[test]
fn small_record_set_uses_one_chunk() {
    let xml = message::build_message(&PlotConfig::default(), &[], &sample_records(5));
    assert_eq!(xml.matches("<wrapper-raw>").count(), 1);
}

#[test]
fn large_record_set_spreads_over_chunks_and_loses_nothing() {
    let records = sample_records(2000);
    let xml = message::build_message(&PlotConfig::default(), &[], &records);
    let chunk_count = xml.matches("<wrapper-raw>").count();
    assert!(chunk_count > 1, "expected chunked wrapper-raw");

    let elements = flatten(&xml);
    let payload: String = elements
        .iter()
        .filter(|(n, _)| n == "wrapper-raw")
        .map(|(_, t)| t.as_str())
        .collect();
    let record_lines: Vec<&str> = payload.split(':').filter(|s| !s.is_empty()).collect();
    assert_eq!(record_lines.len(), 2000);
    assert!(record_lines[0].starts_with("lonlat "));
}
