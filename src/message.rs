//! Assembles the request document sent to the render service.
//!
//! The document has root `<gaia>`: optional configuration elements first,
//! then one `<style-range-list>` per style table, then the serialized
//! records inside `<wrapper-raw>` elements chunked at a fixed byte
//! threshold. Unset configuration fields are omitted entirely, never
//! emitted empty.

use crate::codec;
use crate::models::{
    Abgr, NORMALIZED_GEOMETRY, StyleTable, WRAPPER_BUFFER_SIZE, WRAPPER_RAW_DELIMITER,
    WrapperRecord,
};
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Rendering configuration carried in the message head.
///
/// Optional fields produce no element when unset; numeric fields use a
/// negative sentinel (or zero for `num_gradients`) the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Image format for single frames (`gif` or `png`).
    pub output_format: String,
    /// Container for animated output (`tar`, `mpg`, `mov`, `mp4`).
    pub bundle_format: Option<String>,
    pub num_gradients: u32,
    pub max_resolution: f64,
    pub start_color: Option<Abgr>,
    pub end_color: Option<Abgr>,
    pub start_radius: f64,
    pub end_radius: f64,
    /// Reproject the image instead of plotting raw coordinates.
    pub project_image: bool,
    pub font: Option<String>,
    pub font_size: f64,
    pub legend_font_size: f64,
    pub background_color: Option<Abgr>,
    pub stroke_width: f64,
    pub title: Option<String>,
    pub legend: Option<String>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output_format: "png".into(),
            bundle_format: None,
            num_gradients: 0,
            max_resolution: NORMALIZED_GEOMETRY,
            start_color: None,
            end_color: None,
            start_radius: -1.0,
            end_radius: -1.0,
            project_image: false,
            font: None,
            font_size: 24.0,
            legend_font_size: 16.0,
            background_color: None,
            stroke_width: 1.0,
            title: None,
            legend: None,
        }
    }
}

fn push_element(xml: &mut String, tag: &str, text: &str) {
    let _ = write!(xml, "<{tag}>{}</{tag}>", escape(text));
}

fn push_config(xml: &mut String, config: &PlotConfig) {
    push_element(xml, "output-format", &config.output_format);
    if let Some(bundle) = &config.bundle_format {
        push_element(xml, "bundle-format", bundle);
    }
    if config.num_gradients > 0 {
        push_element(xml, "num-gradients", &config.num_gradients.to_string());
    }
    if config.max_resolution > 0.0 {
        push_element(xml, "max-resolution", &config.max_resolution.to_string());
    }
    if let Some(color) = &config.start_color {
        push_element(xml, "start-color", &color.to_string());
    }
    if let Some(color) = &config.end_color {
        push_element(xml, "end-color", &color.to_string());
    }
    if config.start_radius > -1.0 {
        push_element(xml, "start-radius", &config.start_radius.to_string());
    }
    if config.end_radius > -1.0 {
        push_element(xml, "end-radius", &config.end_radius.to_string());
    }
    if let Some(font) = &config.font {
        push_element(xml, "font-type", font);
    }
    if config.font_size > -1.0 {
        push_element(xml, "font-size", &config.font_size.to_string());
    }
    if config.legend_font_size > -1.0 {
        push_element(
            xml,
            "legend-font-size",
            &config.legend_font_size.to_string(),
        );
    }
    if let Some(color) = &config.background_color {
        push_element(xml, "background-color", &color.to_string());
    }
    if config.stroke_width > -1.0 {
        push_element(xml, "stroke-width", &config.stroke_width.to_string());
    }
    if config.project_image {
        push_element(xml, "project-image", "1");
    }
    if let Some(title) = &config.title {
        push_element(xml, "title", title);
    }
    if let Some(legend) = &config.legend {
        push_element(xml, "legend-text", legend);
    }
}

fn push_styles(xml: &mut String, styles: &[StyleTable]) {
    for table in styles {
        let _ = write!(
            xml,
            r#"<style-range-list style-id="{}" legend-support="{}">"#,
            table.style_id, table.legend_support as i32
        );
        for bin in &table.bins {
            let _ = write!(
                xml,
                "<color>{}</color><radius>{:.6}</radius>\
                 <lower-bound>{:.6}</lower-bound><upper-bound>{:.6}</upper-bound>",
                bin.color, bin.radius, bin.lower_bound, bin.upper_bound
            );
        }
        xml.push_str("</style-range-list>");
    }
}

fn push_records(xml: &mut String, records: &[WrapperRecord]) {
    xml.push_str("<wrapper-raw>");
    let mut running = 0usize;
    for record in records {
        let mut piece = codec::serialize(record);
        piece.push(WRAPPER_RAW_DELIMITER);
        // a record never straddles two elements; when it would push the
        // running count past the threshold it opens the next element
        running += piece.len();
        if running > WRAPPER_BUFFER_SIZE {
            xml.push_str("</wrapper-raw><wrapper-raw>");
            running = piece.len();
        }
        let _ = write!(xml, "{}", escape(piece.as_str()));
    }
    xml.push_str("</wrapper-raw>");
}

/// Build the full request document.
pub fn build_message(
    config: &PlotConfig,
    styles: &[StyleTable],
    records: &[WrapperRecord],
) -> String {
    let mut xml =
        String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?><gaia>"#);
    push_config(&mut xml, config);
    push_styles(&mut xml, styles);
    push_records(&mut xml, records);
    xml.push_str("</gaia>");
    xml
}
