//! gaia-rs
//!
//! A lightweight Rust library for talking to a GAIA map-rendering service:
//! parse plottable elements and style tables from their line formats, bin
//! magnitudes into color ramps, assemble the XML request, and save the
//! rendered artifact. Pairs with the `gaia` CLI.
//!
//! ### Features
//! - Parse/serialize point, region, label, path, and polygon records
//! - Equal-count and percentile value binning for choropleth styles
//! - Request assembly with bounded-size record chunks
//! - Blocking request/response exchange with artifact persistence
//!
//! ### Example
//! ```no_run
//! use gaia_rs::{Client, PlotConfig};
//! use std::path::Path;
//!
//! let records = gaia_rs::codec::parse_record_file("us_prevalence.txt")?;
//! let style = gaia_rs::style::parse_style_file("prevalence.sty")?;
//! let xml = gaia_rs::message::build_message(&PlotConfig::default(), &[style], &records);
//! let client = Client::default();
//! let saved = client.render(&xml, Path::new("us_prevalence"))?;
//! println!("wrote {}", saved.display());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod codec;
pub mod message;
pub mod models;
pub mod quantize;
pub mod style;

pub use api::Client;
pub use message::PlotConfig;
pub use models::{Abgr, CodingScheme, StyleBin, StyleTable, WrapperRecord};
