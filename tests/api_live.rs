//! Live render-service tests. Run with: `cargo test --features online -- --nocapture`
#![cfg(feature = "online")]

use gaia_rs::{Client, PlotConfig, message};
use gaia_rs::codec;

#[test]
fn render_three_points() {
    let records = codec::parse_records(
        "lonlat 40.44 -79.99 1.0\nlonlat 40.45 -79.98 2.0\nlonlat 40.46 -79.97 3.0\n",
    )
    .unwrap();
    let xml = message::build_message(&PlotConfig::default(), &[], &records);

    let dir = tempfile::tempdir().unwrap();
    let client = Client::default();
    let saved = client.render(&xml, &dir.path().join("three_points")).unwrap();
    assert!(saved.exists());
    assert!(std::fs::metadata(&saved).unwrap().len() > 0);
}
