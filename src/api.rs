//! Synchronous client for the GAIA render service.
//!
//! One call, one artifact: the XML message goes out as the request body and
//! the response body is written verbatim to disk, with the file extension
//! chosen from the response content type. There is no retry and no
//! streaming; the call blocks until the full response is read or the
//! request times out.

use crate::models::{GENERIC_EXTENSION, extension_for_mime};
use anyhow::{Context, Result, bail};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Well-known host of the public render service.
pub const DEFAULT_HOST: &str = "gaia.psc.edu";
/// Port the render service listens on.
pub const DEFAULT_PORT: u16 = 13500;

/// Content type declared on the outbound message.
const REQUEST_CONTENT_TYPE: &str = "text/xml; charset=ISO-8859-1";

#[derive(Debug, Clone)]
pub struct Client {
    pub host: String,
    pub port: u16,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl Client {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(300)) // renders of large inputs are slow
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("gaia_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client build");
        Self {
            host: host.into(),
            port,
            http,
        }
    }

    /// Submit a message and save the returned artifact.
    ///
    /// ### Arguments
    /// - `message`: the full XML document (see `message::build_message`).
    /// - `output_base`: artifact path without extension; the extension is
    ///   appended from the response content type.
    ///
    /// ### Returns
    /// The path the artifact was written to.
    ///
    /// ### Errors
    /// - Network/HTTP error, or a non-success status
    /// - Empty response body (the service rendered nothing)
    /// - Filesystem error writing the artifact
    ///
    /// An unrecognized response content type is not an error: it logs a
    /// warning and saves under the generic extension.
    pub fn render(&self, message: &str, output_base: &Path) -> Result<PathBuf> {
        let url = format!("http://{}:{}/", self.host, self.port);
        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, REQUEST_CONTENT_TYPE)
            .body(message.to_owned())
            .send()
            .with_context(|| format!("POST {url}"))?;

        if !response.status().is_success() {
            bail!("render service answered HTTP {}", response.status());
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes().context("read render response")?;
        log::debug!(
            "render exchange finished in {:.2?} ({} bytes)",
            started.elapsed(),
            body.len()
        );

        if body.is_empty() {
            bail!("render service returned an empty visualization");
        }

        let essence = content_type.split(';').next().unwrap_or_default().trim();
        let extension = match extension_for_mime(essence) {
            Some(ext) => ext,
            None => {
                log::warn!(
                    "unrecognized content type `{content_type}` from the render service; \
                     saving {} bytes as `{}{GENERIC_EXTENSION}`",
                    body.len(),
                    output_base.display()
                );
                GENERIC_EXTENSION
            }
        };

        let mut out = output_base.as_os_str().to_owned();
        out.push(extension);
        let out = PathBuf::from(out);
        fs::write(&out, &body).with_context(|| format!("write {}", out.display()))?;
        Ok(out)
    }
}
