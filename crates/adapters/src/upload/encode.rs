// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request body encoders for HTTP sinks

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::write::{GzEncoder, ZlibEncoder};
use serde::Serialize;
use srcdsup_core::{Compression, SidecarMetadata};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use thiserror::Error;
use xz2::write::XzEncoder;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const XZ_PRESET: u32 = 6;

/// Errors producing a request body
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("compression failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip container failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid multipart part: {0}")]
    Part(String),
}

/// One file plus the fields an HTTP sink attaches to it
#[derive(Debug, Clone)]
pub struct DemoPayload {
    pub server_name: String,
    pub demo_name: String,
    pub body: Vec<u8>,
    pub metadata: SidecarMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    server_name: &'a str,
    map_name: &'a str,
    demo_name: &'a str,
    body: String,
    scores: &'a BTreeMap<String, srcdsup_core::PlayerStats>,
}

impl DemoPayload {
    /// `application/json` envelope with the raw bytes base64 encoded
    pub fn to_json(&self) -> Result<Vec<u8>, EncodeError> {
        let envelope = Envelope {
            server_name: &self.server_name,
            map_name: &self.metadata.map_name,
            demo_name: &self.demo_name,
            body: STANDARD.encode(&self.body),
            scores: &self.metadata.scores,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    /// `multipart/form-data` with a single `demo` part
    pub fn to_multipart(
        &self,
        compression: Compression,
    ) -> Result<reqwest::multipart::Form, EncodeError> {
        let data = compress(compression, &self.demo_name, &self.body)?;
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(part_file_name(&self.demo_name, compression))
            .mime_str("application/octet-stream")
            .map_err(|e| EncodeError::Part(e.to_string()))?;

        Ok(reqwest::multipart::Form::new()
            .part("demo", part)
            .text("server_name", self.server_name.clone())
            .text("map_name", self.metadata.map_name.clone())
            .text("stats", self.metadata.scores_json()))
    }
}

/// File name of the uploaded part, with the container extension appended
pub fn part_file_name(name: &str, compression: Compression) -> String {
    match compression.extension() {
        Some(ext) => format!("{}.{}", name, ext),
        None => name.to_string(),
    }
}

/// Wrap `data` in the chosen container
///
/// `name` is only used for the single ZIP entry.
pub fn compress(compression: Compression, name: &str, data: &[u8]) -> Result<Vec<u8>, EncodeError> {
    match compression {
        Compression::None => Ok(data.to_vec()),
        Compression::Gzip => {
            let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(data)?;
            Ok(enc.finish()?)
        }
        Compression::Deflate => {
            let mut enc = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(data)?;
            Ok(enc.finish()?)
        }
        Compression::Xz => {
            let mut enc = XzEncoder::new(Vec::new(), XZ_PRESET);
            enc.write_all(data)?;
            Ok(enc.finish()?)
        }
        Compression::Zip => {
            let mut archive = Vec::new();
            {
                let mut zip = ZipWriter::new(Cursor::new(&mut archive));
                let options = SimpleFileOptions::default()
                    .compression_method(zip::CompressionMethod::Deflated);
                zip.start_file(name, options)?;
                zip.write_all(data)?;
                zip.finish()?;
            }
            Ok(archive)
        }
    }
}

#[cfg(test)]
#[path = "encode_tests.rs"]
mod tests;
