// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading artifacts and repairing the not-quite-XML Boost.Test emits.
//!
//! Boost.Test never writes an XML declaration and copies raw bytes of user data into its
//! output, so a strict XML parser rejects many real reports and logs. Everything here runs
//! before a document reaches the XML parsers.

use crate::errors::{ArtifactKind, ArtifactReadError};
use camino::Utf8PathBuf;
use std::io::Read;
use swrite::{SWrite, swrite};

/// The declaration prepended to documents which lack one.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"iso-8859-1\"?>\n";

const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

/// Where to read an artifact from.
pub enum ArtifactSource<'a> {
    /// A file, opened for the duration of the read and closed afterwards.
    Path(Utf8PathBuf),

    /// A reader owned by the caller. It is read to the end but never closed.
    Reader(&'a mut dyn Read),
}

impl ArtifactSource<'_> {
    fn path(&self) -> Option<Utf8PathBuf> {
        match self {
            Self::Path(path) => Some(path.clone()),
            Self::Reader(_) => None,
        }
    }
}

impl From<Utf8PathBuf> for ArtifactSource<'_> {
    fn from(path: Utf8PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Reads an artifact to the end and decodes it as ISO-8859-1.
pub fn read_artifact(
    kind: ArtifactKind,
    source: ArtifactSource<'_>,
) -> Result<String, ArtifactReadError> {
    let path = source.path();
    let bytes = match source {
        ArtifactSource::Path(path) => fs_err::read(&path),
        ArtifactSource::Reader(reader) => {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).map(|_| bytes)
        }
    }
    .map_err(|err| ArtifactReadError::new(kind, path, err))?;

    Ok(decode_latin1(&bytes))
}

/// Decodes ISO-8859-1 bytes. Every byte maps to the code point of the same value, so this
/// never fails.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Makes Boost.Test XML output acceptable to a conforming XML parser.
///
/// Control characters inside CDATA sections are replaced with their `0xNN` spelling, NUL
/// characters are replaced with spaces, and an ISO-8859-1 declaration is prepended unless the
/// document already has one.
pub fn repair_xml(content: &str) -> String {
    let mut repaired = escape_cdata_control_chars(content);

    if repaired.contains('\0') {
        repaired = repaired.replace('\0', " ");
    }

    if !repaired.starts_with("<?xml") {
        repaired.insert_str(0, XML_DECLARATION);
    }

    repaired
}

fn escape_cdata_control_chars(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find(CDATA_START) {
        let body_start = start + CDATA_START.len();
        let Some(body_len) = rest[body_start..].find(CDATA_END) else {
            // Unterminated section: leave it to the XML parser to report.
            break;
        };

        out.push_str(&rest[..body_start]);
        for c in rest[body_start..body_start + body_len].chars() {
            if is_disallowed_control(c) {
                swrite!(out, "0x{:02X}", u32::from(c));
            } else {
                out.push(c);
            }
        }
        out.push_str(CDATA_END);
        rest = &rest[body_start + body_len + CDATA_END.len()..];
    }

    out.push_str(rest);
    out
}

fn is_disallowed_control(c: char) -> bool {
    c < ' ' && c != '\n' && c != '\r'
}
