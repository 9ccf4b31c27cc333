//! Multipart codec
//!
//! Encodes a [`TransferSet`] as a `multipart/form-data` body (RFC 7578) and
//! decodes such a body back into a set. Each part carries one file: the part
//! name is the file's vault path and the part body is its raw bytes, with no
//! content-transfer-encoding.
//!
//! ## Wire format
//!
//! ```text
//! --{boundary}\r\n
//! Content-Disposition: form-data; name="{path}"; filename="{basename}"\r\n
//! Content-Type: application/octet-stream\r\n
//! \r\n
//! {bytes}\r\n
//! --{boundary}--\r\n
//! ```
//!
//! The encoder never emits a boundary that occurs inside any part. The
//! decoder is incremental ([`MultipartDecoder::feed`]) so a response body can
//! be consumed chunk by chunk as it arrives.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::domain::{SyncError, TransferSet, VaultPath};

/// Media type of every encoded body
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Prefix of generated boundaries
const BOUNDARY_PREFIX: &str = "freesync-";

/// Longest boundary RFC 2046 allows
const MAX_BOUNDARY_LEN: usize = 70;

/// Fresh boundaries tried by [`encode`] before giving up
pub const MAX_BOUNDARY_ATTEMPTS: usize = 8;

/// Upper bound on one part's header block
const MAX_HEADER_BYTES: usize = 16 * 1024;

/// Characters RFC 2046 allows in a boundary besides ASCII alphanumerics
const BOUNDARY_SPECIALS: &str = "'()+_,-./:=? ";

// ============================================================================
// Encoding
// ============================================================================

/// An encoded multipart body with its `Content-Type` header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// `multipart/form-data; boundary=...`
    pub content_type: String,
    /// The boundary token used
    pub boundary: String,
    /// The full body
    pub body: Vec<u8>,
}

/// Generates a random boundary token
pub fn generate_boundary() -> String {
    format!("{}{}", BOUNDARY_PREFIX, Uuid::new_v4().simple())
}

/// Builds the `Content-Type` header value for a boundary
pub fn content_type_for(boundary: &str) -> String {
    format!("{}; boundary={}", MULTIPART_FORM_DATA, boundary)
}

/// Encodes a transfer set with a freshly generated boundary
///
/// A boundary that happens to occur inside a part is discarded and another
/// one is generated.
///
/// # Errors
/// Returns `SyncError::BoundaryCollision` only if every attempt collided,
/// which random 128-bit boundaries make practically impossible
pub fn encode(set: &TransferSet) -> Result<EncodedBody, SyncError> {
    for _ in 0..MAX_BOUNDARY_ATTEMPTS {
        match encode_with_boundary(set, &generate_boundary()) {
            Err(SyncError::BoundaryCollision(_)) => continue,
            other => return other,
        }
    }
    Err(SyncError::BoundaryCollision(format!(
        "no collision-free boundary after {} attempts",
        MAX_BOUNDARY_ATTEMPTS
    )))
}

/// Encodes a transfer set with the given boundary
///
/// # Errors
/// - `SyncError::MalformedBody` if the boundary is not a valid RFC 2046 token
/// - `SyncError::BoundaryCollision` if `--{boundary}` occurs inside a part
pub fn encode_with_boundary(set: &TransferSet, boundary: &str) -> Result<EncodedBody, SyncError> {
    let mut encoder = MultipartEncoder::with_capacity(boundary, set.total_bytes() as usize)?;
    for (path, content) in set.iter() {
        encoder.push(path, content)?;
    }
    Ok(encoder.finish())
}

/// Incremental `multipart/form-data` encoder
///
/// Parts are appended as they become available, so a caller reading files
/// one by one only ever holds the growing body and the current file.
#[derive(Debug)]
pub struct MultipartEncoder {
    boundary: String,
    /// `--{boundary}`
    delimiter: String,
    body: Vec<u8>,
    names: BTreeSet<VaultPath>,
    content_bytes: u64,
}

impl MultipartEncoder {
    /// Creates an encoder for the given boundary
    ///
    /// # Errors
    /// Returns `SyncError::MalformedBody` if the boundary is invalid
    pub fn new(boundary: &str) -> Result<Self, SyncError> {
        Self::with_capacity(boundary, 0)
    }

    /// Creates an encoder with room for `content_bytes` of part content
    ///
    /// # Errors
    /// Returns `SyncError::MalformedBody` if the boundary is invalid
    pub fn with_capacity(boundary: &str, content_bytes: usize) -> Result<Self, SyncError> {
        validate_boundary(boundary)?;
        let delimiter = format!("--{}", boundary);
        Ok(Self {
            boundary: boundary.to_string(),
            body: Vec::with_capacity(content_bytes + delimiter.len() + 4),
            delimiter,
            names: BTreeSet::new(),
            content_bytes: 0,
        })
    }

    /// Appends one part
    ///
    /// # Errors
    /// - `SyncError::DuplicatePath` if `path` was already pushed
    /// - `SyncError::BoundaryCollision` if `--{boundary}` occurs inside the
    ///   part; the encoder is left unchanged
    pub fn push(&mut self, path: &VaultPath, content: &[u8]) -> Result<(), SyncError> {
        if self.names.contains(path) {
            return Err(SyncError::DuplicatePath(path.to_string()));
        }
        let headers = part_headers(path);
        if find(content, self.delimiter.as_bytes()).is_some() || headers.contains(&self.delimiter)
        {
            return Err(SyncError::BoundaryCollision(path.to_string()));
        }

        self.body.extend_from_slice(self.delimiter.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self.body.extend_from_slice(headers.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");

        self.names.insert(path.clone());
        self.content_bytes += content.len() as u64;
        Ok(())
    }

    /// Number of parts pushed so far
    pub fn parts(&self) -> usize {
        self.names.len()
    }

    /// Sum of the pushed content lengths (framing excluded)
    pub fn content_bytes(&self) -> u64 {
        self.content_bytes
    }

    /// Writes the closing delimiter and returns the body
    pub fn finish(mut self) -> EncodedBody {
        self.body.extend_from_slice(self.delimiter.as_bytes());
        self.body.extend_from_slice(b"--\r\n");
        EncodedBody {
            content_type: content_type_for(&self.boundary),
            boundary: self.boundary,
            body: self.body,
        }
    }
}

fn part_headers(path: &VaultPath) -> String {
    format!(
        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
         Content-Type: application/octet-stream\r\n",
        escape_param(path.as_str()),
        escape_param(path.file_name()),
    )
}

/// Escapes a quoted parameter value
///
/// `"`, CR and LF are percent-escaped as HTML form submission does. `%`
/// itself becomes `%25` so that [`unescape_param`] is an exact inverse.
fn escape_param(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses [`escape_param`] in one left-to-right pass
///
/// A `%` not followed by one of the four escapes is kept literally.
fn unescape_param(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = match tail.get(1..3).map(|hex| hex.to_ascii_uppercase()) {
            Some(hex) if hex == "25" => Some('%'),
            Some(hex) if hex == "22" => Some('"'),
            Some(hex) if hex == "0D" => Some('\r'),
            Some(hex) if hex == "0A" => Some('\n'),
            _ => None,
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[3..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn validate_boundary(boundary: &str) -> Result<(), SyncError> {
    let valid = !boundary.is_empty()
        && boundary.len() <= MAX_BOUNDARY_LEN
        && !boundary.ends_with(' ')
        && boundary
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || BOUNDARY_SPECIALS.contains(c));

    if valid {
        Ok(())
    } else {
        Err(SyncError::MalformedBody(format!(
            "invalid boundary {boundary:?}"
        )))
    }
}

// ============================================================================
// Content-Type parsing
// ============================================================================

/// Extracts the boundary parameter from a `Content-Type` header value
///
/// # Errors
/// Returns `SyncError::MalformedBody` if the media type is not multipart or
/// the boundary parameter is missing or invalid
pub fn boundary_from_content_type(content_type: &str) -> Result<String, SyncError> {
    let mut params = split_params(content_type).into_iter();

    let media_type = params.next().unwrap_or_default();
    if !media_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("multipart/")
    {
        return Err(SyncError::MalformedBody(format!(
            "not a multipart content type: {content_type}"
        )));
    }

    for param in params {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim().eq_ignore_ascii_case("boundary") {
                let boundary = unquote(value.trim());
                validate_boundary(&boundary)?;
                return Ok(boundary);
            }
        }
    }

    Err(SyncError::MalformedBody(format!(
        "content type has no boundary: {content_type}"
    )))
}

/// Splits a header value on `;` outside quoted strings
fn split_params(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in value.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                in_quotes = !in_quotes;
            }
            ';' if !in_quotes => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Strips surrounding quotes and resolves backslash escapes
fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ============================================================================
// Decoding
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Before the first delimiter
    Preamble,
    /// Just consumed a delimiter; expecting CRLF or the closing `--`
    AfterDelimiter,
    /// Reading a part's header block
    Headers,
    /// Reading a part's content
    Body,
    /// Closing delimiter seen; everything else is epilogue
    Done,
}

/// Incremental `multipart/form-data` decoder
///
/// Feed the body in chunks of any size with [`feed`](Self::feed), then call
/// [`finish`](Self::finish). Only the part being read plus a delimiter-sized
/// tail are buffered beyond the decoded set.
#[derive(Debug)]
pub struct MultipartDecoder {
    /// `--{boundary}`
    delimiter: Vec<u8>,
    /// `\r\n--{boundary}`
    body_delimiter: Vec<u8>,
    buf: Vec<u8>,
    state: DecodeState,
    /// Whether the byte preceding `buf` ended a line (preamble scanning)
    at_line_start: bool,
    current: Option<(VaultPath, Vec<u8>)>,
    set: TransferSet,
}

impl MultipartDecoder {
    /// Creates a decoder for the given boundary
    ///
    /// # Errors
    /// Returns `SyncError::MalformedBody` if the boundary is invalid
    pub fn new(boundary: &str) -> Result<Self, SyncError> {
        validate_boundary(boundary)?;
        let delimiter = format!("--{}", boundary).into_bytes();
        let mut body_delimiter = b"\r\n".to_vec();
        body_delimiter.extend_from_slice(&delimiter);

        Ok(Self {
            delimiter,
            body_delimiter,
            buf: Vec::new(),
            state: DecodeState::Preamble,
            at_line_start: true,
            current: None,
            set: TransferSet::new(),
        })
    }

    /// Creates a decoder from a `Content-Type` header value
    ///
    /// # Errors
    /// Returns `SyncError::MalformedBody` if the header carries no usable boundary
    pub fn from_content_type(content_type: &str) -> Result<Self, SyncError> {
        Self::new(&boundary_from_content_type(content_type)?)
    }

    /// Number of parts fully decoded so far
    pub fn parts_decoded(&self) -> usize {
        self.set.len()
    }

    /// Consumes the next chunk of the body
    ///
    /// # Errors
    /// Returns `SyncError::MalformedBody` as soon as the body is known to be
    /// inconsistent, or `SyncError::InvalidPath` for a part name that is not
    /// a clean vault path
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), SyncError> {
        if self.state == DecodeState::Done {
            return Ok(());
        }
        self.buf.extend_from_slice(chunk);
        self.process()
    }

    /// Completes decoding and returns the decoded set
    ///
    /// # Errors
    /// Returns `SyncError::MalformedBody` if the closing delimiter was never seen
    pub fn finish(self) -> Result<TransferSet, SyncError> {
        if self.state != DecodeState::Done {
            return Err(SyncError::MalformedBody(
                "body truncated before closing delimiter".to_string(),
            ));
        }
        Ok(self.set)
    }

    fn process(&mut self) -> Result<(), SyncError> {
        loop {
            match self.state {
                DecodeState::Preamble => {
                    if !self.scan_preamble() {
                        return Ok(());
                    }
                }
                DecodeState::AfterDelimiter => {
                    // Transport padding is allowed between delimiter and CRLF
                    let padding = self
                        .buf
                        .iter()
                        .take_while(|b| **b == b' ' || **b == b'\t')
                        .count();
                    self.buf.drain(..padding);

                    if self.buf.len() < 2 {
                        return Ok(());
                    }
                    if self.buf.starts_with(b"--") {
                        self.state = DecodeState::Done;
                        self.buf.clear();
                        return Ok(());
                    }
                    if !self.buf.starts_with(b"\r\n") {
                        return Err(SyncError::MalformedBody(
                            "unexpected bytes after boundary delimiter".to_string(),
                        ));
                    }
                    self.buf.drain(..2);
                    self.state = DecodeState::Headers;
                }
                DecodeState::Headers => {
                    if self.buf.len() < 2 {
                        return Ok(());
                    }
                    if self.buf.starts_with(b"\r\n") {
                        return Err(SyncError::MalformedBody(
                            "part has no headers".to_string(),
                        ));
                    }
                    let Some(end) = find(&self.buf, b"\r\n\r\n") else {
                        if self.buf.len() > MAX_HEADER_BYTES {
                            return Err(SyncError::MalformedBody(
                                "part header block too large".to_string(),
                            ));
                        }
                        return Ok(());
                    };
                    if end > MAX_HEADER_BYTES {
                        return Err(SyncError::MalformedBody(
                            "part header block too large".to_string(),
                        ));
                    }
                    let path = parse_part_name(&self.buf[..end])?;
                    self.buf.drain(..end + 4);
                    self.current = Some((path, Vec::new()));
                    self.state = DecodeState::Body;
                }
                DecodeState::Body => {
                    let Some((_, content)) = self.current.as_mut() else {
                        return Err(SyncError::MalformedBody(
                            "part content without headers".to_string(),
                        ));
                    };
                    match find(&self.buf, &self.body_delimiter) {
                        Some(pos) => {
                            content.extend_from_slice(&self.buf[..pos]);
                            self.buf.drain(..pos + self.body_delimiter.len());
                            if let Some((path, content)) = self.current.take() {
                                self.set.insert(path, content).map_err(|e| match e {
                                    SyncError::DuplicatePath(p) => SyncError::MalformedBody(
                                        format!("duplicate part name {p:?}"),
                                    ),
                                    other => other,
                                })?;
                            }
                            self.state = DecodeState::AfterDelimiter;
                        }
                        None => {
                            // Keep a tail that could be the start of a split delimiter
                            let safe = self
                                .buf
                                .len()
                                .saturating_sub(self.body_delimiter.len() - 1);
                            content.extend_from_slice(&self.buf[..safe]);
                            self.buf.drain(..safe);
                            return Ok(());
                        }
                    }
                }
                DecodeState::Done => return Ok(()),
            }
        }
    }

    /// Looks for the opening delimiter at the start of a line
    ///
    /// Returns `true` once found and consumed.
    fn scan_preamble(&mut self) -> bool {
        let mut from = 0;
        while let Some(offset) = find(&self.buf[from..], &self.delimiter) {
            let pos = from + offset;
            let line_start = if pos == 0 {
                self.at_line_start
            } else {
                self.buf[pos - 1] == b'\n'
            };
            if line_start {
                self.buf.drain(..pos + self.delimiter.len());
                self.state = DecodeState::AfterDelimiter;
                return true;
            }
            from = pos + 1;
        }

        let keep = self.delimiter.len().min(self.buf.len());
        let drop = self.buf.len() - keep;
        if drop > 0 {
            self.at_line_start = self.buf[drop - 1] == b'\n';
            self.buf.drain(..drop);
        }
        false
    }
}

/// Decodes a complete body held in memory
///
/// # Errors
/// See [`MultipartDecoder::feed`] and [`MultipartDecoder::finish`]
pub fn decode(body: &[u8], boundary: &str) -> Result<TransferSet, SyncError> {
    let mut decoder = MultipartDecoder::new(boundary)?;
    decoder.feed(body)?;
    decoder.finish()
}

fn parse_part_name(block: &[u8]) -> Result<VaultPath, SyncError> {
    let block = std::str::from_utf8(block)
        .map_err(|_| SyncError::MalformedBody("part headers are not UTF-8".to_string()))?;

    let mut disposition = None;
    for line in block.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            return Err(SyncError::MalformedBody(format!(
                "header line without ':': {line:?}"
            )));
        };
        if name.trim().eq_ignore_ascii_case("content-disposition") {
            disposition = Some(value.trim());
        }
    }

    let disposition = disposition.ok_or_else(|| {
        SyncError::MalformedBody("part is missing Content-Disposition".to_string())
    })?;

    let name = split_params(disposition)
        .into_iter()
        .skip(1)
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("name")
                .then(|| unescape_param(&unquote(value.trim())))
        })
        .next()
        .ok_or_else(|| SyncError::MalformedBody("part is missing its name".to_string()))?;

    VaultPath::new(name)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
