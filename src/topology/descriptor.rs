//! Parser for the network descriptor mini-language.
//!
//! A descriptor is a comma-separated list of paths; a path is a
//! dash-separated list of node tokens `id[.version]`, for example
//! `"1-2-3,2-4.2"`. Whitespace around tokens is ignored. Offsets reported
//! in tokens and errors are byte offsets into the descriptor.

use crate::error::{Result, TopologyError};

/// One `id[.version]` token of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeToken {
    pub id: u32,
    /// Explicit 1-based derivative version, if the token had a `.v` suffix.
    pub version: Option<u32>,
    /// Byte offset of the token within the descriptor.
    pub offset: usize,
}

/// A single node-to-node step of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedSegment {
    pub from_node: u32,
    pub from_version: Option<u32>,
    pub to_node: u32,
    pub to_version: Option<u32>,
}

/// A dash-separated path of node tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub tokens: Vec<NodeToken>,
    /// Byte offset of the path within the descriptor.
    pub offset: usize,
}

impl ParsedPath {
    /// Returns the consecutive node pairs of this path.
    #[must_use]
    pub fn segments(&self) -> Vec<ParsedSegment> {
        self.tokens
            .windows(2)
            .map(|pair| ParsedSegment {
                from_node: pair[0].id,
                from_version: pair[0].version,
                to_node: pair[1].id,
                to_version: pair[1].version,
            })
            .collect()
    }
}

/// Splits `text` on `separator`, yielding each piece with its byte offset
/// relative to `base`.
fn split_with_offsets(text: &str, separator: char, base: usize) -> impl Iterator<Item = (usize, &str)> {
    let mut start = 0;
    text.split(separator).map(move |piece| {
        let offset = base + start;
        start += piece.len() + separator.len_utf8();
        (offset, piece)
    })
}

fn trimmed(offset: usize, piece: &str) -> (usize, &str) {
    let leading = piece.len() - piece.trim_start().len();
    (offset + leading, piece.trim())
}

fn parse_error(fragment: &str, offset: usize, reason: &'static str) -> TopologyError {
    TopologyError::Parse {
        fragment: fragment.to_string(),
        offset,
        reason,
    }
}

fn parse_token(offset: usize, token: &str) -> Result<NodeToken> {
    let (id_text, version_text) = match token.split_once('.') {
        Some((id, version)) => (id, Some(version)),
        None => (token, None),
    };
    let id = id_text
        .parse::<u32>()
        .map_err(|_| parse_error(token, offset, "node identifier is not a non-negative integer"))?;
    let version = match version_text {
        None => None,
        Some("") => return Err(parse_error(token, offset, "dangling dot without a version").into()),
        Some(text) => {
            let version = text
                .parse::<u32>()
                .map_err(|_| parse_error(token, offset, "version is not a non-negative integer"))?;
            if version == 0 {
                return Err(parse_error(token, offset, "versions are numbered from 1").into());
            }
            Some(version)
        }
    };
    Ok(NodeToken { id, version, offset })
}

fn parse_path(offset: usize, path: &str) -> Result<Option<ParsedPath>> {
    let (path_offset, body) = trimmed(offset, path);
    if body.is_empty() {
        tracing::warn!(offset = path_offset, "ignoring empty network path");
        return Ok(None);
    }
    let pieces: Vec<(usize, &str)> = split_with_offsets(path, '-', offset).collect();
    let last = pieces.len() - 1;
    let mut tokens = Vec::with_capacity(pieces.len());
    for (i, (raw_offset, piece)) in pieces.into_iter().enumerate() {
        let (token_offset, token) = trimmed(raw_offset, piece);
        if token.is_empty() {
            // Report the dash next to the missing token.
            let (dash, reason) = if i == 0 {
                (raw_offset + piece.len(), "leading dash")
            } else if i == last {
                (raw_offset - 1, "trailing dash")
            } else {
                (raw_offset - 1, "empty node token between dashes")
            };
            return Err(parse_error("-", dash, reason).into());
        }
        tokens.push(parse_token(token_offset, token)?);
    }
    if tokens.len() < 2 {
        tracing::warn!(path = body, offset = path_offset, "ignoring single node network path");
        return Ok(None);
    }
    Ok(Some(ParsedPath {
        tokens,
        offset: path_offset,
    }))
}

/// Parses a network descriptor into its paths, in descriptor order.
///
/// Empty paths and single-node paths carry no segments and are skipped with
/// a warning.
///
/// # Errors
///
/// Returns [`TopologyError::Parse`] naming the offending substring and its
/// byte offset for a non-integer identifier or version, a leading or
/// trailing dash, an empty token, a dangling dot, or a version of zero.
pub fn parse_descriptor(descriptor: &str) -> Result<Vec<ParsedPath>> {
    let mut paths = Vec::new();
    for (offset, path) in split_with_offsets(descriptor, ',', 0) {
        if let Some(parsed) = parse_path(offset, path)? {
            paths.push(parsed);
        }
    }
    Ok(paths)
}
