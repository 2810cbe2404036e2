//! Tool/file result payload parsing.
//!
//! File-read results arrive in one of three shapes, tried in order:
//! a structured JSON envelope (`{"path": .., "content": .., "metadata": ..}`),
//! a plain-text convention where the first line is `FILE: <path>`, or raw
//! content with no recoverable path. Parsing never fails; the worst case is
//! an envelope with no path.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Reserved `tool_call_id` prefix marking a message as a file-read result.
///
/// Harnesses that want the reducer to produce file gists tag the result's
/// call id, e.g. `file:call-7`. Untagged results only ever receive the
/// generic elision.
pub const FILE_RESULT_PREFIX: &str = "file:";

/// Leading marker for the plain-text path convention. The first line of the
/// payload is `FILE: <path>`; everything after it is content.
pub const FILE_MARKER: &str = "FILE:";

/// A parsed tool/file result payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    /// Recovered file path, if any shape carried one.
    pub path: Option<String>,
    /// The raw file content.
    pub content: String,
    /// Open key/value metadata from the structured envelope (empty for the
    /// plain-text and fallback shapes).
    pub metadata: Map<String, Value>,
}

/// Deserialization target for the structured envelope shape.
#[derive(Deserialize)]
struct RawEnvelope {
    path: Option<String>,
    content: Option<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl ResultEnvelope {
    /// Parse a payload, trying the three shapes in order. Never fails.
    pub fn parse(payload: &str) -> Self {
        // (a) Structured JSON envelope. A JSON object without `path` or
        // `content` is some other serialized value, not an envelope.
        if let Ok(raw) = serde_json::from_str::<RawEnvelope>(payload)
            && (raw.path.is_some() || raw.content.is_some())
        {
            return Self {
                path: raw.path,
                content: raw.content.unwrap_or_default(),
                metadata: raw.metadata,
            };
        }

        // (b) Plain-text FILE: marker on the first line.
        if let Some(rest) = payload.strip_prefix(FILE_MARKER) {
            let (first_line, remainder) = match rest.split_once('\n') {
                Some((first, remainder)) => (first, remainder),
                None => (rest, ""),
            };
            let path = first_line.trim();
            if !path.is_empty() {
                return Self {
                    path: Some(path.to_string()),
                    content: remainder.to_string(),
                    metadata: Map::new(),
                };
            }
        }

        // (c) Fallback: the whole payload is content, path unknown.
        Self {
            path: None,
            content: payload.to_string(),
            metadata: Map::new(),
        }
    }

    /// Final path segment, for display in gists.
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .as_deref()
            .and_then(|p| p.rsplit(['/', '\\']).next())
            .filter(|n| !n.is_empty())
    }

    /// Lowercased file extension of the recovered path.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Whether a `tool_call_id` carries the file-result tag.
pub fn has_file_tag(tool_call_id: Option<&str>) -> bool {
    tool_call_id.is_some_and(|id| id.starts_with(FILE_RESULT_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_envelope() {
        let payload = r#"{"path":"src/main.rs","content":"fn main() {}","metadata":{"lines":1}}"#;
        let env = ResultEnvelope::parse(payload);
        assert_eq!(env.path.as_deref(), Some("src/main.rs"));
        assert_eq!(env.content, "fn main() {}");
        assert_eq!(env.metadata.get("lines"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn envelope_with_only_content_is_accepted() {
        let env = ResultEnvelope::parse(r#"{"content":"hello"}"#);
        assert_eq!(env.path, None);
        assert_eq!(env.content, "hello");
    }

    #[test]
    fn json_object_without_envelope_keys_is_raw_content() {
        let payload = r#"{"rows":5000,"status":"ok"}"#;
        let env = ResultEnvelope::parse(payload);
        assert_eq!(env.path, None);
        assert_eq!(env.content, payload);
    }

    #[test]
    fn parses_file_marker() {
        let env = ResultEnvelope::parse("FILE: data/sales.csv\ndate,amount\n2024-01-01,10");
        assert_eq!(env.path.as_deref(), Some("data/sales.csv"));
        assert_eq!(env.content, "date,amount\n2024-01-01,10");
    }

    #[test]
    fn file_marker_without_body() {
        let env = ResultEnvelope::parse("FILE: empty.txt");
        assert_eq!(env.path.as_deref(), Some("empty.txt"));
        assert_eq!(env.content, "");
    }

    #[test]
    fn bare_marker_falls_through_to_raw() {
        let env = ResultEnvelope::parse("FILE:   \nnot a path after all");
        assert_eq!(env.path, None);
        assert!(env.content.starts_with("FILE:"));
    }

    #[test]
    fn fallback_is_whole_payload() {
        let env = ResultEnvelope::parse("just some tool output");
        assert_eq!(env.path, None);
        assert_eq!(env.content, "just some tool output");
        assert!(env.metadata.is_empty());
    }

    #[test]
    fn file_name_and_extension() {
        let env = ResultEnvelope::parse(r#"{"path":"a/b/Report.CSV","content":""}"#);
        assert_eq!(env.file_name(), Some("Report.CSV"));
        assert_eq!(env.extension().as_deref(), Some("csv"));

        let no_ext = ResultEnvelope::parse(r#"{"path":"Makefile","content":""}"#);
        assert_eq!(no_ext.extension(), None);

        let hidden = ResultEnvelope::parse(r#"{"path":".gitignore","content":""}"#);
        assert_eq!(hidden.extension(), None);
    }

    #[test]
    fn file_tag_detection() {
        assert!(has_file_tag(Some("file:call-7")));
        assert!(!has_file_tag(Some("call-7")));
        assert!(!has_file_tag(None));
    }
}
