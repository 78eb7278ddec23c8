//! Parser for YouTube's timed-text caption format.
//!
//! ```xml
//! <transcript>
//!   <text start="0.24" dur="3.1">welcome &amp;amp; hello</text>
//! </transcript>
//! ```
//!
//! Formatting tags inside a segment are XML-escaped once while character
//! references are escaped twice, so entities are decoded around the tag
//! stripping.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::{TranscriptError, TranscriptSegment};

fn text_element() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("valid timed-text regex")
    })
}

fn attribute() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([A-Za-z_:][\w:.-]*)\s*=\s*"([^"]*)""#).expect("valid attribute regex"))
}

fn markup_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

fn entity() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[xX][0-9A-Fa-f]+|#[0-9]+|[A-Za-z]+);").expect("valid entity regex"))
}

/// Parse a timed-text document into segments, in document order.
///
/// Elements without a body (self-closing or `<text></text>`) are dropped;
/// every other segment keeps its decoded text, whitespace included.
pub fn parse(xml: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
    if !xml.contains("<transcript") {
        return Err(TranscriptError::Malformed(
            "timed-text document has no <transcript> root".to_string(),
        ));
    }

    let mut segments = Vec::new();
    for element in text_element().captures_iter(xml) {
        let attrs = element.get(1).map_or("", |m| m.as_str());
        let body = match element.get(2).map(|m| m.as_str()) {
            Some(body) if !body.is_empty() => body,
            _ => continue,
        };

        segments.push(TranscriptSegment {
            text: clean_text(body),
            start: numeric_attribute(attrs, "start")?.unwrap_or(0.0),
            duration: numeric_attribute(attrs, "dur")?.unwrap_or(0.0),
        });
    }

    Ok(segments)
}

fn numeric_attribute(attrs: &str, name: &str) -> Result<Option<f64>, TranscriptError> {
    let Some(value) = attribute()
        .captures_iter(attrs)
        .find(|caps| &caps[1] == name)
        .map(|caps| caps[2].to_string())
    else {
        return Ok(None);
    };

    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| TranscriptError::Malformed(format!("invalid {} attribute: {:?}", name, value)))
}

/// Decode XML escaping, drop inline formatting tags, then decode the HTML escaping
fn clean_text(raw: &str) -> String {
    let xml_decoded = decode_entities(raw);
    let without_tags = markup_tag().replace_all(&xml_decoded, "");
    decode_entities(&without_tags)
}

/// Decode named and numeric character references; unknown ones are left alone
pub fn decode_entities(input: &str) -> String {
    entity()
        .replace_all(input, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };

            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments_in_order() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.24" dur="3.1">welkom bij</text><text start="3.34" dur="2">de koopcast</text></transcript>"#;

        let segments = parse(xml).unwrap();
        assert_eq!(
            segments,
            vec![
                TranscriptSegment { text: "welkom bij".to_string(), start: 0.24, duration: 3.1 },
                TranscriptSegment { text: "de koopcast".to_string(), start: 3.34, duration: 2.0 },
            ]
        );
    }

    #[test]
    fn test_parse_decodes_double_escaping_and_strips_tags() {
        let xml = r#"<transcript><text start="1" dur="2">it&amp;#39;s &lt;i&gt;really&lt;/i&gt; &amp;amp; truly</text></transcript>"#;

        let segments = parse(xml).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "it's really & truly");
    }

    #[test]
    fn test_parse_skips_only_elements_without_body() {
        let xml = "<transcript><text start=\"0\" dur=\"1\"/><text start=\"0.5\" dur=\"1\"></text><text start=\"1\" dur=\"1\">  </text>\n<text start=\"2\" dur=\"1\">line\nbreak</text></transcript>";

        let segments = parse(xml).unwrap();
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["  ", "line\nbreak"]);
        assert_eq!(segments[0].start, 1.0);
        assert_eq!(segments[1].start, 2.0);
    }

    #[test]
    fn test_parse_keeps_surrounding_whitespace() {
        let xml = r#"<transcript><text start="0" dur="1"> welkom </text><text start="1" dur="1">&amp;nbsp;bij</text></transcript>"#;

        let segments = parse(xml).unwrap();
        assert_eq!(segments[0].text, " welkom ");
        assert_eq!(segments[1].text, "\u{a0}bij");
        assert_eq!(crate::transcript::join_segments(&segments), " welkom  \u{a0}bij");
    }

    #[test]
    fn test_parse_missing_duration_defaults_to_zero() {
        let xml = r#"<transcript><text start="5.5">tail</text></transcript>"#;
        let segments = parse(xml).unwrap();
        assert_eq!(segments[0].duration, 0.0);
    }

    #[test]
    fn test_parse_rejects_invalid_numbers() {
        let xml = r#"<transcript><text start="soon" dur="1">x</text></transcript>"#;
        assert!(matches!(parse(xml), Err(TranscriptError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_non_transcript_documents() {
        assert!(matches!(parse("<html></html>"), Err(TranscriptError::Malformed(_))));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#39;&#x41;&quot;"), "'A\"");
        assert_eq!(decode_entities("&unknown; stays"), "&unknown; stays");
        assert_eq!(decode_entities("no entities"), "no entities");
    }
}
