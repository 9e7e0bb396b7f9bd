//! Minimal XML helpers for the META-INF documents.
//!
//! Only attribute extraction and entity (un)escaping are needed: the manifest
//! and signature documents are scanned for a handful of elements, never
//! fully parsed.

use regex::Regex;

/// Build a regex that captures the value of attribute `local_name`, with or
/// without a namespace prefix, single- or double-quoted.
pub(crate) fn attribute_regex(local_name: &str) -> Regex {
    let pattern = format!(
        r#"(?:^|\s)(?:[A-Za-z_][\w.-]*:)?{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        regex::escape(local_name)
    );
    Regex::new(&pattern).expect("attribute pattern is valid")
}

/// Extract and unescape an attribute value from an element's attribute text.
pub(crate) fn attribute(re: &Regex, attrs: &str) -> Option<String> {
    let caps = re.captures(attrs)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
    Some(unescape(raw))
}

pub(crate) fn unescape(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

pub(crate) fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_accepts_prefix_and_quotes() {
        let re = attribute_regex("full-path");
        assert_eq!(
            attribute(&re, r#" manifest:full-path="a &amp; b.txt""#).as_deref(),
            Some("a & b.txt")
        );
        assert_eq!(
            attribute(&re, " full-path='doc.pdf'").as_deref(),
            Some("doc.pdf")
        );
        assert_eq!(attribute(&re, r#" other-full-path="x""#), None);
    }

    #[test]
    fn escape_then_unescape_is_identity() {
        let name = r#"Q&A <draft> "final".txt"#;
        assert_eq!(unescape(&escape(name)), name);
    }
}
