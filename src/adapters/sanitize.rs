//! Log sanitization utilities.
//!
//! String-based redaction applied to formatted log output before it reaches
//! the sink:
//! - account addresses (record owners are identifying)
//! - ciphertext payloads (opaque, but confidential in aggregate)
//! - common secret formats (contextual tokens, long hex material)
//!
//! Sanitizing strings is a defense-in-depth fallback; the primary protection
//! is that plaintext diagnosis fields never reach logging calls at all.
//! `sanitize()` caps input size (`TCMLEDGER_SANITIZE_MAX_BYTES`) so a huge
//! malicious line cannot turn redaction into a CPU sink.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

/// Maximum number of bytes to sanitize per call (default 16 KiB).
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Pattern {
    regex: Regex,
    replacement: &'static str,
}

struct Patterns {
    set: RegexSet,
    patterns: Vec<Pattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("TCMLEDGER_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn get_patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Account addresses (0x-prefixed, 40 hex chars)
            (r"\b0x[0-9a-fA-F]{40}\b", "[REDACTED-ADDR]"),
            // Simulated-FHE ciphertext blobs
            (r"\bFHE-TCM-[A-Za-z0-9+/]{8,}={0,2}", "[REDACTED-CIPHERTEXT]"),
            // Contextual secrets (key: value / key=value with token-looking payloads)
            (
                r"(?i)\b(?:api[_-]?key|access[_-]?token|secret|password|passwd|pwd|private[_-]?key|seed|signature|sig|token|key)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}\b",
                "[REDACTED-SECRET]",
            ),
            // Broad key material pattern
            (r"\b[0-9a-fA-F]{64,}\b", "[REDACTED-KEY]"),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| Pattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        Patterns { set, patterns }
    })
}

/// Sanitize a string by replacing confidential patterns.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    // Fast path: single scan for "any match".
    if !patterns.set.is_match(prefix) {
        let mut out = prefix.to_string();
        if truncated {
            out.push_str(" [TRUNCATED]");
        }
        return out;
    }

    let matched: Vec<usize> = patterns.set.matches(prefix).into_iter().collect();
    let mut result = prefix.to_string();
    for idx in matched {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .to_string();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// before it is written to the underlying sink.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let line_str = String::from_utf8_lossy(&line);
            let sanitized = sanitize(&line_str);
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // Prevent unbounded buffering when a formatter emits a huge line
        // with no newline.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if hard_cap > 0 && self.buffer.len() > hard_cap {
            let s = String::from_utf8_lossy(&self.buffer).to_string();
            let sanitized = sanitize(&s);
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n[TRUNCATED]\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let s = String::from_utf8_lossy(&self.buffer);
            let sanitized = sanitize(&s);
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_account_address() {
        let input = "owner 0x52908400098527886E0F7030069857D2E4169EE7 analyzed a record";
        let sanitized = sanitize(input);
        assert!(sanitized.contains("[REDACTED-ADDR]"));
        assert!(!sanitized.contains("52908400"));
    }

    #[test]
    fn test_sanitize_ciphertext_blob() {
        let input = "payload FHE-TCM-eyJzeW1wdG9tUGF0dGVybiI6IldpbmQtQ29sZCJ9 stored";
        let sanitized = sanitize(input);
        assert!(sanitized.contains("[REDACTED-CIPHERTEXT]"));
        assert!(!sanitized.contains("eyJzeW1wdG9t"));
    }

    #[test]
    fn test_sanitize_contextual_secret() {
        let input = "api_key=QWxhZGRpbjpvcGVuIHNlc2FtZSB3aXRoIGxvbmcgc2VjcmV0IHZhbHVl";
        let sanitized = sanitize(input);
        assert!(sanitized.contains("[REDACTED-SECRET]"));
    }

    #[test]
    fn test_plain_text_passes_through() {
        let input = "Reloaded 3 records from the ledger";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let input = "prefix 0x52908400098527886E0F7030069857D2E4169EE7 suffix";
        let sanitized = sanitize_with_limit(input, 16);
        assert!(sanitized.contains("[TRUNCATED]"));
    }
}
