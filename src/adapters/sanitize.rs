//! Log sanitization for patient measurements and secrets.
//!
//! Applied to every formatted log line before it reaches the sink. It
//! redacts:
//! - Clinical measurements written as `<field>=<number>` or `<field>: <number>`
//!   for any of the nine model inputs (e.g. `hba1c=7.2`, `Fasting_Glucose: 140`)
//! - Identifiers (UUIDs) and email addresses
//! - Base64/hex key material (signing seeds, public keys, digests)
//!
//! Sanitizing strings is a fallback. Call sites should not log raw
//! measurements in the first place.
//!
//! Each line is capped at a byte limit, configured once at startup through
//! `Settings::sanitize_max_bytes` (`DIABETES_RISK_SANITIZE_MAX_BYTES`).

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<SanitizePatterns> = OnceLock::new();

pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct SanitizePatterns {
    set: RegexSet,
    rules: Vec<Rule>,
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

fn get_patterns() -> &'static SanitizePatterns {
    PATTERNS.get_or_init(|| {
        let sources: Vec<(&'static str, &'static str)> = vec![
            // Measurements keyed by schema column or a common spelling of it.
            (
                r"(?i)\b(age|bmi|fasting[_ ]?glucose|glucose|blood[_ ]?pressure|bp|hba1c|daily[_ ]?calories|calories|physical[_ ]?activity(?:_min_per_day)?|smoking(?:[_ ]?status)?|family[_ ]?history)\b(\s*[:=]\s*)-?\d+(?:\.\d+)?",
                "$1$2[REDACTED]",
            ),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (
                r"(?i)\b(?:seed|secret|private[_-]?key|signing[_-]?key|key)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}",
                "[REDACTED-SECRET]",
            ),
            (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-KEY]"),
        ];

        let set = RegexSet::new(sources.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = sources
            .into_iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        SanitizePatterns { set, rules }
    })
}

/// Sanitize a string by redacting measurements and secrets.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, DEFAULT_SANITIZE_MAX_BYTES)
}

/// [`sanitize`] with an explicit cap on the bytes inspected.
#[must_use]
pub fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).to_string();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
        // Keep line framing for the sink.
        if input.ends_with('\n') {
            result.push('\n');
        }
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// before it is written to the underlying sink.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    /// Wrap `inner`, capping each sanitized line at `max_bytes` (at least 1).
    #[must_use]
    pub fn new(inner: M, max_bytes: usize) -> Self {
        Self {
            inner,
            max_bytes: max_bytes.max(1),
        }
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            max_bytes: self.max_bytes,
        }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W, max_bytes: usize) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            max_bytes,
        }
    }

    fn sanitize(&self, bytes: &[u8]) -> String {
        sanitize_with_limit(&String::from_utf8_lossy(bytes), self.max_bytes)
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let sanitized = self.sanitize(&line);
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

        // A formatter that never emits a newline must not grow the buffer forever.
        let hard_cap = self.max_bytes.saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let sanitized = self.sanitize(&self.buffer);
            self.inner.write_all(sanitized.as_bytes())?;
            if !sanitized.ends_with('\n') {
                self.inner.write_all(b"\n")?;
            }
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let sanitized = self.sanitize(&self.buffer);
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
        SanitizingWriter::new(self.inner.make_writer(), self.max_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_measurements() {
        let input = "record age=58 hba1c=7.1 Fasting_Glucose: 142 smoking_status=1";
        let sanitized = sanitize(input);
        assert_eq!(
            sanitized,
            "record age=[REDACTED] hba1c=[REDACTED] Fasting_Glucose: [REDACTED] smoking_status=[REDACTED]"
        );
    }

    #[test]
    fn test_scores_are_not_measurements() {
        let input = "Scoring complete: risk=0.078, category=LOW";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn test_sanitize_uuid_and_email() {
        let input = "user 550e8400-e29b-41d4-a716-446655440000 <clinic@hospital.org>";
        let sanitized = sanitize(input);
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
        assert!(!sanitized.contains("550e8400"));
    }

    #[test]
    fn test_sanitize_key_material() {
        let input = "digest 0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
        assert!(sanitize(input).contains("[REDACTED-KEY]"));

        let input = "seed=QWxhZGRpbjpvcGVuIHNlc2FtZSB3aXRoIGxvbmcgc2VjcmV0IHZhbHVl";
        assert!(sanitize(input).contains("[REDACTED-SECRET]"));
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let sanitized = sanitize_with_limit("prefix age=40 and a long tail of text", 12);
        assert!(sanitized.ends_with("[TRUNCATED]"));
    }

    #[test]
    fn test_truncated_line_keeps_newline() {
        let sanitized = sanitize_with_limit("prefix and a long tail of text\n", 12);
        assert_eq!(sanitized, "prefix and a [TRUNCATED]\n");
    }

    #[test]
    fn test_writer_uses_configured_limit() {
        let mut out = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut out, 10);
            writer.write_all(b"first line is long\n").expect("write");
            writer.write_all(b"short\n").expect("write");
            writer.flush().expect("flush");
        }
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "first line [TRUNCATED]\nshort\n");
    }

    #[test]
    fn test_make_writer_carries_limit() {
        let make = SanitizingMakeWriter::new(std::io::sink, 0);
        assert_eq!(make.max_bytes, 1);
        assert_eq!(make.clone().make_writer().max_bytes, 1);
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut out = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut out, DEFAULT_SANITIZE_MAX_BYTES);
            writer.write_all(b"first bmi=31.").expect("write");
            writer.write_all(b"2\nsecond line\n").expect("write");
            writer.flush().expect("flush");
        }
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "first bmi=[REDACTED]\nsecond line\n");
    }
}
