//! Line-level recognition of the `#type` and `#include` directives.
//!
//! Directives must start the line (leading whitespace allowed). Anything else,
//! including `#` lines the resolver does not know, is passed through as text.

// ── Line ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'s> {
    /// Plain source text, emitted unchanged.
    Text(&'s str),
    /// `#type <name>`; the name is not validated here.
    Type(&'s str),
    /// `#include "<path>"`.
    Include(&'s str),
    /// `#include` without a well-formed quoted path.
    MalformedInclude,
}

const TYPE: &str = "#type";
const INCLUDE: &str = "#include";

/// Classifies one source line (without its terminator).
pub fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim_start();

    if let Some(rest) = keyword_arg(trimmed, TYPE) {
        return Line::Type(rest.trim());
    }

    if let Some(rest) = keyword_arg(trimmed, INCLUDE) {
        return match quoted(rest.trim()) {
            Some(path) if !path.is_empty() => Line::Include(path),
            _ => Line::MalformedInclude,
        };
    }

    Line::Text(line)
}

/// Returns the text after `keyword` when the keyword is a whole word.
fn keyword_arg<'s>(line: &'s str, keyword: &str) -> Option<&'s str> {
    let rest = line.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '"' => Some(rest),
        Some(_) => None,
    }
}

/// Extracts the content of a `"..."` literal; trailing text after the closing
/// quote is ignored.
fn quoted(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('"')?;
    let end = inner.find('"')?;
    Some(&inner[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_passthrough() {
        assert_eq!(classify("let x = 1.0;"), Line::Text("let x = 1.0;"));
        assert_eq!(classify(""), Line::Text(""));
        assert_eq!(classify("  // #type vertex"), Line::Text("  // #type vertex"));
    }

    #[test]
    fn type_directive() {
        assert_eq!(classify("#type vertex"), Line::Type("vertex"));
        assert_eq!(classify("   #type   fragment  "), Line::Type("fragment"));
        assert_eq!(classify("#type"), Line::Type(""));
    }

    #[test]
    fn keyword_must_be_whole_word() {
        assert_eq!(classify("#typed vertex"), Line::Text("#typed vertex"));
        assert_eq!(classify("#includes \"a\""), Line::Text("#includes \"a\""));
    }

    #[test]
    fn include_directive() {
        assert_eq!(classify("#include \"common.wgsl\""), Line::Include("common.wgsl"));
        assert_eq!(classify("#include\"lib/a.wgsl\" // c"), Line::Include("lib/a.wgsl"));
    }

    #[test]
    fn malformed_include() {
        assert_eq!(classify("#include common.wgsl"), Line::MalformedInclude);
        assert_eq!(classify("#include \"unterminated"), Line::MalformedInclude);
        assert_eq!(classify("#include \"\""), Line::MalformedInclude);
        assert_eq!(classify("#include"), Line::MalformedInclude);
    }
}
