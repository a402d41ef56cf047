//! Evaluation of the URL templates Zoekt ships in `RepoURLs`,
//! `LineFragments` and commit URL maps.
//!
//! Two grammars exist:
//!
//! * join style: `{{URLJoinPath "https://github.com/o/r" "blob" .Version .Path}}`,
//!   where every literal is a Go-quoted string and `.Version` / `.Path` are
//!   percent-encoded per `/`-separated segment before all parts are joined
//!   with `/`;
//! * substitution style: `https://host/o/r/blob/{{.Version}}/{{.Path}}`,
//!   where the placeholders are replaced verbatim.

use once_cell::sync::Lazy;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::utf8_percent_encode;
use regex::Regex;
use thiserror::Error;

const VERSION_PLACEHOLDER: &str = "{{.Version}}";
const PATH_PLACEHOLDER: &str = "{{.Path}}";
const LINE_NUMBER_PLACEHOLDER: &str = "{{.LineNumber}}";
const VERSION_ARG: &str = ".Version";
const PATH_ARG: &str = ".Path";

/// Characters `encodeURIComponent` leaves alone.
pub(crate) const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn compile_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid regex literal {pattern}: {err}"))
}

static URL_JOIN_PATH: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"^\{\{\s*URLJoinPath\s+(?P<args>.*?)\s*\}\}$"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated string literal in URL template: {0}")]
    UnterminatedLiteral(String),

    #[error("invalid string literal {literal} in URL template: {message}")]
    InvalidLiteral { literal: String, message: String },

    #[error("unsupported argument `{0}` in URL template")]
    UnsupportedArgument(String),
}

/// Expands a file URL template, appending the line fragment when given.
///
/// `line_fragment` is the repository's `LineFragments` template paired with
/// the 1-based line number; pass `None` for whole-file links.
pub fn evaluate_file_url_template(
    template: &str,
    version: &str,
    path: &str,
    line_fragment: Option<(&str, u32)>,
) -> Result<String, TemplateError> {
    let mut url = match join_args(template) {
        Some(args) => evaluate_join(args, version, Some(path))?,
        None => substitute(
            template,
            &[(VERSION_PLACEHOLDER, version), (PATH_PLACEHOLDER, path)],
        ),
    };
    if let Some((fragment_template, line_number)) = line_fragment {
        url.push_str(&evaluate_line_fragment(fragment_template, line_number));
    }
    Ok(url)
}

pub fn evaluate_commit_url_template(template: &str, version: &str) -> Result<String, TemplateError> {
    match join_args(template) {
        Some(args) => evaluate_join(args, version, None),
        None => Ok(substitute(template, &[(VERSION_PLACEHOLDER, version)])),
    }
}

pub fn evaluate_line_fragment(template: &str, line_number: u32) -> String {
    substitute(
        template,
        &[(LINE_NUMBER_PLACEHOLDER, &line_number.to_string())],
    )
}

fn join_args(template: &str) -> Option<&str> {
    URL_JOIN_PATH
        .captures(template.trim())
        .and_then(|caps| caps.name("args"))
        .map(|args| args.as_str().trim())
}

fn evaluate_join(args: &str, version: &str, path: Option<&str>) -> Result<String, TemplateError> {
    let mut parts: Vec<String> = Vec::new();
    for token in tokenize(args)? {
        match token {
            Token::Literal(text) => parts.push(text),
            Token::Bare(VERSION_ARG) => parts.push(encode_segments(version)),
            Token::Bare(PATH_ARG) => match path {
                Some(path) => parts.push(encode_segments(path)),
                None => return Err(TemplateError::UnsupportedArgument(PATH_ARG.to_string())),
            },
            Token::Bare(other) => return Err(TemplateError::UnsupportedArgument(other.to_string())),
        }
    }
    Ok(parts.join("/"))
}

fn encode_segments(value: &str) -> String {
    value
        .split('/')
        .map(|segment| utf8_percent_encode(segment, URI_COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Literal(String),
    Bare(&'a str),
}

/// Splits on whitespace outside of quoted literals; literals are unquoted.
fn tokenize(args: &str) -> Result<Vec<Token<'_>>, TemplateError> {
    let mut tokens = Vec::new();
    let mut rest = args.trim_start();
    while !rest.is_empty() {
        if rest.starts_with('"') {
            let end = closing_quote(rest)
                .ok_or_else(|| TemplateError::UnterminatedLiteral(rest.to_string()))?;
            let raw = &rest[..=end];
            let literal: String =
                serde_json::from_str(raw).map_err(|err| TemplateError::InvalidLiteral {
                    literal: raw.to_string(),
                    message: err.to_string(),
                })?;
            tokens.push(Token::Literal(literal));
            rest = &rest[end + 1..];
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            tokens.push(Token::Bare(&rest[..end]));
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }
    Ok(tokens)
}

/// Byte index of the quote closing the literal that opens `text`.
fn closing_quote(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in text.char_indices().skip(1) {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Replaces placeholders in one left-to-right pass; inserted values are never
/// rescanned.
fn substitute(template: &str, replacements: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'scan: while !rest.is_empty() {
        for (placeholder, value) in replacements {
            if let Some(tail) = rest.strip_prefix(placeholder) {
                out.push_str(value);
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn join_style_encodes_version_and_path_segments() {
        let url = evaluate_file_url_template(
            r#"{{URLJoinPath "https://example.com" "blob" .Version .Path}}"#,
            "main",
            "src/a b.ts",
            None,
        )
        .unwrap();
        assert_eq!(url, "https://example.com/blob/main/src/a%20b.ts");
    }

    #[test]
    fn join_style_keeps_slashes_in_versions_and_escapes_literals() {
        let url = evaluate_file_url_template(
            r#"{{ URLJoinPath "https://git.example.com/a \"b\"" "-/blob" .Version .Path }}"#,
            "release/1.0",
            "docs/#notes?.md",
            None,
        )
        .unwrap();
        assert_eq!(
            url,
            "https://git.example.com/a \"b\"/-/blob/release/1.0/docs/%23notes%3F.md"
        );
    }

    #[test]
    fn substitution_style_replaces_literally() {
        let url = evaluate_file_url_template(
            "https://example.com/{{.Version}}/{{.Path}}",
            "v1",
            "x/y",
            None,
        )
        .unwrap();
        assert_eq!(url, "https://example.com/v1/x/y");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let url = evaluate_file_url_template(
            "https://example.com/{{.Version}}/{{.Path}}",
            "{{.Path}}",
            "$1/{{.Version}}",
            None,
        )
        .unwrap();
        assert_eq!(url, "https://example.com/{{.Path}}/$1/{{.Version}}");
    }

    #[test]
    fn line_fragment_is_appended_only_when_requested() {
        let template = "https://example.com/blob/{{.Version}}/{{.Path}}";
        let with_line =
            evaluate_file_url_template(template, "v2", "lib.rs", Some(("#L{{.LineNumber}}", 42)))
                .unwrap();
        assert_eq!(with_line, "https://example.com/blob/v2/lib.rs#L42");
        let without = evaluate_file_url_template(template, "v2", "lib.rs", None).unwrap();
        assert_eq!(without, "https://example.com/blob/v2/lib.rs");
    }

    #[test]
    fn commit_templates_support_both_styles() {
        assert_eq!(
            evaluate_commit_url_template(
                r#"{{URLJoinPath "https://github.com/o/r" "commit" .Version}}"#,
                "abc/def"
            )
            .unwrap(),
            "https://github.com/o/r/commit/abc/def"
        );
        assert_eq!(
            evaluate_commit_url_template("https://github.com/o/r/commit/{{.Version}}", "abc")
                .unwrap(),
            "https://github.com/o/r/commit/abc"
        );
        assert_eq!(
            evaluate_commit_url_template(r#"{{URLJoinPath "https://x" .Path}}"#, "abc"),
            Err(TemplateError::UnsupportedArgument(".Path".to_string()))
        );
    }

    #[test]
    fn malformed_join_templates_are_errors() {
        assert!(matches!(
            evaluate_file_url_template(r#"{{URLJoinPath "https://x .Path}}"#, "v", "p", None),
            Err(TemplateError::UnterminatedLiteral(_))
        ));
        assert!(matches!(
            evaluate_file_url_template(r#"{{URLJoinPath "bad \q" .Path}}"#, "v", "p", None),
            Err(TemplateError::InvalidLiteral { .. })
        ));
        assert_eq!(
            evaluate_file_url_template(r#"{{URLJoinPath "https://x" .Branch}}"#, "v", "p", None),
            Err(TemplateError::UnsupportedArgument(".Branch".to_string()))
        );
    }
}
