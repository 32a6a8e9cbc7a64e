//! Rendering of the driver configuration template.
//!
//! The built-in engine understands two constructs:
//!
//! - `{{ field }}` substitutes an XML-escaped context field, empty when unset
//! - `{% if field %} ... {% endif %}` keeps the block only when the field is
//!   set to a non-blank value (blocks do not nest)
//!
//! A statement tag alone on its line is removed together with that line, so
//! omitted blocks leave no blank lines behind.

use std::fs;
use std::path::PathBuf;

use crate::config_file::ConfigValue;
use crate::context::HuaweiContext;
use crate::error::{BackendError, Result};

/// Template shipped with the plugin
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/cinder_huawei_conf.xml");

/// Capability for turning a template and context into file content
pub trait Renderer {
    fn render(&self, template: &str, context: &HuaweiContext) -> Result<Vec<u8>>;
}

/// Where the template text comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    #[default]
    Embedded,
    File(PathBuf),
}

impl TemplateSource {
    pub fn load(&self) -> Result<String> {
        match self {
            Self::Embedded => Ok(DEFAULT_TEMPLATE.to_string()),
            Self::File(path) => fs::read_to_string(path).map_err(|e| {
                BackendError::template(format!("cannot read template {}: {e}", path.display()))
            }),
        }
    }
}

/// The placeholder engine described in the module docs
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl Renderer for TemplateRenderer {
    fn render(&self, template: &str, context: &HuaweiContext) -> Result<Vec<u8>> {
        render_str(template, context).map(String::into_bytes)
    }
}

enum Tag<'a> {
    Expr(&'a str),
    If(&'a str),
    EndIf,
}

/// Render `template` against `context` into a string
pub fn render_str(template: &str, context: &HuaweiContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut open_block: Option<&str> = None;
    let mut skipping = false;

    while let Some(start) = find_tag_start(rest) {
        if !skipping {
            out.push_str(&rest[..start]);
        }

        let (tag, consumed) = parse_tag(&rest[start..])?;
        rest = &rest[start + consumed..];

        match tag {
            Tag::Expr(name) => {
                let value = lookup(context, name)?;
                if !skipping {
                    if let Some(value) = value {
                        escape_xml_into(&value.to_string(), &mut out);
                    }
                }
            }
            Tag::If(name) => {
                if let Some(outer) = open_block {
                    return Err(BackendError::template(format!(
                        "nested block '{name}' inside '{outer}'"
                    )));
                }
                let present = lookup(context, name)?.is_some_and(|v| !v.is_blank());
                rest = strip_statement_line(&mut out, rest);
                open_block = Some(name);
                skipping = !present;
            }
            Tag::EndIf => {
                if open_block.take().is_none() {
                    return Err(BackendError::template("endif without matching if"));
                }
                rest = strip_statement_line(&mut out, rest);
                skipping = false;
            }
        }
    }

    if let Some(name) = open_block {
        return Err(BackendError::template(format!("unclosed block '{name}'")));
    }
    out.push_str(rest);
    Ok(out)
}

fn find_tag_start(text: &str) -> Option<usize> {
    match (text.find("{{"), text.find("{%")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Parse the tag at the start of `text`, returning it and its length
fn parse_tag(text: &str) -> Result<(Tag<'_>, usize)> {
    let close = if text.starts_with("{{") { "}}" } else { "%}" };
    let end = text[2..]
        .find(close)
        .map(|i| i + 2)
        .ok_or_else(|| BackendError::template(format!("unterminated tag near '{}'", snippet(text))))?;
    let inner = text[2..end].trim();
    let consumed = end + close.len();

    if close == "}}" {
        if inner.is_empty() {
            return Err(BackendError::template("empty expression"));
        }
        return Ok((Tag::Expr(inner), consumed));
    }

    let mut words = inner.split_whitespace();
    let tag = match (words.next(), words.next(), words.next()) {
        (Some("if"), Some(name), None) => Tag::If(name),
        (Some("endif"), None, None) => Tag::EndIf,
        _ => {
            return Err(BackendError::template(format!(
                "unsupported statement '{inner}'"
            )));
        }
    };
    Ok((tag, consumed))
}

fn lookup<'a>(context: &'a HuaweiContext, name: &str) -> Result<Option<&'a ConfigValue>> {
    context
        .field(name)
        .ok_or_else(|| BackendError::template(format!("unknown field '{name}'")))
}

/// Drop a statement tag's line when nothing else shares it
fn strip_statement_line<'a>(out: &mut String, rest: &'a str) -> &'a str {
    let trimmed = out.trim_end_matches([' ', '\t']).len();
    let line_start = trimmed == 0 || out[..trimmed].ends_with('\n');
    let after = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'));

    match after {
        Some(after) if line_start => {
            out.truncate(trimmed);
            after
        }
        _ => rest,
    }
}

fn escape_xml_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
}

fn snippet(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(24)
        .map_or(text.len(), |(i, _)| i);
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> HuaweiContext {
        HuaweiContext {
            product: Some(ConfigValue::from("Dorado")),
            password: Some(ConfigValue::from("p<a>ss&\"'")),
            alua: Some(ConfigValue::from(true)),
            ..Default::default()
        }
    }

    #[test]
    fn test_substitutes_and_escapes() {
        let out = render_str("<P>{{ product }}</P><W>{{password}}</W>", &ctx()).unwrap();
        assert_eq!(out, "<P>Dorado</P><W>p&lt;a&gt;ss&amp;&quot;&apos;</W>");
    }

    #[test]
    fn test_unset_field_renders_empty() {
        let out = render_str("<L>{{ luntype }}</L>", &ctx()).unwrap();
        assert_eq!(out, "<L></L>");
    }

    #[test]
    fn test_booleans_render_capitalised() {
        let out = render_str("ALUA=\"{{ alua }}\"", &ctx()).unwrap();
        assert_eq!(out, "ALUA=\"True\"");
    }

    #[test]
    fn test_if_block_kept_when_set() {
        let template = "<a>\n{% if product %}\n  <p>{{ product }}</p>\n{% endif %}\n</a>\n";
        let out = render_str(template, &ctx()).unwrap();
        assert_eq!(out, "<a>\n  <p>Dorado</p>\n</a>\n");
    }

    #[test]
    fn test_if_block_dropped_without_blank_lines() {
        let template = "<a>\n    {% if luntype %}\n  <l>{{ luntype }}</l>\n    {% endif %}\n</a>\n";
        let out = render_str(template, &ctx()).unwrap();
        assert_eq!(out, "<a>\n</a>\n");
    }

    #[test]
    fn test_inline_block() {
        let out = render_str("[{% if luntype %}x{% endif %}][{% if product %}y{% endif %}]", &ctx())
            .unwrap();
        assert_eq!(out, "[][y]");
    }

    #[test]
    fn test_blank_value_is_not_present() {
        let context = HuaweiContext {
            luntype: Some(ConfigValue::from(" ")),
            ..Default::default()
        };
        let out = render_str("{% if luntype %}set{% endif %}", &context).unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_template_errors() {
        let context = ctx();
        for bad in [
            "{{ nope }}",
            "{{ product ",
            "{{ }}",
            "{% if product %}",
            "{% endif %}",
            "{% if product %}{% if alua %}{% endif %}{% endif %}",
            "{% for x in y %}",
        ] {
            let err = render_str(bad, &context).unwrap_err();
            assert!(matches!(err, BackendError::Template(_)), "{bad} -> {err}");
        }
    }

    #[test]
    fn test_unknown_field_in_skipped_block_still_fails() {
        let err = render_str("{% if luntype %}{{ bogus }}{% endif %}", &ctx()).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_default_template_renders() {
        let bytes = TemplateRenderer.render(DEFAULT_TEMPLATE, &ctx()).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<Product>Dorado</Product>"));
        assert!(!xml.contains("<LUNType>"));
        assert!(!xml.contains("{{"));
        assert!(!xml.contains("{%"));
    }

    #[test]
    fn test_missing_template_file() {
        let source = TemplateSource::File(PathBuf::from("/nonexistent/template.xml"));
        assert!(matches!(source.load(), Err(BackendError::Template(_))));
    }
}
