//! Template rendering collaborator and the formatting filters it exposes.
//!
//! Filters registered on every [`TeraRenderer`]:
//!
//! - `delimnumber`: `{{ 12345678 | delimnumber }}` renders `12,345,678`
//! - `plural`: `{{ count }} file{{ count | plural }}`, or with explicit
//!   suffixes `{{ n }} entr{{ n | plural(singular="y", plural="ies") }}`
//! - `splituri`: breadcrumb pairs for an archive path

use std::borrow::Cow;
use std::collections::HashMap;

use tera::{Context, Tera, Value};

use crate::error::Fault;

/// Turns a template name and context into a string.
pub trait Renderer {
    /// Renders `template` with `context`.
    fn render(&self, template: &str, context: &Context) -> Result<String, Fault>;
}

/// `tera`-backed renderer with the formatting filters registered.
#[derive(Debug)]
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    /// Loads every template matching `glob`, e.g. `"templates/**/*.html"`.
    pub fn from_glob(glob: &str) -> Result<Self, Fault> {
        let mut tera = Tera::new(glob)?;
        register_filters(&mut tera);
        Ok(Self { tera })
    }

    /// Builds a renderer from `(name, source)` pairs.
    pub fn from_raw<'a>(
        templates: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, Fault> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        register_filters(&mut tera);
        Ok(Self { tera })
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, template: &str, context: &Context) -> Result<String, Fault> {
        Ok(self.tera.render(template, context)?)
    }
}

fn register_filters(tera: &mut Tera) {
    tera.register_filter("delimnumber", delimnumber_filter);
    tera.register_filter("plural", plural_filter);
    tera.register_filter("splituri", splituri_filter);
}

/// Inserts comma thousands separators into a string of ASCII digits.
///
/// The leftover (shorter) group comes first. Anything that is not purely
/// digits is returned unchanged.
///
/// ```
/// use tinyapp::render::delim_number;
///
/// assert_eq!(delim_number("12345678"), "12,345,678");
/// assert_eq!(delim_number("7"), "7");
/// assert_eq!(delim_number("abc"), "abc");
/// assert_eq!(delim_number("-1234"), "-1234");
/// ```
pub fn delim_number(text: &str) -> Cow<'_, str> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Cow::Borrowed(text);
    }
    let lead = text.len() % 3;
    let mut groups = Vec::with_capacity(text.len() / 3 + 1);
    if lead > 0 {
        groups.push(&text[..lead]);
    }
    let mut pos = lead;
    while pos < text.len() {
        groups.push(&text[pos..pos + 3]);
        pos += 3;
    }
    Cow::Owned(groups.join(","))
}

/// Returns `singular` if `count` is the number 1, the string `"1"`, or
/// `true` (which counts as one), otherwise `plural`.
pub fn pluralize<'a>(count: &Value, singular: &'a str, plural: &'a str) -> &'a str {
    let is_one = match count {
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => s == "1",
        Value::Bool(b) => *b,
        _ => false,
    };
    if is_one {
        singular
    } else {
        plural
    }
}

/// Splits an archive path into `(label, link)` breadcrumbs.
///
/// Paths under `arch` get one crumb per segment, the first labelled
/// `Archive`. Any other path is a single crumb linking to itself.
///
/// ```
/// use tinyapp::render::split_uri;
///
/// assert_eq!(
///     split_uri("arch/games"),
///     vec![("Archive".to_string(), "arch".to_string()),
///          ("games".to_string(), "arch/games".to_string())]
/// );
/// assert_eq!(split_uri("about"), vec![("about".to_string(), "about".to_string())]);
/// ```
pub fn split_uri(uri: &str) -> Vec<(String, String)> {
    let segments: Vec<&str> = uri.split('/').collect();
    if segments.first() != Some(&"arch") {
        return vec![(uri.to_string(), uri.to_string())];
    }
    let mut crumbs = vec![("Archive".to_string(), "arch".to_string())];
    for ix in 1..segments.len() {
        crumbs.push((segments[ix].to_string(), segments[..=ix].join("/")));
    }
    crumbs
}

fn delimnumber_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Ok(other.clone()),
    };
    match delim_number(&text) {
        Cow::Borrowed(_) => Ok(value.clone()),
        Cow::Owned(delimited) => Ok(Value::String(delimited)),
    }
}

fn plural_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let singular = args.get("singular").and_then(Value::as_str).unwrap_or("");
    let plural = args.get("plural").and_then(Value::as_str).unwrap_or("s");
    Ok(Value::String(pluralize(value, singular, plural).to_string()))
}

fn splituri_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let uri = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("splituri expects a string"))?;
    Ok(tera::to_value(split_uri(uri))?)
}
