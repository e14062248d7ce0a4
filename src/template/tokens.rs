use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::context::TemplateContext;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("valid token pattern"));

/// Replace every `{{token}}` in `template` with its value from `context`.
///
/// Token names are trimmed before lookup; unknown tokens become the empty
/// string, so no placeholder survives rendering. Substituted values are not
/// scanned again.
pub fn render_tokens(template: &str, context: &TemplateContext) -> String {
    TOKEN
        .replace_all(template, |caps: &Captures<'_>| {
            context.get(caps[1].trim()).unwrap_or_default().to_string()
        })
        .into_owned()
}

/// Distinct token names referenced by `template`, in order of first use.
pub fn referenced_tokens(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in TOKEN.captures_iter(template) {
        let name = caps[1].trim();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
