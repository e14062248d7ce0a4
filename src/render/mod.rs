use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::template::{render_tokens, TemplateContext};
use crate::{LetterMergeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Html,
    Markdown,
    Text,
}

/// One outgoing message, fully rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    /// `None` for plain-text messages.
    pub html_body: Option<String>,
    /// Always present.
    pub text_body: String,
    /// Display name shown next to the sender address.
    pub sender_name: Option<String>,
}

impl RenderedEmail {
    /// A plain-text message with no sender display name.
    pub fn plain(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html_body: None,
            text_body: body.into(),
            sender_name: None,
        }
    }
}

/// The message body template, loaded once per run.
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    pub body: String,
    pub format: BodyFormat,
    /// CSS inlined into the HTML body.
    pub css: Option<String>,
}

impl EmailTemplate {
    /// Read the template at `path`. A relative `stylesheet` resolves against the
    /// template's directory.
    pub fn load(path: &Path, format: BodyFormat, stylesheet: Option<&Path>) -> Result<Self> {
        let body = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LetterMergeError::TemplateNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                LetterMergeError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let template_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let css = stylesheet
            .map(|s| read_stylesheet(&template_dir.join(s)))
            .transpose()?;
        Ok(Self { body, format, css })
    }

    pub fn from_body(body: impl Into<String>, format: BodyFormat) -> Self {
        Self {
            body: body.into(),
            format,
            css: None,
        }
    }

    /// Render subject and body for one recipient.
    pub fn render(
        &self,
        to: &str,
        subject_template: &str,
        context: &TemplateContext,
    ) -> Result<RenderedEmail> {
        let subject = render_tokens(subject_template, context);
        let rendered_body = render_tokens(&self.body, context);

        let (html_body, text_body) = match self.format {
            BodyFormat::Markdown => {
                let html = markdown_to_html(&rendered_body);
                let html = apply_css(&html, self.css.as_deref())?;
                let text = strip_html(&html);
                (Some(html), text)
            }
            BodyFormat::Html => {
                let html = apply_css(&rendered_body, self.css.as_deref())?;
                let text = strip_html(&html);
                (Some(html), text)
            }
            BodyFormat::Text => (None, rendered_body),
        };

        Ok(RenderedEmail {
            to: to.to_string(),
            subject,
            html_body,
            text_body,
            sender_name: None,
        })
    }
}

fn read_stylesheet(full_path: &Path) -> Result<String> {
    std::fs::read_to_string(full_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LetterMergeError::StylesheetNotFound {
                path: PathBuf::from(full_path),
            }
        } else {
            LetterMergeError::Io {
                path: full_path.to_path_buf(),
                source: e,
            }
        }
    })
}

fn markdown_to_html(markdown: &str) -> String {
    let mut options = comrak::Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.render.r#unsafe = true;
    comrak::markdown_to_html(markdown, &options)
}

fn apply_css(html: &str, css: Option<&str>) -> Result<String> {
    let Some(css_str) = css else {
        return Ok(html.to_string());
    };
    let inliner = css_inline::CSSInliner::options()
        .load_remote_stylesheets(false)
        .build();
    // inline_fragment only styles the first top-level element, so wrap the body.
    let wrapped = format!("<div>{html}</div>");
    let inlined = inliner
        .inline_fragment(&wrapped, css_str)
        .map_err(|e| LetterMergeError::CssInline {
            reason: e.to_string(),
        })?;
    // The wrapper's opening tag may have picked up styles from a `div` rule.
    let inner = if inlined.starts_with("<div") {
        let start = inlined.find('>').map(|i| i + 1).unwrap_or(0);
        let end = inlined.rfind("</div>").unwrap_or(inlined.len());
        &inlined[start..end]
    } else {
        &inlined
    };
    Ok(inner.to_string())
}

/// Plain-text alternative of an HTML body: tags dropped, common entities decoded,
/// line breaks kept for block elements.
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag = String::new();
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if matches!(name.as_str(), "br" | "p" | "div" | "li" | "tr" | "h1" | "h2" | "h3")
                    && !result.ends_with('\n')
                    && !result.is_empty()
                {
                    result.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => result.push(ch),
        }
    }
    result
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
}
