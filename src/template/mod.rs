mod context;
mod tokens;

pub use context::{TemplateContext, TOKEN_DATE, TOKEN_DOCUMENT_LINK};
pub use tokens::{referenced_tokens, render_tokens};

/// Letter and email date, e.g. `March 01, 2025`.
pub const DATE_FORMAT: &str = "%B %d, %Y";

pub fn format_date(date: chrono::DateTime<chrono::Local>) -> String {
    date.format(DATE_FORMAT).to_string()
}
