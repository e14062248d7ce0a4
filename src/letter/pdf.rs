use std::path::Path;

use genpdf::elements::{Break, LinearLayout, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Style, StyledString};
use genpdf::Document;

use super::{Block, Letter};
use crate::{LetterMergeError, Result};

const MARGIN_MM: i32 = 20;

/// Turns a finished [`Letter`] into a portable document.
pub trait LetterExporter {
    /// Export consumes the letter; nothing of the editable form outlives it.
    fn export(&self, letter: Letter) -> Result<Vec<u8>>;
}

/// PDF export through genpdf.
pub struct GenpdfExporter {
    fonts: FontFamily<FontData>,
}

impl GenpdfExporter {
    /// Load `<family>-Regular.ttf`, `-Bold.ttf`, `-Italic.ttf` and
    /// `-BoldItalic.ttf` from `font_dir`.
    pub fn from_font_dir(font_dir: &Path, family: &str) -> Result<Self> {
        let fonts = genpdf::fonts::from_files(font_dir, family, None).map_err(|e| {
            LetterMergeError::FontLoad {
                dir: font_dir.to_path_buf(),
                family: family.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { fonts })
    }

    fn build_document(&self, letter: Letter) -> Document {
        let mut doc = Document::new(self.fonts.clone());
        doc.set_title(letter.title);
        doc.set_font_size(letter.font_size);
        doc.set_line_spacing(1.0);

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(MARGIN_MM);
        doc.set_page_decorator(decorator);

        let line_height = f64::from(letter.font_size);
        for block in letter.blocks {
            match block {
                Block::Paragraph {
                    text,
                    bold,
                    spacing_after,
                } => {
                    let style = if bold { Style::new().bold() } else { Style::new() };
                    doc.push(Paragraph::new(StyledString::new(text, style)));
                    if let Some(points) = spacing_after {
                        doc.push(Break::new(points / line_height));
                    }
                }
                Block::Bullet { text } => {
                    let mut p = Paragraph::new("");
                    p.push(StyledString::new("• ", Style::new()));
                    p.push(StyledString::new(text, Style::new()));
                    let mut layout = LinearLayout::vertical();
                    layout.push(p);
                    doc.push(layout);
                }
            }
        }
        doc
    }
}

impl LetterExporter for GenpdfExporter {
    fn export(&self, letter: Letter) -> Result<Vec<u8>> {
        let title = letter.title.clone();
        let doc = self.build_document(letter);
        let mut out = Vec::new();
        doc.render(&mut out)
            .map_err(|e| LetterMergeError::PdfExport {
                title,
                reason: e.to_string(),
            })?;
        Ok(out)
    }
}
