//! Letter of intent: composition, PDF export and publication.
//!
//! A [`LetterBuilder`] is the editable form of a letter. [`LetterBuilder::finish`]
//! freezes it into a [`Letter`], which an exporter consumes to produce the PDF.

mod compose;
mod generator;
mod pdf;

pub use compose::{compose_letter, sanitize_file_stem, FILE_STEM_FALLBACK, MAX_FILE_STEM_CHARS};
pub use generator::{artifact_file_name, DocumentGenerator, LetterGenerator};
pub use pdf::{GenpdfExporter, LetterExporter};

pub const FONT_SIZE: u8 = 12;

/// Default space after a paragraph, in points.
pub const PARAGRAPH_SPACING: f64 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph {
        text: String,
        bold: bool,
        /// Extra space below the paragraph, in points.
        spacing_after: Option<f64>,
    },
    Bullet {
        text: String,
    },
}

impl Block {
    pub fn text(&self) -> &str {
        match self {
            Block::Paragraph { text, .. } | Block::Bullet { text } => text,
        }
    }
}

/// A finished letter. Immutable; hand it to a [`LetterExporter`].
#[derive(Debug, Clone, PartialEq)]
pub struct Letter {
    pub title: String,
    pub font_size: u8,
    pub blocks: Vec<Block>,
}

impl Letter {
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            if let Block::Bullet { text } = block {
                out.push_str("• ");
                out.push_str(text);
            } else {
                out.push_str(block.text());
            }
            out.push('\n');
        }
        out
    }
}

/// Editable letter. Starts empty.
#[derive(Debug, Clone)]
pub struct LetterBuilder {
    title: String,
    blocks: Vec<Block>,
}

impl LetterBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn paragraph(&mut self, text: impl Into<String>, bold: bool) -> &mut Self {
        self.blocks.push(Block::Paragraph {
            text: text.into(),
            bold,
            spacing_after: None,
        });
        self
    }

    pub fn spaced(&mut self, text: impl Into<String>, bold: bool, points: f64) -> &mut Self {
        self.blocks.push(Block::Paragraph {
            text: text.into(),
            bold,
            spacing_after: Some(points),
        });
        self
    }

    pub fn bullet(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Bullet { text: text.into() });
        self
    }

    pub fn finish(self) -> Letter {
        Letter {
            title: self.title,
            font_size: FONT_SIZE,
            blocks: self.blocks,
        }
    }
}
