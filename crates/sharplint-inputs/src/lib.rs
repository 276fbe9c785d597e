use std::sync::OnceLock;

use camino::Utf8PathBuf;
pub use line_index::LineIndex;

/// One source unit handed to the front end.
#[derive(Debug)]
pub struct SourceFile {
    path: Utf8PathBuf,
    text: String,
    line_index: OnceLock<LineIndex>,
}

impl SourceFile {
    pub fn new(path: Utf8PathBuf, text: String) -> Self {
        Self { path, text, line_index: OnceLock::new() }
    }

    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        self.line_index.get_or_init(|| LineIndex::new(&self.text))
    }
}
