use std::fmt::Display;

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
pub use text_size::TextRange;

/// The fail-fast error of the front end.
///
/// Parsing either completes or aborts with one of these; no partial tree is
/// guaranteed usable afterwards. The line number points at the offending
/// source line of the analyzed file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyntaxError {
    message: String,
    line_number: u32,
    range: TextRange,
}

pub type Result<T> = std::result::Result<T, SyntaxError>;

impl SyntaxError {
    pub fn new(message: impl Into<String>, line_number: u32, range: TextRange) -> Self {
        Self { message: message.into(), line_number, range }
    }

    pub fn unexpected_symbol(text: &str, line_number: u32, range: TextRange) -> Self {
        Self::new(format!("unexpected symbol `{text}`"), line_number, range)
    }

    pub fn unexpected_end_of_file(line_number: u32, range: TextRange) -> Self {
        Self::new("unexpected end of file", line_number, range)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let message = Level::Error.title(&self.message).snippet(
            Snippet::source(text)
                .origin(path)
                .annotation(Level::Error.span(self.range.into()).label("here"))
                .fold(true),
        );
        renderer.render(message)
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "syntax error on line {}: {}", self.line_number, self.message)
    }
}

impl std::error::Error for SyntaxError {}
