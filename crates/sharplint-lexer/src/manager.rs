use crate::Symbol;

/// Lookahead cursor over a lexed symbol sequence.
///
/// `peek` is idempotent and side-effect free; `advance` consumes exactly one
/// symbol. Calling `advance` past the end is a defect in the calling parser,
/// not a user-facing error, and panics.
pub struct SymbolManager<'t> {
    symbols: Vec<Symbol<'t>>,
    index: usize,
    generated: bool,
}

impl<'t> SymbolManager<'t> {
    pub fn new(symbols: Vec<Symbol<'t>>) -> Self {
        Self { symbols, index: 0, generated: false }
    }

    /// The n-th symbol ahead (1-based) without consuming it.
    pub fn peek(&self, n: usize) -> Option<&Symbol<'t>> {
        debug_assert!(n > 0, "peek is 1-based");
        self.symbols.get(self.index + n - 1)
    }

    /// Consumes and returns the next symbol.
    pub fn advance(&mut self) -> Symbol<'t> {
        let symbol = self.symbols[self.index];
        self.index += 1;
        self.generated = symbol.generated;
        symbol
    }

    /// Whether the most recently consumed symbol came from generated code.
    pub fn generated(&self) -> bool {
        self.generated
    }

    /// Rewinds to the start of the sequence for another pass.
    pub fn reset(&mut self) {
        self.index = 0;
        self.generated = false;
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use sharplint_span::Location;

    use super::*;
    use crate::{Definitions, Lexer};

    #[test]
    fn peek_is_idempotent() {
        let symbols =
            Lexer::new("a b", Location::FIRST, &Definitions::default()).symbols().unwrap();
        let manager = SymbolManager::new(symbols);

        assert_eq!(manager.peek(1).unwrap().text, "a");
        assert_eq!(manager.peek(1).unwrap().text, "a");
        assert_eq!(manager.peek(3).unwrap().text, "b");
        assert!(manager.peek(4).is_none());
    }

    #[test]
    fn advance_consumes_exactly_one() {
        let symbols =
            Lexer::new("a b", Location::FIRST, &Definitions::default()).symbols().unwrap();
        let mut manager = SymbolManager::new(symbols);

        assert_eq!(manager.advance().text, "a");
        assert_eq!(manager.peek(1).unwrap().text, " ");
        assert_eq!(manager.advance().text, " ");
        assert_eq!(manager.advance().text, "b");
        assert!(manager.is_at_end());
    }

    #[test]
    fn reset_rewinds_to_the_start() {
        let symbols =
            Lexer::new("a b", Location::FIRST, &Definitions::default()).symbols().unwrap();
        let mut manager = SymbolManager::new(symbols);

        while !manager.is_at_end() {
            manager.advance();
        }
        manager.reset();

        assert_eq!(manager.peek(1).unwrap().text, "a");
        assert!(!manager.generated());
        assert!(!manager.is_at_end());
    }

    #[test]
    fn generated_state_follows_regions() {
        let text = "a\n#region generated code\nb\n#endregion\nc\n";
        let symbols =
            Lexer::new(text, Location::FIRST, &Definitions::default()).symbols().unwrap();
        let mut manager = SymbolManager::new(symbols);

        let mut seen = Vec::new();
        while !manager.is_at_end() {
            let symbol = manager.advance();
            if !symbol.text.trim().is_empty() {
                seen.push((symbol.text, manager.generated()));
            }
        }

        assert!(seen.contains(&("a", false)));
        assert!(seen.contains(&("b", true)));
        assert!(seen.contains(&("c", false)));
    }
}
