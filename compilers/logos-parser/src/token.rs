#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn shift(self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of word-forming characters.
    Word,
    /// A single punctuation mark.
    Punctuation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Byte offsets into the tokenized input.
    pub span: Span,
    pub text: &'a str,
    pub kind: TokenKind,
}

impl Token<'_> {
    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    /// Marks that close a sentence.
    pub fn ends_sentence(&self) -> bool {
        self.kind == TokenKind::Punctuation
            && matches!(self.text, "." | "!" | "?" | ";" | "\u{2026}" | "\u{037E}")
    }
}
