pub mod parser;
pub mod token;

use logos_protocol::{Interpretation, Occurrence, Paragraph, Segment, TextId, WsId};
use logos_store::StoreData;
use thiserror::Error;
use tracing::debug;

use crate::parser::{parse_with_spans, RawToken};
use crate::token::{Span, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("writing system {0} does not exist")]
    UnknownWritingSystem(WsId),
}

/// Primary entry point: Text -> Tokens
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    parse_with_spans(input)
        .into_iter()
        .map(|(span, raw)| {
            let kind = match raw {
                RawToken::Word(_) => TokenKind::Word,
                RawToken::Punct(_) => TokenKind::Punctuation,
            };
            Token {
                span,
                text: &input[span.start..span.end],
                kind,
            }
        })
        .collect()
}

/// Paragraphs are separated by blank lines. Returns each paragraph with its
/// byte offset in `input`.
pub fn split_paragraphs(input: &str) -> Vec<(usize, &str)> {
    let mut paragraphs = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in input.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                paragraphs.push((s, &input[s..end]));
            }
        } else {
            if start.is_none() {
                start = Some(offset);
            }
            end = offset + line.len();
        }
        offset += line.len();
    }
    if let Some(s) = start {
        paragraphs.push((s, &input[s..end]));
    }
    paragraphs
}

/// Groups tokens into sentences. A sentence ends at the first word after a
/// sentence-final mark, so closing quotes stay with their sentence.
pub fn split_segments<'a>(tokens: Vec<Token<'a>>) -> Vec<Vec<Token<'a>>> {
    let mut segments = Vec::new();
    let mut current: Vec<Token<'a>> = Vec::new();
    let mut closed = false;

    for token in tokens {
        if token.is_word() && closed {
            segments.push(std::mem::take(&mut current));
            closed = false;
        }
        if token.ends_sentence() {
            closed = true;
        }
        current.push(token);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Paragraph -> Segment -> Token structure of `input`, spans relative to `input`.
pub fn structure(input: &str) -> Vec<Vec<Vec<Token<'_>>>> {
    split_paragraphs(input)
        .into_iter()
        .map(|(offset, paragraph)| {
            let tokens = tokenize(paragraph)
                .into_iter()
                .map(|t| {
                    let span: Span = t.span.shift(offset);
                    Token {
                        span,
                        text: &input[span.start..span.end],
                        kind: t.kind,
                    }
                })
                .collect();
            split_segments(tokens)
        })
        .collect()
}

/// Builds a text in the store: one occurrence per token, word tokens bound
/// to the wordform with exactly their text (found or created).
pub fn import_text(
    data: &mut StoreData,
    title: &str,
    vernacular: WsId,
    input: &str,
) -> Result<TextId, ImportError> {
    if data.writing_system(vernacular).is_none() {
        return Err(ImportError::UnknownWritingSystem(vernacular));
    }

    let mut paragraphs = Vec::new();
    for raw_paragraph in structure(input) {
        let mut segments = Vec::new();
        for raw_segment in raw_paragraph {
            let occurrences = raw_segment
                .iter()
                .map(|token| {
                    let interpretation = match token.kind {
                        TokenKind::Word => Interpretation::Wordform(
                            data.find_or_create_wordform(vernacular, token.text),
                        ),
                        TokenKind::Punctuation => Interpretation::Punctuation(token.text.to_string()),
                    };
                    Occurrence::new(token.text, interpretation)
                })
                .collect();
            segments.push(Segment {
                occurrences,
                ..Segment::default()
            });
        }
        paragraphs.push(Paragraph { segments });
    }

    let count: usize = paragraphs.iter().map(|p| p.segments.len()).sum();
    let id = data.insert_text(title, vernacular, paragraphs);
    debug!(text = %id, segments = count, "imported text");
    Ok(id)
}
