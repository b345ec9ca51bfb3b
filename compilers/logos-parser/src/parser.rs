use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::anychar,
    combinator::{map, recognize},
    IResult,
};

use crate::token::Span;

/// Characters that form words: letters, digits, combining marks and
/// word-internal apostrophes.
fn is_word_char(c: char) -> bool {
    match c {
        '\u{0300}'..='\u{036F}' => true, // Combining diacritics
        '\'' | '\u{2019}' | '\u{02BC}' => true,
        _ => c.is_alphanumeric(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawToken<'a> {
    Word(&'a str),
    Punct(&'a str),
}

fn raw_token(input: &str) -> IResult<&str, RawToken<'_>> {
    alt((
        map(take_while1(is_word_char), RawToken::Word),
        map(recognize(anychar), RawToken::Punct),
    ))(input)
}

pub fn parse_with_spans(original_input: &str) -> Vec<(Span, RawToken<'_>)> {
    let mut input = original_input;
    let mut result = Vec::new();

    loop {
        // 1. Skip whitespace (Unicode spaces included)
        let (next_input, _) = match take_while::<_, &str, nom::error::Error<&str>>(char::is_whitespace)(input) {
            Ok(res) => res,
            Err(_) => break,
        };
        input = next_input;

        if input.is_empty() {
            break;
        }

        // 2. Match a word or a single mark
        match raw_token(input) {
            Ok((next_input, token)) => {
                let len = input.len() - next_input.len();
                let start = original_input.len() - input.len();

                result.push((Span::new(start, start + len), token));
                input = next_input;
            }
            Err(_) => break,
        }
    }

    result
}
