//! Splits a document into tag literals and runs of text.
//!
//! Purely lexical: no nesting awareness and no knowledge of the vocabulary.
//! Concatenating the raw text of every token gives back the input.
//!
//! A `<` with no later `>` is literal text and belongs to the surrounding
//! text token.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `<` up to and including the next `>`.
    Tag(&'a str),
    Text(&'a str),
}

impl<'a> Token<'a> {
    pub fn raw(&self) -> &'a str {
        match self {
            Token::Tag(x) | Token::Text(x) => *x,
        }
    }
    pub fn is_tag(&self) -> bool {
        match self {
            Token::Tag(_) => true,
            _ => false,
        }
    }
    pub fn unpack_tag(&self) -> Option<&'a str> {
        match self {
            Token::Tag(x) => Some(*x),
            _ => None,
        }
    }
}

/// Cursor over the source text. Iterating yields tokens; [`Tokenizer::take_until`]
/// consumes an opaque span straight from the source instead.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Tokenizer {source, position: 0}
    }
    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.position
    }
    /// Consumes everything up to the earliest occurrence of any of `closers`,
    /// and the closer itself. Returns the body and whether a closer was found;
    /// without one the body runs to end of input.
    pub fn take_until(&mut self, closers: &[&str]) -> (&'a str, bool) {
        let rest = &self.source[self.position..];
        let found = closers
            .iter()
            .filter(|x| !x.is_empty())
            .filter_map(|x| rest.find(*x).map(|ix| (ix, x.len())))
            .min();
        match found {
            Some((ix, len)) => {
                self.position = self.position + ix + len;
                (&rest[..ix], true)
            }
            None => {
                self.position = self.source.len();
                (rest, false)
            }
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;
    fn next(&mut self) -> Option<Token<'a>> {
        let rest = &self.source[self.position..];
        if rest.is_empty() {
            return None;
        }
        let token = match rest.find('<') {
            Some(0) => match rest.find('>') {
                Some(close) => Token::Tag(&rest[..=close]),
                // UNTERMINATED; THE REST IS TEXT
                None => Token::Text(rest),
            },
            Some(open) if rest[open..].contains('>') => Token::Text(&rest[..open]),
            _ => Token::Text(rest),
        };
        self.position = self.position + token.raw().len();
        Some(token)
    }
}

pub fn tokenize<'a>(source: &'a str) -> Vec<Token<'a>> {
    let tokens = Tokenizer::new(source).collect::<Vec<_>>();
    tracing::trace!(count = tokens.len(), "tokenized document");
    tokens
}
