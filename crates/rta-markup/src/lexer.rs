//! # Lexer - Tokenizing Markup Fragments
//!
//! First stage of fragment parsing: breaking markup into coarse tokens with
//! the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Lossless Guarantee
//!
//! Every byte of the input appears in exactly one token. A stray `<` that
//! does not start a tag or comment becomes its own [`TokenKind::Lt`] token and
//! the parser treats it as text:
//!
//! ```
//! use rta_markup::lexer::lex;
//!
//! let input = "a <b>bold</b> < c";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tags are lexed as whole tokens (`<em class="x">`, `</em>`); their name
//! and attributes are picked apart by the parser. Keeping the lexer
//! context-free means there is no "inside a tag" mode to track.

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<!-- ... -->`
    #[regex(r"<!--([^-]|-[^-])*-->")]
    Comment,

    /// `</name>`
    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>")]
    CloseTag,

    /// `<name attr="value">` or `<name/>`
    #[regex(r"<[a-zA-Z][^<>]*>")]
    OpenTag,

    /// Character data up to the next `<`
    #[regex(r"[^<]+")]
    Text,

    /// A `<` that starts neither a tag nor a comment
    #[token("<")]
    Lt,
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input).into_iter().map(|(token, _)| token).collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        // Logos error means unrecognized input - treat as text
        let kind = result.unwrap_or(TokenKind::Text);
        tokens.push((Token { kind, text }, span));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(kind: TokenKind, text: &str) -> Token<'_> {
        Token { kind, text }
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn lex_plain_text() {
        assert_eq!(lex("toucan"), vec![token(TokenKind::Text, "toucan")]);
    }

    #[test]
    fn lex_element_with_text() {
        assert_eq!(
            lex("<ins>the</ins> <em>To</em>"),
            vec![
                token(TokenKind::OpenTag, "<ins>"),
                token(TokenKind::Text, "the"),
                token(TokenKind::CloseTag, "</ins>"),
                token(TokenKind::Text, " "),
                token(TokenKind::OpenTag, "<em>"),
                token(TokenKind::Text, "To"),
                token(TokenKind::CloseTag, "</em>"),
            ]
        );
    }

    #[test]
    fn lex_self_closing_image() {
        assert_eq!(
            lex(r#"<img src="clear.cache.gif" width="10"/>"#),
            vec![token(
                TokenKind::OpenTag,
                r#"<img src="clear.cache.gif" width="10"/>"#
            )]
        );
    }

    #[test]
    fn lex_comments() {
        assert_eq!(
            lex("<!--x--><span>y</span><!--z-->"),
            vec![
                token(TokenKind::Comment, "<!--x-->"),
                token(TokenKind::OpenTag, "<span>"),
                token(TokenKind::Text, "y"),
                token(TokenKind::CloseTag, "</span>"),
                token(TokenKind::Comment, "<!--z-->"),
            ]
        );
    }

    #[test]
    fn lex_stray_angle_bracket() {
        assert_eq!(
            lex("1 < 2"),
            vec![
                token(TokenKind::Text, "1 "),
                token(TokenKind::Lt, "<"),
                token(TokenKind::Text, " 2"),
            ]
        );
    }

    #[test]
    fn all_bytes_preserved() {
        let input = "ab<em>cd</em>ef<ins class='a'>gh</ins>ij<!-- note --><br>";
        let reconstructed: String = lex(input).iter().map(|t| t.text).collect();
        assert_eq!(input, reconstructed);
    }

    #[test]
    fn spans_are_correct() {
        let input = "<p>123</p>";
        for (token, span) in &lex_with_spans(input) {
            assert_eq!(token.text, &input[span.clone()]);
        }
    }
}
