use crate::source::Span;

use super::error::LexError;
use super::token::Token;

/// Character-level scanner for one judgement line.
///
/// Owns the line as a character buffer so that spans and the
/// surrounding-bracket scan work in character positions. Identifiers are
/// read with maximal munch; the terminating character is left in place for
/// the next call.
pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
}

fn is_lambda_marker(ch: char) -> bool {
    ch == '\\' || ch == 'λ'
}

fn is_identifier_char(ch: char) -> bool {
    (ch.is_alphabetic() && ch != 'λ') || ch.is_ascii_digit()
}

impl Tokenizer {
    pub fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Scan the next token. Spaces are skipped; the end of the line is
    /// reported as a token so the parser can treat it like any other
    /// lookahead.
    pub fn next_token(&mut self) -> Result<(Token, Span), LexError> {
        while self.peek() == Some(' ') {
            self.pos += 1;
        }
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok((Token::EndOfLine, Span::at(start)));
        };
        self.pos += 1;

        match ch {
            '(' => Ok((Token::LeftBracket, Span::new(start, self.pos))),
            ')' => Ok((Token::RightBracket, Span::new(start, self.pos))),
            '^' => Ok((Token::TypeMarker, Span::new(start, self.pos))),
            ':' => Ok((Token::JudgementSeparator, Span::new(start, self.pos))),
            '-' => {
                if self.peek() == Some('>') {
                    self.pos += 1;
                    Ok((Token::Arrow, Span::new(start, self.pos)))
                } else {
                    Err(LexError::MalformedArrow {
                        span: Span::new(start, self.pos),
                    })
                }
            }
            '>' => Err(LexError::StrayArrowHead {
                span: Span::new(start, self.pos),
            }),
            ch if is_lambda_marker(ch) => Ok((Token::Lambda, Span::new(start, self.pos))),
            ch if ch.is_ascii_digit() => Err(LexError::DigitLedIdentifier {
                span: Span::new(start, self.pos),
            }),
            ch if is_identifier_char(ch) => {
                let mut name = String::new();
                name.push(ch);
                while let Some(next) = self.peek() {
                    if !is_identifier_char(next) {
                        break;
                    }
                    name.push(next);
                    self.pos += 1;
                }
                let span = Span::new(start, self.pos);
                if ch.is_lowercase() {
                    Ok((Token::TermVar(name), span))
                } else {
                    Ok((Token::TypeVar(name), span))
                }
            }
            ch => Err(LexError::UnrecognizedCharacter {
                ch,
                span: Span::new(start, self.pos),
            }),
        }
    }

    /// Net unmatched parentheses immediately surrounding a token: contiguous
    /// `(` (skipping spaces and lambda markers) to its left count +1 each,
    /// contiguous `)` (skipping spaces) to its right count -1 each.
    ///
    /// Lambda markers are skipped on the left because a bracket opening a
    /// lambda is credited to the bound variable, not to the lambda itself.
    pub fn bracket_delta_around(&self, span: Span) -> i32 {
        let mut counter = 0;
        for &ch in self.chars[..span.start].iter().rev() {
            if ch == '(' {
                counter += 1;
            } else if ch == ' ' || is_lambda_marker(ch) {
                continue;
            } else {
                break;
            }
        }
        for &ch in &self.chars[span.end.min(self.chars.len())..] {
            if ch == ')' {
                counter -= 1;
            } else if ch == ' ' {
                continue;
            } else {
                break;
            }
        }
        counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::{expect, Expect};

    fn check(input: &str, expected: Expect) {
        let mut tokenizer = Tokenizer::new(input);
        let mut lines = Vec::new();
        loop {
            match tokenizer.next_token() {
                Ok((Token::EndOfLine, span)) => {
                    lines.push(format!("end of line @ {}", span));
                    break;
                }
                Ok((token, span)) => lines.push(format!("{} @ {}", token, span)),
                Err(err) => {
                    lines.push(format!("error: {}", err));
                    break;
                }
            }
        }
        expected.assert_eq(&(lines.join("\n") + "\n"));
    }

    #[test]
    fn tokenizes_a_judgement_line() {
        check(
            r"\x^A x : A -> A",
            expect![[r#"
                λ @ 0..1
                x @ 1..2
                ^ @ 2..3
                A @ 3..4
                x @ 5..6
                : @ 7..8
                A @ 9..10
                -> @ 11..13
                A @ 14..15
                end of line @ 15..15
            "#]],
        );
    }

    #[test]
    fn brackets_and_unicode_lambda() {
        check(
            "(λab^Ty cd)",
            expect![[r#"
                ( @ 0..1
                λ @ 1..2
                ab @ 2..4
                ^ @ 4..5
                Ty @ 5..7
                cd @ 8..10
                ) @ 10..11
                end of line @ 11..11
            "#]],
        );
    }

    #[test]
    fn identifier_case_decides_the_token_kind() {
        check(
            "x1 Ab9",
            expect![[r#"
                x1 @ 0..2
                Ab9 @ 3..6
                end of line @ 6..6
            "#]],
        );
    }

    #[test]
    fn digit_led_identifier_is_rejected() {
        check(
            "x 1y",
            expect![[r#"
                x @ 0..1
                error: Identifiers cannot start with a digit
            "#]],
        );
    }

    #[test]
    fn lone_dash_is_a_malformed_arrow() {
        check(
            "A - B",
            expect![[r#"
                A @ 0..1
                error: Malformed arrow: expected '>' after '-'
            "#]],
        );
    }

    #[test]
    fn stray_arrow_head_is_rejected() {
        check(
            "A > B",
            expect![[r#"
                A @ 0..1
                error: Stray '>' without a preceding '-'
            "#]],
        );
    }

    #[test]
    fn unknown_character_is_rejected() {
        check(
            "x ~",
            expect![[r#"
                x @ 0..1
                error: Unrecognized character: '~'
            "#]],
        );
    }

    #[test]
    fn bracket_delta_counts_the_surrounding_brackets() {
        // ((x)) y
        let tokenizer = Tokenizer::new("((x)) y");
        assert_eq!(tokenizer.bracket_delta_around(Span::new(2, 3)), 0);
        // In (\x^A x) the bound variable is credited with the lambda's bracket.
        let tokenizer = Tokenizer::new(r"(\x^A x)");
        assert_eq!(tokenizer.bracket_delta_around(Span::new(2, 3)), 1);
        assert_eq!(tokenizer.bracket_delta_around(Span::new(6, 7)), -1);
        assert_eq!(tokenizer.bracket_delta_around(Span::new(4, 5)), 0);
    }
}
