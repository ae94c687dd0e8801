use crate::source::Span;

use super::error::SyntaxError;
use super::token::{NodeKind, Token};
use super::tokenizer::Tokenizer;
use super::tree::Tree;

/// Parser recursion is bounded so deeply nested input fails cleanly instead
/// of exhausting the call stack.
const MAX_PARSE_DEPTH: usize = 256;

/// Recursive-descent parser for one judgement line:
///
/// ```text
/// Judgement  ::= Expr ':' TypeExpr EndOfLine
/// Expr       ::= LExpr MsExpr
/// MsExpr     ::= (empty, at EndOfLine or ':') | LExpr MsExpr
/// LExpr      ::= TermVar
///              | '(' LExpr LExpr ')'
///              | Lambda TermVar '^' TypeExpr LExpr
/// TypeExpr   ::= TypeVar TypeFunction?
///              | '(' TypeExpr ')' TypeFunction?
/// TypeFunction ::= '->' TypeExpr
/// ```
///
/// One token of lookahead, no backtracking. Every recognized terminal is
/// handed to the tree together with the net bracket count surrounding it in
/// the source line.
pub struct Parser<'t> {
    tokenizer: Tokenizer,
    tree: &'t mut Tree,
    token: Token,
    span: Span,
    prev_token: Token,
    /// Set after a lambda introducer: the next LExpr must be the bound
    /// variable.
    expect_variable: bool,
    /// Set after the bound variable: the next LExpr must be `^`.
    expect_type_marker: bool,
    /// Open-minus-closed bracket count, for balance checking only.
    open_brackets: i32,
    depth: usize,
}

impl<'t> Parser<'t> {
    pub fn new(line: &str, tree: &'t mut Tree) -> Self {
        Self {
            tokenizer: Tokenizer::new(line),
            tree,
            token: Token::EndOfLine,
            span: Span::at(0),
            prev_token: Token::EndOfLine,
            expect_variable: false,
            expect_type_marker: false,
            open_brackets: 0,
            depth: 0,
        }
    }

    /// Parse the line into the tree. The first error aborts the line.
    pub fn parse(&mut self) -> Result<(), SyntaxError> {
        self.tree.clear();
        self.advance()?;
        self.expr()?;
        self.judgement_separator()?;
        self.type_expr()?;
        self.finish()
    }

    fn advance(&mut self) -> Result<(), SyntaxError> {
        let (token, span) = self.tokenizer.next_token()?;
        self.prev_token = std::mem::replace(&mut self.token, token);
        self.span = span;
        Ok(())
    }

    // Expr + MsExpr: one required LExpr, then more until ':' or the end of
    // the line.
    fn expr(&mut self) -> Result<(), SyntaxError> {
        self.l_expr()?;
        while !matches!(self.token, Token::EndOfLine | Token::JudgementSeparator) {
            self.l_expr()?;
        }
        Ok(())
    }

    fn judgement_separator(&mut self) -> Result<(), SyntaxError> {
        if self.token != Token::JudgementSeparator {
            return Err(SyntaxError::MissingJudgementSeparator { span: self.span });
        }
        if self.tree.separator_index().is_some() {
            return Err(SyntaxError::DoubledJudgementSeparator { span: self.span });
        }
        self.tree.add_token(NodeKind::JudgementSeparator, ":", 0);
        self.advance()
    }

    fn l_expr(&mut self) -> Result<(), SyntaxError> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(SyntaxError::NestingTooDeep { span: self.span });
        }
        self.depth += 1;
        let result = self.l_expr_inner();
        self.depth -= 1;
        result
    }

    fn l_expr_inner(&mut self) -> Result<(), SyntaxError> {
        if self.expect_variable && !self.token.is_term_var() {
            return Err(SyntaxError::ExpectedVariable { span: self.span });
        }
        if self.expect_type_marker && self.token != Token::TypeMarker {
            return Err(SyntaxError::ExpectedTypeMarker { span: self.span });
        }
        match self.token.clone() {
            Token::Lambda => {
                self.tree.add_token(NodeKind::Lambda, "λ", 0);
                self.advance()?;
                self.expect_variable = true;
                self.l_expr()?;
                self.expect_type_marker = true;
                self.l_expr()?;
                self.type_expr()?;
                // The body, a required non-empty expression.
                self.l_expr()
            }
            Token::TermVar(name) => {
                let delta = self.tokenizer.bracket_delta_around(self.span);
                self.tree.add_token(NodeKind::TermVar, &name, delta);
                self.expect_variable = false;
                self.advance()
            }
            Token::LeftBracket => {
                self.open_brackets += 1;
                self.advance()?;
                self.l_expr()?;
                self.l_expr()
            }
            Token::RightBracket => {
                self.open_brackets -= 1;
                if self.open_brackets < 0 {
                    return Err(SyntaxError::BracketUnderflow { span: self.span });
                }
                self.advance()
            }
            Token::TypeMarker => {
                self.expect_type_marker = false;
                self.advance()
            }
            Token::TypeVar(name) => {
                if self.prev_token.is_type_var() {
                    Err(SyntaxError::ExpectedArrow { span: self.span })
                } else {
                    Err(SyntaxError::TypeVarInTerm {
                        name,
                        span: self.span,
                    })
                }
            }
            Token::EndOfLine => {
                if self.open_brackets > 0 {
                    Err(SyntaxError::UnclosedBracket { span: self.span })
                } else {
                    Err(SyntaxError::EmptyExpression { span: self.span })
                }
            }
            // A separator reached inside a bracket group means the group
            // never closed.
            Token::JudgementSeparator if self.open_brackets > 0 => {
                Err(SyntaxError::UnclosedBracket { span: self.span })
            }
            token @ (Token::Arrow | Token::JudgementSeparator) => {
                Err(SyntaxError::UnexpectedToken {
                    token: token.to_string(),
                    span: self.span,
                })
            }
        }
    }

    fn type_expr(&mut self) -> Result<(), SyntaxError> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(SyntaxError::NestingTooDeep { span: self.span });
        }
        self.depth += 1;
        let result = self.type_expr_inner();
        self.depth -= 1;
        result
    }

    fn type_expr_inner(&mut self) -> Result<(), SyntaxError> {
        match self.token.clone() {
            Token::TypeVar(name) => {
                let delta = self.tokenizer.bracket_delta_around(self.span);
                self.tree.add_token(NodeKind::TypeVar, &name, delta);
                self.advance()?;
                if self.type_function()? {
                    self.type_expr()?;
                }
                Ok(())
            }
            Token::LeftBracket => {
                self.open_brackets += 1;
                self.advance()?;
                self.type_expr()?;
                if self.token == Token::RightBracket {
                    self.open_brackets -= 1;
                    self.advance()?;
                    if self.type_function()? {
                        self.type_expr()?;
                    }
                }
                Ok(())
            }
            Token::RightBracket => Err(SyntaxError::ExpectedTypeVariable { span: self.span }),
            Token::TermVar(name) => Err(SyntaxError::TermVarInType {
                name,
                span: self.span,
            }),
            Token::Lambda => Err(SyntaxError::LambdaInType { span: self.span }),
            Token::EndOfLine => Err(SyntaxError::EmptyTypeExpression { span: self.span }),
            token @ (Token::TypeMarker | Token::Arrow | Token::JudgementSeparator) => {
                Err(SyntaxError::UnexpectedToken {
                    token: token.to_string(),
                    span: self.span,
                })
            }
        }
    }

    /// Peek for a `->` continuation; consumed and recorded when present.
    fn type_function(&mut self) -> Result<bool, SyntaxError> {
        if self.token == Token::Arrow {
            self.tree.add_token(NodeKind::Arrow, "->", 0);
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// After the type expression the line must be spent: a second `:` is the
    /// doubled-separator error, anything else is a trailing token, and any
    /// bracket still open never got closed.
    fn finish(&mut self) -> Result<(), SyntaxError> {
        match &self.token {
            Token::EndOfLine => {}
            Token::JudgementSeparator => {
                return Err(SyntaxError::DoubledJudgementSeparator { span: self.span });
            }
            token => {
                return Err(SyntaxError::TrailingToken {
                    token: token.to_string(),
                    span: self.span,
                });
            }
        }
        if self.open_brackets != 0 {
            return Err(SyntaxError::UnclosedBracket { span: self.span });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceAnnotator, Spanned};
    use expect_test::{expect, Expect};

    fn check(input: &str, expected: Expect) {
        let mut tree = Tree::new();
        let actual = match Parser::new(input, &mut tree).parse() {
            Ok(()) => format!("{}\n", tree.render_judgement()),
            Err(err) => SourceAnnotator::new()
                .with_label("error")
                .without_line_numbers()
                .annotate(None, 0, input, Some(err.span()), &err.to_string()),
        };
        expected.assert_eq(&actual);
    }

    #[test]
    fn parses_the_identity_judgement() {
        check(
            r"\x^A x : A -> A",
            expect![[r#"
                ((\x^(A)x):(A->A))
            "#]],
        );
    }

    #[test]
    fn parses_nested_lambdas() {
        check(
            r"\x^A \y^B x : A -> B -> A",
            expect![[r#"
                ((\x^(A)(\y^(B)x)):(A->(B->A)))
            "#]],
        );
    }

    #[test]
    fn parses_a_plain_application() {
        check(
            "x y : A",
            expect![[r#"
                ((x y):A)
            "#]],
        );
    }

    #[test]
    fn parses_an_applied_bracketed_lambda() {
        check(
            r"(\x^A x) y : A",
            expect![[r#"
                (((\x^(A)x)y):A)
            "#]],
        );
    }

    #[test]
    fn parses_a_bracketed_application_with_trailing_argument() {
        check(
            "(x y) z : A",
            expect![[r#"
                (((x y)z):A)
            "#]],
        );
    }

    #[test]
    fn parses_a_compound_annotation() {
        check(
            r"\x^(A->B) x : C",
            expect![[r#"
                ((\x^(A->B)x):C)
            "#]],
        );
    }

    #[test]
    fn rendering_its_own_output_is_stable() {
        let mut tree = Tree::new();
        Parser::new(r"\x^A x : A -> A", &mut tree).parse().unwrap();
        let term = tree.render_term();
        let declared = tree.render_declared_type().unwrap();

        let mut reparsed = Tree::new();
        Parser::new(&format!("{} : {}", term, declared), &mut reparsed)
            .parse()
            .unwrap();
        assert_eq!(reparsed.render_term(), term);
        assert_eq!(reparsed.render_declared_type().unwrap(), declared);
    }

    #[test]
    fn missing_separator_is_rejected() {
        check(
            "x y",
            expect![[r#"
                error: Expected judgement separator ':'
                x y
                   ^
            "#]],
        );
    }

    #[test]
    fn doubled_separator_is_rejected() {
        check(
            "x : A : B",
            expect![[r#"
                error: Doubled judgement separator ':'
                x : A : B
                      ^
            "#]],
        );
    }

    #[test]
    fn separator_inside_brackets_is_rejected() {
        check(
            "(x : A) : B",
            expect![[r#"
                error: Expected closing bracket
                (x : A) : B
                   ^
            "#]],
        );
    }

    #[test]
    fn unclosed_bracket_is_rejected() {
        check(
            r"(\x^A x : A->A",
            expect![[r#"
                error: Expected closing bracket
                (\x^A x : A->A
                        ^
            "#]],
        );
    }

    #[test]
    fn bracket_underflow_is_rejected() {
        check(
            "x) y : A",
            expect![[r#"
                error: No open bracket to close
                x) y : A
                 ^
            "#]],
        );
    }

    #[test]
    fn lambda_requires_a_bound_variable() {
        check(
            r"\(x) ^A x : B",
            expect![[r#"
                error: Expected variable
                \(x) ^A x : B
                 ^
            "#]],
        );
    }

    #[test]
    fn lambda_requires_the_type_marker() {
        check(
            r"\x y : A",
            expect![[r#"
                error: Expected '^' after the lambda variable
                \x y : A
                   ^
            "#]],
        );
    }

    #[test]
    fn empty_line_needs_an_expression() {
        check(
            "",
            expect![[r#"
                error: Expected non-empty expression

                ^
            "#]],
        );
    }

    #[test]
    fn type_variable_cannot_sit_in_a_term() {
        check(
            "x A : B",
            expect![[r#"
                error: Type variable 'A' cannot appear in a term
                x A : B
                  ^
            "#]],
        );
    }

    #[test]
    fn term_variable_cannot_sit_in_a_type() {
        check(
            "x : a",
            expect![[r#"
                error: Term variable 'a' cannot appear in a type
                x : a
                    ^
            "#]],
        );
    }

    #[test]
    fn lambda_cannot_sit_in_a_type() {
        check(
            r"x : \y^A y",
            expect![[r#"
                error: Lambda cannot appear in a type
                x : \y^A y
                    ^
            "#]],
        );
    }

    #[test]
    fn trailing_tokens_after_the_type_are_rejected() {
        check(
            "x : A B",
            expect![[r#"
                error: Unexpected 'B' after the type expression
                x : A B
                      ^
            "#]],
        );
    }

    #[test]
    fn lexical_errors_surface_with_their_position() {
        check(
            "x 1y : A",
            expect![[r#"
                error: Identifiers cannot start with a digit
                x 1y : A
                  ^
            "#]],
        );
    }

    #[test]
    fn bracket_deltas_settle_to_zero_on_balanced_input() {
        for line in [
            r"\x^A x : A -> A",
            r"(\x^A x) y : A",
            "(x y) z : A",
            r"\x^(A->B) x : C",
            "((x y) z) w : A",
        ] {
            let mut tree = Tree::new();
            Parser::new(line, &mut tree).parse().unwrap();
            let sum: i32 = tree.nodes().iter().map(|node| node.bracket_delta).sum();
            assert_eq!(sum, 0, "bracket deltas should cancel for {line:?}");
        }
    }
}
