use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context as _;

use crate::error_collector::ErrorCollector;
use crate::judgement::typecheck::{check_judgement, Verdict};
use crate::judgement::{Context, JudgementError, Parser, Tree};
use crate::source::SourceAnnotator;
use crate::{log_error, log_info};

/// The per-run state: one tree, rebuilt for every line, and one variable
/// context that deliberately survives the whole run.
pub struct Checker {
    tree: Tree,
    context: Context,
}

/// What a successfully checked line prints: the verdict first, then the
/// canonical rendering of the whole judgement.
pub struct LineReport {
    pub verdict: Verdict,
    pub rendering: String,
}

impl Checker {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(),
            context: Context::new(),
        }
    }

    /// Parse and type-check one judgement line. The tree is cleared and
    /// rebuilt; the context keeps every binding made so far, including the
    /// ones this line adds.
    pub fn check_line(&mut self, line: &str) -> Result<LineReport, JudgementError> {
        Parser::new(line, &mut self.tree).parse()?;
        let verdict = check_judgement(&self.tree, &mut self.context)?;
        Ok(LineReport {
            verdict,
            rendering: self.tree.render_judgement(),
        })
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

/// Check every judgement line of `source`. Verdicts and renderings go to
/// `out`; annotated diagnostics go to `diagnostics`. A failing line is
/// reported and the run continues with the next line. Returns the number of
/// failed lines.
pub fn run_source(
    source: &str,
    filename: Option<&str>,
    out: &mut impl Write,
    diagnostics: &mut impl Write,
) -> io::Result<usize> {
    let mut checker = Checker::new();
    let annotator = SourceAnnotator::new().with_label("error").with_location();
    let mut failures = ErrorCollector::new();

    for (line_number, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match checker.check_line(line) {
            Ok(report) => {
                writeln!(out, "{}", report.verdict)?;
                writeln!(out, "{}", report.rendering)?;
            }
            Err(error) => {
                diagnostics.write_all(
                    annotator
                        .annotate(filename, line_number, line, error.span(), &error.to_string())
                        .as_bytes(),
                )?;
                failures.push(error);
            }
        }
    }
    Ok(failures.len())
}

/// Check the judgements in the file at `path`.
pub fn run(path: &Path) -> anyhow::Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    let filename = path.display().to_string();
    log_info!("check", file = filename, lines = source.lines().count());

    let stdout = io::stdout();
    let stderr = io::stderr();
    let failures = run_source(
        &source,
        Some(&filename),
        &mut stdout.lock(),
        &mut stderr.lock(),
    )?;

    if failures > 0 {
        log_error!("check", file = filename, failed_lines = failures);
        anyhow::bail!("{} judgement(s) failed", failures);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::{expect, Expect};
    use indoc::indoc;

    fn check_run(source: &str, expected_out: Expect, expected_diagnostics: Expect) {
        let mut out = Vec::new();
        let mut diagnostics = Vec::new();
        run_source(source, None, &mut out, &mut diagnostics).unwrap();
        expected_out.assert_eq(&String::from_utf8(out).unwrap());
        expected_diagnostics.assert_eq(&String::from_utf8(diagnostics).unwrap());
    }

    #[test]
    fn identity_judgement_checks_out() {
        check_run(
            r"\x^A x : A -> A",
            expect![[r#"
                Type checks out
                ((\x^(A)x):(A->A))
            "#]],
            expect![""],
        );
    }

    #[test]
    fn constant_function_checks_out() {
        check_run(
            r"\x^A \y^B x : A -> B -> A",
            expect![[r#"
                Type checks out
                ((\x^(A)(\y^(B)x)):(A->(B->A)))
            "#]],
            expect![""],
        );
    }

    #[test]
    fn unbound_variable_on_the_first_line_is_fatal_for_that_line() {
        check_run(
            "x : A",
            expect![""],
            expect![[r#"
                error: Variable not in context: x
                  --> (line 1, col 1)
                1 | x : A
                  | ^^^^^
            "#]],
        );
    }

    #[test]
    fn bindings_leak_across_lines_within_one_run() {
        // Line 1 pushes y:A while checking its body and never pops it, so
        // line 2 finds y in the context.
        check_run(
            indoc! {r"
                \y^A y : A -> A
                (\x^A x) y : A
            "},
            expect![[r#"
                Type checks out
                ((\y^(A)y):(A->A))
                Type checks out
                (((\x^(A)x)y):A)
            "#]],
            expect![""],
        );
    }

    #[test]
    fn a_failing_line_does_not_stop_the_run() {
        check_run(
            indoc! {r"
                x : A
                \x^A x : A -> A
            "},
            expect![[r#"
                Type checks out
                ((\x^(A)x):(A->A))
            "#]],
            expect![[r#"
                error: Variable not in context: x
                  --> (line 1, col 1)
                1 | x : A
                  | ^^^^^
            "#]],
        );
    }

    #[test]
    fn unclosed_bracket_is_a_syntax_error() {
        check_run(
            r"(\x^A x : A->A",
            expect![""],
            expect![[r#"
                error: Expected closing bracket
                  --> (line 1, col 9)
                1 | (\x^A x : A->A
                  |         ^
            "#]],
        );
    }

    #[test]
    fn doubled_separator_is_a_syntax_error() {
        check_run(
            "x : A : B",
            expect![""],
            expect![[r#"
                error: Doubled judgement separator ':'
                  --> (line 1, col 7)
                1 | x : A : B
                  |       ^
            "#]],
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        check_run(
            indoc! {r"

                \x^A x : A -> A

            "},
            expect![[r#"
                Type checks out
                ((\x^(A)x):(A->A))
            "#]],
            expect![""],
        );
    }

    #[test]
    fn wrong_declared_type_fails_the_verdict() {
        check_run(
            r"\x^A x : A",
            expect![[r#"
                Does not type check
                ((\x^(A)x):A)
            "#]],
            expect![""],
        );
    }
}
