use std::fmt::{self, Display};

use super::context::Context;
use super::error::TypeError;
use super::tree::Tree;

/// Inference recursion is bounded so a hostile line cannot blow the stack.
const MAX_INFER_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "Type checks out"),
            Verdict::Fail => write!(f, "Does not type check"),
        }
    }
}

/// Compare the declared type of a finished judgement against the type
/// inferred for its term. Both sides are rendered text and the comparison
/// is exact, character for character.
pub fn check_judgement(tree: &Tree, context: &mut Context) -> Result<Verdict, TypeError> {
    let Some(declared) = tree.render_declared_type() else {
        return Ok(Verdict::Fail);
    };
    let inferred = infer_type(context, &tree.render_term())?;
    Ok(if inferred == declared {
        Verdict::Pass
    } else {
        Verdict::Fail
    })
}

/// Infer the type of a rendered term by dispatching on its textual shape:
/// `(\x^(D)B)` is a lambda, any other parenthesized text is an application,
/// and everything else is a bare variable.
pub fn infer_type(context: &mut Context, text: &str) -> Result<String, TypeError> {
    infer(context, text, 0)
}

fn infer(context: &mut Context, text: &str, depth: usize) -> Result<String, TypeError> {
    if depth > MAX_INFER_DEPTH {
        return Err(TypeError::NestingTooDeep);
    }
    if text.starts_with("(\\") || text.starts_with("(λ") {
        if let Some((name, annotation, body)) = split_lambda(text) {
            // The binding is not removed after the body is checked; later
            // terms in the run keep seeing it.
            context.bind(name, annotation);
            let result = infer(context, body, depth + 1)?;
            return Ok(format!("({}->{})", annotation, result));
        }
    } else if text.starts_with('(') {
        if let Some((function, argument)) = split_application(text) {
            let function_type = infer(context, function, depth + 1)?;
            let argument_type = infer(context, argument, depth + 1)?;
            let unwrapped = strip_outer_parens(&function_type);
            return match unwrapped.strip_prefix(&format!("{}->", argument_type)) {
                Some(result) => Ok(result.to_string()),
                None if unwrapped.contains("->") => Err(TypeError::DomainMismatch {
                    function: function.to_string(),
                    argument: argument.to_string(),
                }),
                None => Err(TypeError::NotAFunction {
                    function: function.to_string(),
                }),
            };
        }
    }
    match context.lookup(text) {
        Some(type_text) => Ok(type_text.to_string()),
        None => Err(TypeError::VariableNotInContext {
            name: text.to_string(),
        }),
    }
}

/// Remove one outer layer of parentheses when the leading `(` is matched by
/// the final character.
fn strip_outer_parens(text: &str) -> &str {
    if !(text.starts_with('(') && text.ends_with(')')) {
        return text;
    }
    let mut depth = 0i32;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 && i != text.len() - 1 {
                    return text;
                }
            }
            _ => {}
        }
    }
    &text[1..text.len() - 1]
}

/// Split `\x^(D)B`, with or without its outer wrapping parentheses, into
/// the bound name, the annotation text and the body text.
fn split_lambda(text: &str) -> Option<(&str, &str, &str)> {
    let inner = strip_outer_parens(text);
    let rest = inner
        .strip_prefix('\\')
        .or_else(|| inner.strip_prefix('λ'))?;
    let name_end = rest
        .char_indices()
        .find(|(_, ch)| !ch.is_alphanumeric())
        .map(|(i, _)| i)?;
    let name = &rest[..name_end];
    if name.is_empty() {
        return None;
    }
    let rest = rest[name_end..].strip_prefix('^')?;
    if !rest.starts_with('(') {
        return None;
    }
    let mut depth = 0i32;
    for (i, ch) in rest.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let annotation = &rest[1..i];
                    let body = rest[i + 1..].trim_start();
                    if annotation.is_empty() || body.is_empty() {
                        return None;
                    }
                    return Some((name, annotation, body));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split the inside of a rendered application into function and argument:
/// the argument is the trailing atomic-or-parenthesized segment, the
/// function is everything before it.
fn split_application(text: &str) -> Option<(&str, &str)> {
    let inner = strip_outer_parens(text);
    let (function, argument) = if inner.ends_with(')') {
        let mut depth = 0i32;
        let mut start = None;
        for (i, ch) in inner.char_indices().rev() {
            match ch {
                ')' => depth += 1,
                '(' => {
                    depth -= 1;
                    if depth == 0 {
                        start = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let start = start?;
        (inner[..start].trim_end(), &inner[start..])
    } else {
        let start = inner
            .char_indices()
            .rev()
            .take_while(|(_, ch)| ch.is_alphanumeric())
            .last()
            .map(|(i, _)| i)?;
        (inner[..start].trim_end(), &inner[start..])
    };
    if function.is_empty() || argument.is_empty() {
        return None;
    }
    Some((function, argument))
}
