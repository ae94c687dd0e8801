use super::token::NodeKind;
use super::tree::Tree;

impl Tree {
    /// Render the subtree rooted at `root` back into minimally-parenthesized
    /// text.
    ///
    /// The subtree is exactly the maximal run of following nodes whose depth
    /// exceeds the root's. The walk tracks depth deltas to emit matched
    /// parentheses: one `)` per level on the way out, one `(` per two levels
    /// on the way in (descending into an application spans two levels).
    /// Arrows are reconstructed from adjacent type variables, lambdas render
    /// as `\x^(T)` with the bound variable folded in, and inside a full
    /// judgement the `:` reappears before the first type-section node. A
    /// root with no subtree renders as its own lexeme.
    pub fn render(&self, root: usize) -> String {
        let nodes = self.nodes();
        if root >= nodes.len() {
            return String::new();
        }
        let mut index = root;
        if nodes[index].kind == NodeKind::Lambda {
            index += 1;
        }
        let subtree_depth = nodes[index].depth;
        let judgement_depth = if nodes[index].kind == NodeKind::JudgementSeparator {
            Some(nodes[index].depth)
        } else {
            None
        };

        if nodes
            .get(index + 1)
            .map_or(true, |node| node.depth <= subtree_depth)
        {
            return nodes[index].text.clone();
        }

        let mut out = String::new();
        let mut previous_depth = subtree_depth;
        let mut last_is_type_var = false;
        let mut last_is_term_var = false;
        let mut in_lambda = false;
        let mut adjust_open_lambda = false;

        let mut i = index + 1;
        while i < nodes.len() && nodes[i].depth > subtree_depth {
            let delta = nodes[i].depth as i64 - previous_depth as i64;
            let mut brackets = String::new();
            if delta < 0 {
                for _ in 0..-delta {
                    brackets.push(')');
                }
            } else {
                let mut j = delta;
                while j > 0 {
                    brackets.push('(');
                    j -= 2;
                }
            }
            if matches!(nodes[i].kind, NodeKind::TypeVar | NodeKind::Arrow)
                && judgement_depth.is_some_and(|depth| nodes[i].depth == depth + 1)
            {
                brackets.push(':');
            }

            match nodes[i].kind {
                NodeKind::Lambda => {
                    if in_lambda && !brackets.is_empty() {
                        brackets.remove(0);
                    }
                    in_lambda = true;
                    adjust_open_lambda = true;
                    out.push_str(&brackets);
                    out.push('\\');
                    if let Some(bound) = nodes.get(i + 1) {
                        out.push_str(&bound.text);
                    }
                    out.push('^');
                    last_is_type_var = false;
                    last_is_term_var = false;
                    // The bound variable renders as part of the lambda.
                    i += 1;
                }
                NodeKind::TermVar => {
                    if last_is_term_var && !nodes[i - 1].is_second_argument {
                        // This variable is applied to the previous one.
                        out.push(' ');
                        last_is_term_var = false;
                    } else {
                        last_is_term_var = true;
                    }
                    previous_depth = nodes[i].depth;
                    last_is_type_var = false;
                    if in_lambda {
                        if !brackets.is_empty() {
                            brackets.remove(0);
                        }
                        if !matches!(nodes[i - 2].kind, NodeKind::TypeVar | NodeKind::Arrow) {
                            // A single-variable annotation gets its brackets
                            // back before the body starts.
                            let annotation = nodes[i - 1].text.clone();
                            out.truncate(out.len() - annotation.len());
                            out.push('(');
                            out.push_str(&annotation);
                            out.push(')');
                        }
                    }
                    in_lambda = false;
                    out.push_str(&brackets);
                    out.push_str(&nodes[i].text);
                }
                NodeKind::TypeVar => {
                    if last_is_type_var {
                        if delta < 0 {
                            out.push_str(&brackets);
                            out.push_str("->");
                        } else {
                            out.push_str("->");
                            out.push_str(&brackets);
                        }
                        out.push_str(&nodes[i].text);
                        last_is_term_var = false;
                    } else {
                        if in_lambda && adjust_open_lambda {
                            if !brackets.is_empty() {
                                brackets.remove(0);
                            }
                            adjust_open_lambda = false;
                        }
                        out.push_str(&brackets);
                        out.push_str(&nodes[i].text);
                    }
                    last_is_type_var = true;
                    previous_depth = nodes[i].depth;
                }
                NodeKind::Arrow => {
                    if delta > 0 && last_is_type_var {
                        // The operand moves under the arrow: reopen its
                        // bracket group in front of it.
                        let operand = if nodes[i - 1].kind == NodeKind::TypeVar {
                            nodes[i - 1].text.clone()
                        } else {
                            nodes[i - 2].text.clone()
                        };
                        out.truncate(out.len() - operand.len());
                        out.push_str(&brackets);
                        out.push_str(&operand);
                    } else {
                        out.push_str(&brackets);
                    }
                    previous_depth = nodes[i].depth;
                }
                NodeKind::Application => {
                    if in_lambda {
                        if !brackets.is_empty() {
                            brackets.remove(0);
                        }
                        if !matches!(nodes[i - 2].kind, NodeKind::TypeVar | NodeKind::Arrow) {
                            let annotation = nodes[i - 1].text.clone();
                            out.truncate(out.len() - annotation.len());
                            out.push('(');
                            out.push_str(&annotation);
                            out.push(')');
                        }
                    }
                    in_lambda = false;
                    out.push_str(&brackets);
                    previous_depth = nodes[i].depth;
                }
                NodeKind::JudgementSeparator => {
                    out.push_str(&brackets);
                    previous_depth = nodes[i].depth;
                }
            }
            i += 1;
        }

        let mut remaining = subtree_depth as i64 - previous_depth as i64;
        while remaining < 0 {
            out.push(')');
            remaining += 1;
        }
        out
    }

    /// The whole judgement, term and declared type around the `:`.
    pub fn render_judgement(&self) -> String {
        self.render(0)
    }

    /// The term side of a finished judgement (the separator re-root puts its
    /// root at index 1).
    pub fn render_term(&self) -> String {
        self.render(1)
    }

    /// The declared type side of a finished judgement.
    pub fn render_declared_type(&self) -> Option<String> {
        self.separator_index().map(|index| self.render(index))
    }
}
