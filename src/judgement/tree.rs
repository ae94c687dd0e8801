use super::token::NodeKind;

/// One node in the flat, depth-annotated tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// The lexeme; only meaningful for variable nodes.
    pub text: String,
    pub depth: usize,
    /// Whether this node is a direct child of an application.
    pub is_argument: bool,
    /// Whether this node is the applied-to side (the function's argument
    /// rather than the function itself).
    pub is_second_argument: bool,
    /// Net unmatched parentheses attributed to this node, >0 when more
    /// brackets open around it than close.
    pub bracket_delta: i32,
}

impl Node {
    fn new(kind: NodeKind, text: &str, depth: usize, bracket_delta: i32) -> Self {
        Self {
            kind,
            text: text.to_string(),
            depth,
            is_argument: false,
            is_second_argument: false,
            bracket_delta,
        }
    }

    fn argument(kind: NodeKind, text: &str, depth: usize, bracket_delta: i32) -> Self {
        Self {
            is_argument: true,
            is_second_argument: true,
            ..Self::new(kind, text, depth, bracket_delta)
        }
    }

    fn application(depth: usize, bracket_delta: i32) -> Self {
        Self::new(NodeKind::Application, "apply", depth, bracket_delta)
    }
}

/// The pre-order flattening of the judgement tree.
///
/// There are no pointer links: a node's children are the maximal run of
/// immediately-following nodes one level deeper, terminated by a node at the
/// same or a lower depth. All structural changes are combinations of two
/// primitives, insert-at-index and bulk depth increment, plus bracket-delta
/// transfer.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    /// Index of the first type-section node, set when the judgement
    /// separator is recorded.
    separator_index: Option<usize>,
    /// Depth at which the next plainly-appended node lands.
    current_depth: usize,
}

/// Cancel unmatched closing brackets on `right` against unmatched opening
/// brackets on `left`; the smaller magnitude is consumed and the signed
/// remainder survives on whichever side has it. Returns what remains on the
/// left. The total open-minus-close count is conserved.
fn cancel_brackets(left: &mut i32, right: &mut i32) -> i32 {
    if *left > 0 && *right < 0 {
        if *left > -*right {
            *left += *right;
            *right = 0;
        } else if *left == -*right {
            *left = 0;
            *right = 0;
        } else {
            *right += *left;
            *left = 0;
        }
    }
    *left
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn separator_index(&self) -> Option<usize> {
        self.separator_index
    }

    /// Reset the tree for the next input line.
    pub fn clear(&mut self) {
        self.current_depth = 0;
        self.nodes.clear();
        self.separator_index = None;
    }

    /// Indices of all lambda nodes, for diagnostics.
    pub fn find_lambda_indices(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.kind == NodeKind::Lambda)
            .map(|(i, _)| i)
            .collect()
    }

    /// The single mutating entry point: decide what existing structure the
    /// new token attaches to, splicing the result into the sequence while
    /// preserving the depth and bracket invariants. The decision is driven
    /// by the kind of the node most recently added.
    pub fn add_token(&mut self, kind: NodeKind, text: &str, bracket_delta: i32) {
        match kind {
            NodeKind::Arrow | NodeKind::JudgementSeparator => {
                self.nodes
                    .push(Node::new(kind, text, self.current_depth, bracket_delta));
                if kind == NodeKind::JudgementSeparator {
                    // One past the separator; after the re-root below this is
                    // exactly where the type section starts.
                    self.separator_index = Some(self.nodes.len());
                }
                return;
            }
            _ => {}
        }

        let Some(previous) = self.nodes.last().map(|node| node.kind) else {
            self.nodes
                .push(Node::new(kind, text, self.current_depth, bracket_delta));
            return;
        };

        match previous {
            NodeKind::JudgementSeparator => self.reroot_under_separator(kind, text, bracket_delta),
            NodeKind::Lambda => {
                // The bound variable sits beside its lambda introducer.
                self.nodes
                    .push(Node::new(kind, text, self.current_depth, bracket_delta));
            }
            NodeKind::Arrow => self.resolve_arrow(kind, text, bracket_delta),
            NodeKind::TypeVar => self.attach_under_closest_lambda(kind, text, bracket_delta),
            NodeKind::TermVar => {
                if self.attach_to_annotation_slot(kind, text, bracket_delta) {
                    return;
                }
                if let Some(bracket) = self.rfind_open_bracket() {
                    self.attach_to_bracket_node(bracket, kind, text, bracket_delta);
                } else if self.nodes.last().is_some_and(|node| node.is_argument) {
                    self.attach_to_open_application(kind, text, bracket_delta);
                } else {
                    self.attach_to_previous(kind, text, bracket_delta);
                }
            }
            // Applications are always spliced mid-sequence, so the final
            // node is never one.
            NodeKind::Application => unreachable!("application can never be the last node"),
        }
    }

    fn rfind_open_bracket(&self) -> Option<usize> {
        (0..self.nodes.len())
            .rev()
            .find(|&i| self.nodes[i].bracket_delta > 0)
    }

    /// The separator was the last node: the whole term built so far becomes
    /// the function side of an implicit top-level application, the separator
    /// moves to the front as the new root, and the incoming node opens the
    /// type section at depth 1.
    fn reroot_under_separator(&mut self, kind: NodeKind, text: &str, bracket_delta: i32) {
        let Some(mut separator) = self.nodes.pop() else {
            return;
        };
        self.nodes[0].is_argument = true;
        self.nodes[0].is_second_argument = false;
        self.raise_depth_from(0);
        separator.depth = 0;
        self.nodes.insert(0, separator);
        self.current_depth = 1;
        self.nodes
            .push(Node::new(kind, text, self.current_depth, bracket_delta));
    }

    /// The previous node finished a lambda's type annotation: wrap the
    /// nearest pending lambda in a fresh application and hang the new node
    /// under it. Any closing brackets the new node carries first cancel
    /// against earlier open groups; the application carries forward whatever
    /// delta was still open on the node just after the lambda.
    fn attach_under_closest_lambda(&mut self, kind: NodeKind, text: &str, bracket_delta: i32) {
        let mut incoming = bracket_delta;
        let mut i = self.nodes.len();
        while incoming < 0 && i > 0 {
            i -= 1;
            if self.nodes[i].bracket_delta > 0 {
                cancel_brackets(&mut self.nodes[i].bracket_delta, &mut incoming);
            }
        }
        let Some(lambda) = (0..self.nodes.len().saturating_sub(1))
            .rev()
            .find(|&i| self.nodes[i].kind == NodeKind::Lambda)
        else {
            return;
        };
        let mut application = Node::application(
            self.nodes[lambda].depth,
            std::mem::take(&mut self.nodes[lambda + 1].bracket_delta),
        );
        application.is_argument = self.nodes[lambda].is_argument;
        application.is_second_argument = self.nodes[lambda].is_second_argument;
        self.current_depth = self.nodes[lambda].depth + 1;
        self.raise_depth_from(lambda);
        self.nodes[lambda].is_argument = true;
        self.nodes[lambda].is_second_argument = false;
        self.nodes.insert(lambda, application);
        self.nodes
            .push(Node::argument(kind, text, self.current_depth, incoming));
    }

    /// When the two preceding nodes are a lambda and its bound variable, the
    /// new node is the single occupant of the next slot (the annotation
    /// head); the grammar guarantees exactly one node lands there, so no
    /// synthetic application is needed.
    fn attach_to_annotation_slot(&mut self, kind: NodeKind, text: &str, bracket_delta: i32) -> bool {
        let n = self.nodes.len();
        if n > 1 && self.nodes[n - 2].kind == NodeKind::Lambda {
            self.current_depth += 1;
            self.nodes
                .push(Node::new(kind, text, self.current_depth, bracket_delta));
            return true;
        }
        false
    }

    /// Attach the new node to the node holding an open bracket group,
    /// cancelling as many of the new node's closing brackets as possible and
    /// passing any remaining opens on to the application. When the bracket
    /// node is a lambda's bound variable the application is injected before
    /// the lambda, since the lambda and its variable form one unit.
    fn attach_to_bracket_node(
        &mut self,
        bracket: usize,
        kind: NodeKind,
        text: &str,
        bracket_delta: i32,
    ) {
        let old_depth = self.nodes[bracket].depth;
        self.raise_depth_from(bracket);
        self.current_depth = old_depth + 1;
        let mut incoming = bracket_delta;
        let remaining = cancel_brackets(&mut self.nodes[bracket].bracket_delta, &mut incoming);
        let application = Node::application(old_depth, remaining);
        self.nodes[bracket].bracket_delta = 0;
        if bracket != 0 && self.nodes[bracket - 1].kind == NodeKind::Lambda {
            self.nodes[bracket - 1].depth += 1;
            self.nodes.insert(bracket - 1, application);
        } else {
            self.nodes[bracket].is_argument = true;
            self.nodes[bracket].is_second_argument = false;
            self.nodes.insert(bracket, application);
        }
        self.nodes
            .push(Node::argument(kind, text, self.current_depth, incoming));
    }

    /// Nest a fresh application around the nearest application that is not
    /// itself an application child, and apply the new node to it. This path
    /// only runs when no bracket group is open, so no deltas move.
    fn attach_to_open_application(&mut self, kind: NodeKind, text: &str, bracket_delta: i32) {
        let Some(found) = (0..self.nodes.len())
            .rev()
            .find(|&i| self.nodes[i].kind == NodeKind::Application && !self.nodes[i].is_argument)
        else {
            return;
        };
        let old_depth = self.nodes[found].depth;
        self.raise_depth_from(found);
        self.nodes[found].is_argument = true;
        self.nodes[found].is_second_argument = false;
        self.nodes.insert(found, Node::application(old_depth, 0));
        self.current_depth = old_depth + 1;
        self.nodes
            .push(Node::argument(kind, text, self.current_depth, bracket_delta));
    }

    /// The previous node is not part of any application yet: wrap it and the
    /// new node in a fresh application.
    fn attach_to_previous(&mut self, kind: NodeKind, text: &str, bracket_delta: i32) {
        let last = self.nodes.len() - 1;
        self.nodes
            .insert(last, Node::application(self.current_depth, 0));
        let moved = last + 1;
        self.nodes[moved].is_argument = true;
        self.nodes[moved].is_second_argument = false;
        self.nodes[moved].depth += 1;
        self.current_depth += 1;
        self.nodes
            .push(Node::argument(kind, text, self.current_depth, bracket_delta));
    }

    /// The previous node is an arrow, so the node two positions back is the
    /// true operand. Resolve where the arrow belongs before appending the
    /// new node as its right-hand side.
    fn resolve_arrow(&mut self, kind: NodeKind, text: &str, bracket_delta: i32) {
        if self.nodes.len() < 2 {
            return;
        }
        let operand = self.nodes.len() - 2;
        if self.nodes[operand].bracket_delta < 0 {
            // The operand closes a group: cancel its closing brackets
            // against earlier opens (returning any surplus) until they are
            // fully explained; the node supplying the final cancellation is
            // the bracketed operand's head.
            let mut bracket = None;
            let mut i = operand;
            while i > 0 {
                i -= 1;
                if self.nodes[i].bracket_delta > 0 {
                    let transfer = self.nodes[i].bracket_delta;
                    self.nodes[operand].bracket_delta += transfer;
                    self.nodes[i].bracket_delta = 0;
                    if self.nodes[operand].bracket_delta > 0 {
                        let surplus = self.nodes[operand].bracket_delta;
                        self.nodes[i].bracket_delta += surplus;
                        self.nodes[operand].bracket_delta = 0;
                    }
                    if self.nodes[operand].bracket_delta == 0 {
                        bracket = Some(i);
                        break;
                    }
                }
            }
            if let Some(bracket) = bracket {
                self.move_arrow_to_bracket(bracket, kind, text, bracket_delta);
            }
        } else {
            // Right associative: nest under the earliest applied node in the
            // type section. The separator index bounds the scan so term-side
            // application structure never leaks into type resolution.
            let bound = self.separator_index.unwrap_or(0);
            let applied = (bound..=operand).find(|&i| {
                self.nodes[i].is_second_argument
                    && matches!(self.nodes[i].kind, NodeKind::TypeVar | NodeKind::Arrow)
            });
            match applied {
                Some(applied) => self.nest_arrow_under_applied(applied, kind, text, bracket_delta),
                None => self.chain_arrow_to_operand(kind, text, bracket_delta),
            }
        }
    }

    /// Move the pending arrow one level under the applied node, making the
    /// applied node the function half of the new arrow.
    fn nest_arrow_under_applied(
        &mut self,
        applied: usize,
        kind: NodeKind,
        text: &str,
        bracket_delta: i32,
    ) {
        let Some(mut arrow) = self.nodes.pop() else {
            return;
        };
        arrow.depth = self.nodes[applied].depth;
        arrow.is_argument = true;
        arrow.is_second_argument = true;
        self.nodes[applied].depth += 1;
        self.current_depth += 1;
        self.nodes[applied].is_second_argument = false;
        self.nodes.insert(applied, arrow);
        self.nodes
            .push(Node::argument(kind, text, self.current_depth, bracket_delta));
    }

    /// Attach the pending arrow directly to the preceding type variable as a
    /// flat pairwise arrow, inheriting that operand's open brackets.
    fn chain_arrow_to_operand(&mut self, kind: NodeKind, text: &str, bracket_delta: i32) {
        let Some(mut arrow) = self.nodes.pop() else {
            return;
        };
        let last = self.nodes.len() - 1;
        arrow.bracket_delta = std::mem::take(&mut self.nodes[last].bracket_delta);
        self.nodes[last].depth += 1;
        self.current_depth += 1;
        self.nodes[last].is_argument = true;
        self.nodes[last].is_second_argument = false;
        self.nodes.insert(last, arrow);
        self.nodes
            .push(Node::argument(kind, text, self.current_depth, bracket_delta));
    }

    /// The operand was a bracketed group: the pending arrow moves to the
    /// group's head, takes over its remaining open brackets, and everything
    /// the group dominated deepens by one.
    fn move_arrow_to_bracket(
        &mut self,
        bracket: usize,
        kind: NodeKind,
        text: &str,
        bracket_delta: i32,
    ) {
        let already_applied =
            self.nodes[bracket].is_argument && !self.nodes[bracket].is_second_argument;
        let Some(mut arrow) = self.nodes.pop() else {
            return;
        };
        arrow.depth = self.nodes[bracket].depth;
        self.nodes[bracket].is_argument = true;
        self.nodes[bracket].is_second_argument = false;
        self.raise_depth_from(bracket);
        arrow.bracket_delta = std::mem::take(&mut self.nodes[bracket].bracket_delta);
        self.current_depth = if already_applied {
            arrow.depth
        } else {
            arrow.depth + 1
        };
        self.nodes.insert(bracket, arrow);
        self.nodes
            .push(Node::argument(kind, text, self.current_depth, bracket_delta));
    }

    /// Bulk depth increment: every node from `index` to the end moves one
    /// level deeper.
    fn raise_depth_from(&mut self, index: usize) {
        for node in &mut self.nodes[index..] {
            node.depth += 1;
        }
    }
}
