//! Code-answer features
//!
//! Static features of a submitted Python answer, computed with tree-sitter.
//! A snippet that does not parse is an ordinary input: the parse-dependent
//! features come back false instead of an error.

use crate::models::CodeSubmission;
use tree_sitter::{Node, Parser, Tree, TreeCursor};

/// Keywords whose presence is recorded, in vector order. Matching is a
/// case-insensitive substring test, so "elif" also counts as "if".
pub const KEYWORDS: [&str; 5] = ["return", "def", "class", "if", "for"];

/// Number of numeric code features
pub const NUM_CODE_FEATURES: usize = 8;

/// Static features of one code answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeFeatures {
    pub parse_success: bool,
    pub lines_of_code: usize,
    pub has_return: bool,
    pub has_def: bool,
    pub has_class: bool,
    pub has_if: bool,
    pub has_for: bool,
    /// At least one `return` carries a value
    pub has_non_empty_return: bool,
}

impl CodeFeatures {
    pub fn extract(code: &str) -> Self {
        let scan = parse_python(code)
            .filter(|t| !t.root_node().has_error())
            .map(|t| TreeScan::of(t.root_node()));
        let parse_success = scan.as_ref().is_some_and(TreeScan::is_python3);
        let has_non_empty_return = parse_success && scan.is_some_and(|s| s.valued_return);

        let lowered = code.to_lowercase();
        let [has_return, has_def, has_class, has_if, has_for] =
            KEYWORDS.map(|keyword| lowered.contains(keyword));

        Self {
            parse_success,
            lines_of_code: count_lines(code),
            has_return,
            has_def,
            has_class,
            has_if,
            has_for,
            has_non_empty_return,
        }
    }

    /// Numeric vector: parse_success, lines_of_code, the five keyword
    /// flags in [`KEYWORDS`] order, has_non_empty_return
    pub fn to_vector(&self) -> [f32; NUM_CODE_FEATURES] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            flag(self.parse_success),
            self.lines_of_code as f32,
            flag(self.has_return),
            flag(self.has_def),
            flag(self.has_class),
            flag(self.has_if),
            flag(self.has_for),
            flag(self.has_non_empty_return),
        ]
    }
}

fn parse_python(code: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
        tracing::warn!("Failed to set Python language: {}", e);
        return None;
    }
    parser.parse(code, None)
}

/// Blank input has no lines; otherwise newlines + 1
pub fn count_lines(code: &str) -> usize {
    if code.trim().is_empty() {
        0
    } else {
        code.matches('\n').count() + 1
    }
}

/// Facts collected in one pass over an error-free syntax tree.
///
/// The walk uses an explicit stack, so nesting depth is bounded by the
/// heap rather than the thread stack.
#[derive(Debug, Default)]
struct TreeScan {
    valued_return: bool,
    /// Python 2 `print` / `exec` statements
    legacy_statement: bool,
    misindented: bool,
}

impl TreeScan {
    fn of(root: Node) -> Self {
        let mut scan = Self::default();
        let mut cursor = root.walk();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            match node.kind() {
                "return_statement" => {
                    if node
                        .named_children(&mut cursor)
                        .any(|child| child.kind() != "comment")
                    {
                        scan.valued_return = true;
                    }
                }
                "print_statement" | "exec_statement" => scan.legacy_statement = true,
                "module" | "block" => {
                    if !indentation_consistent(node, &mut cursor) {
                        scan.misindented = true;
                    }
                }
                _ => {}
            }
            stack.extend(node.named_children(&mut cursor));
        }
        scan
    }

    /// The tree-sitter grammar also accepts Python 2 statements and some
    /// indentation that CPython rejects
    fn is_python3(&self) -> bool {
        !self.legacy_statement && !self.misindented
    }
}

/// Statements that open a line in a module or block must share one column,
/// which is 0 for a module and right of the owning header for a block.
/// An inline suite (`def f(): return 1`) is not checked.
fn indentation_consistent<'tree>(node: Node<'tree>, cursor: &mut TreeCursor<'tree>) -> bool {
    let statements: Vec<Node<'tree>> = node
        .named_children(cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    let Some(first) = statements.first() else {
        return true;
    };

    let column = first.start_position().column;
    if node.kind() == "module" {
        if column != 0 {
            return false;
        }
    } else {
        let inline = node
            .prev_sibling()
            .is_some_and(|colon| colon.end_position().row == first.start_position().row);
        if inline {
            return true;
        }
        let header_column = node.parent().map_or(0, |p| p.start_position().column);
        if column <= header_column {
            return false;
        }
    }

    statements.windows(2).all(|pair| {
        let same_line = pair[1].start_position().row == pair[0].end_position().row;
        same_line || pair[1].start_position().column == column
    })
}

/// Instruction, input and answer joined with single spaces
pub fn merged_text(submission: &CodeSubmission) -> String {
    format!(
        "{} {} {}",
        submission.instruction, submission.input_text, submission.user_answer
    )
}
