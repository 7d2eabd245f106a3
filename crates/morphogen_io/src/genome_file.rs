//! Line-oriented genome file format.
//!
//! A file is a sequence of trees, one per forest slot. Each node is written
//! as:
//!
//! ```text
//! OPEN
//! <instruction code>
//! ARGS
//! <arg 0>
//! ...
//! ARGS
//! <extra string>
//! <children, recursively>
//! CLOSE
//! ```
//!
//! Loading is strict: any unexpected token, an unknown instruction code, or a
//! node whose child or argument count disagrees with its instruction aborts
//! the whole load.

use crate::error::{IoError, Result};
use morphogen_core::program::{Forest, NodeId, ProgramTree};
use morphogen_data::Instruction;
use std::path::Path;

const OPEN: &str = "OPEN";
const CLOSE: &str = "CLOSE";
const ARGS: &str = "ARGS";

/// Renders a forest in the genome file format.
///
/// Fails if an extra string contains a line break, since it would not read
/// back as a single line.
pub fn render_forest<I: Instruction>(forest: &Forest<I>) -> Result<String> {
    let mut out = String::new();
    for tree in forest.trees() {
        render_tree(tree, &mut out)?;
    }
    Ok(out)
}

fn render_tree<I: Instruction>(tree: &ProgramTree<I>, out: &mut String) -> Result<()> {
    enum Step {
        Enter(NodeId),
        Exit,
    }

    let mut stack = vec![Step::Enter(tree.root())];
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Exit => {
                push_line(out, CLOSE);
                continue;
            }
            Step::Enter(id) => id,
        };
        let node = tree.node(id);
        if node.extra.contains(['\n', '\r']) {
            return Err(IoError::serialization(format!(
                "Extra string of node {:?} in tree {} contains a line break",
                id,
                tree.tree_index()
            )));
        }
        push_line(out, OPEN);
        push_line(out, &node.instruction.code().to_string());
        push_line(out, ARGS);
        for arg in &node.args {
            push_line(out, &arg.to_string());
        }
        push_line(out, ARGS);
        push_line(out, &node.extra);

        stack.push(Step::Exit);
        for &child in node.children.iter().rev() {
            stack.push(Step::Enter(child));
        }
    }
    Ok(())
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    line: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
            line: 0,
        }
    }

    fn next(&mut self) -> Result<&'a str> {
        match self.inner.next() {
            Some((i, line)) => {
                self.line = i + 1;
                Ok(line)
            }
            None => Err(IoError::format(self.line + 1, "unexpected end of file")),
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        let line = self.next()?;
        if line == token {
            Ok(())
        } else {
            Err(self.error(format!("expected {}, found {:?}", token, line)))
        }
    }

    fn next_top_level(&mut self) -> Option<(usize, &'a str)> {
        self.inner.find(|(_, l)| !l.trim().is_empty()).map(|(i, l)| {
            self.line = i + 1;
            (i + 1, l)
        })
    }

    fn error<S: Into<String>>(&self, message: S) -> IoError {
        IoError::format(self.line, message)
    }
}

struct NodeHeader<I> {
    instruction: I,
    args: Vec<i32>,
    extra: String,
}

/// Reads everything after an `OPEN` up to (not including) the first child.
fn read_header<I: Instruction>(lines: &mut Lines<'_>) -> Result<NodeHeader<I>> {
    let code_line = lines.next()?;
    let code: i32 = code_line
        .trim()
        .parse()
        .map_err(|_| lines.error(format!("invalid instruction code {:?}", code_line)))?;
    let instruction =
        I::from_code(code).ok_or_else(|| lines.error(format!("unknown instruction code {}", code)))?;

    lines.expect(ARGS)?;
    let mut args = Vec::new();
    loop {
        let line = lines.next()?;
        if line == ARGS {
            break;
        }
        let value: i32 = line
            .trim()
            .parse()
            .map_err(|_| lines.error(format!("invalid argument {:?}", line)))?;
        args.push(value);
    }
    if args.len() != instruction.arg_count() {
        return Err(lines.error(format!(
            "{:?} takes {} arguments, found {}",
            instruction,
            instruction.arg_count(),
            args.len()
        )));
    }
    let extra = lines.next()?.to_string();
    Ok(NodeHeader {
        instruction,
        args,
        extra,
    })
}

fn read_tree<I: Instruction>(lines: &mut Lines<'_>, tree_index: usize) -> Result<ProgramTree<I>> {
    let root = read_header::<I>(lines)?;
    let mut tree = ProgramTree::from_root(root.instruction, root.args, root.extra, tree_index);
    let mut open = vec![tree.root()];

    while let Some(&current) = open.last() {
        match lines.next()? {
            OPEN => {
                let header = read_header::<I>(lines)?;
                let child = tree.add_node(header.instruction, header.args, header.extra);
                tree.attach_child(current, child);
                open.push(child);
            }
            CLOSE => {
                let node = tree.node(current);
                if node.children.len() != node.instruction.arity() {
                    return Err(lines.error(format!(
                        "{:?} needs {} children, found {}",
                        node.instruction,
                        node.instruction.arity(),
                        node.children.len()
                    )));
                }
                open.pop();
            }
            other => {
                return Err(lines.error(format!("expected OPEN or CLOSE, found {:?}", other)));
            }
        }
    }

    tree.recalculate_size();
    Ok(tree)
}

/// Parses a whole forest. Blank lines between trees are ignored.
pub fn parse_forest<I: Instruction>(text: &str) -> Result<Forest<I>> {
    let mut lines = Lines::new(text);
    let mut trees = Vec::new();
    while let Some((line, token)) = lines.next_top_level() {
        if token != OPEN {
            return Err(IoError::format(
                line,
                format!("expected OPEN at top level, found {:?}", token),
            ));
        }
        trees.push(read_tree::<I>(&mut lines, trees.len())?);
    }
    let forest = Forest::new(trees);
    forest
        .validate()
        .map_err(|e| IoError::validation(e.to_string()))?;
    Ok(forest)
}

/// Writes `forest` to `path` in the genome file format.
pub fn write_genome_file<I: Instruction, P: AsRef<Path>>(forest: &Forest<I>, path: P) -> Result<()> {
    let text = render_forest(forest)?;
    std::fs::write(&path, text).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("writing genome to {:?}", path.as_ref()))
    })?;
    tracing::debug!(
        path = %path.as_ref().display(),
        trees = forest.len(),
        nodes = forest.size(),
        "Genome file written"
    );
    Ok(())
}

/// Reads a forest from `path`. A malformed file yields no genome at all.
pub fn read_genome_file<I: Instruction, P: AsRef<Path>>(path: P) -> Result<Forest<I>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("reading genome from {:?}", path))
    })?;
    parse_forest(&text).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Rejected genome file");
        e.with_context(format!("loading genome from {:?}", path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphogen_data::{CellOp, CoefEdit, CoefTarget, RegisterEdit};

    fn sample_forest() -> Forest<CellOp> {
        let mut first = ProgramTree::from_root(CellOp::SeqDivision, Vec::new(), String::new(), 0);
        let root = first.root();
        let jump = first.add_node(CellOp::Jump, vec![-1], "SENSOR_knee".to_string());
        let end = first.add_node(CellOp::End, Vec::new(), "  padded ".to_string());
        first.attach_child(root, jump);
        first.attach_child(root, end);
        first.recalculate_size();

        let mut second = ProgramTree::new(
            CellOp::Coefficient {
                target: CoefTarget::B,
                edit: CoefEdit::Halve,
            },
            Vec::new(),
            1,
        );
        let leaf = second.node(second.root()).children[0];
        second.node_mut(leaf).extra = "tail".to_string();
        Forest::new(vec![first, second])
    }

    #[test]
    fn test_render_layout() {
        let forest = Forest::new(vec![ProgramTree::new(
            CellOp::Register(RegisterEdit::IncBias),
            Vec::new(),
            0,
        )]);
        let text = render_forest(&forest).expect("render");
        let expected = "OPEN\n10\nARGS\nARGS\n\nOPEN\n0\nARGS\nARGS\n\nCLOSE\nCLOSE\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_roundtrip_preserves_everything() {
        let forest = sample_forest();
        let text = render_forest(&forest).expect("render");
        let parsed: Forest<CellOp> = parse_forest(&text).expect("parse");
        assert_eq!(parsed, forest);
        assert_eq!(render_forest(&parsed).expect("render"), text);
    }

    #[test]
    fn test_extra_with_newline_rejected() {
        let mut tree = ProgramTree::<CellOp>::leaf(0);
        let root = tree.root();
        tree.node_mut(root).extra = "two\nlines".to_string();
        let err = render_forest(&Forest::new(vec![tree])).unwrap_err();
        assert!(matches!(err, IoError::Serialization(_)));
    }

    #[test]
    fn test_unknown_code_is_format_error() {
        let err = parse_forest::<CellOp>("OPEN\n99\nARGS\nARGS\n\nCLOSE\n").unwrap_err();
        assert!(matches!(err, IoError::Format { line: 2, .. }));
    }

    #[test]
    fn test_missing_child_is_format_error() {
        let text = "OPEN\n6\nARGS\nARGS\n\nCLOSE\n";
        let err = parse_forest::<CellOp>(text).unwrap_err();
        assert!(matches!(err, IoError::Format { line: 6, .. }));
    }

    #[test]
    fn test_wrong_arg_count_is_format_error() {
        let text = "OPEN\n5\nARGS\nARGS\n\nCLOSE\n";
        assert!(parse_forest::<CellOp>(text).unwrap_err().is_format());
    }

    #[test]
    fn test_truncated_file_is_format_error() {
        let text = "OPEN\n6\nARGS\nARGS\n\nOPEN\n0\nARGS\nARGS\n\nCLOSE\n";
        assert!(parse_forest::<CellOp>(text).unwrap_err().is_format());
    }

    #[test]
    fn test_garbage_at_top_level() {
        let err = parse_forest::<CellOp>("hello\n").unwrap_err();
        assert!(matches!(err, IoError::Format { line: 1, .. }));
    }

    #[test]
    fn test_empty_text_is_empty_forest() {
        let forest = parse_forest::<CellOp>("").expect("parse");
        assert!(forest.is_empty());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("genome.cel");
        let forest = sample_forest();
        write_genome_file(&forest, &path).expect("write");
        let loaded: Forest<CellOp> = read_genome_file(&path).expect("read");
        assert_eq!(loaded, forest);
    }

    #[test]
    fn test_missing_file_is_filesystem_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_genome_file::<CellOp, _>(dir.path().join("absent.cel")).unwrap_err();
        assert!(!err.is_format());
    }
}
