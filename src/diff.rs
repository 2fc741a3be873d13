//! Line-sequence alignment.
//!
//! [`opcodes`] computes a longest-common-subsequence alignment between two
//! line sequences and groups it into runs of equal, inserted, deleted and
//! replaced lines. [`diff_ops`] flattens those runs into one [`DiffOp`] per
//! line for the backport merger, and [`unified_diff`] renders them as a
//! unified diff for humans.
//!
//! The alignment trims the common prefix and suffix first and runs a
//! quadratic dynamic program over what is left, which is cheap for the
//! small edits typical of configuration files.
use std::fmt::Write as _;
use std::ops::Range;

/// Lines of context around each hunk of a unified diff.
const CONTEXT: usize = 3;

/// The kind of an [`Opcode`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `a[a]` equals `b[b]`.
    Equal,
    /// `b[b]` is new; `a` is empty.
    Insert,
    /// `a[a]` is gone; `b` is empty.
    Delete,
    /// `a[a]` was replaced by `b[b]`.
    Replace,
}

/// One run of an alignment between sequences `a` and `b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    /// What happened to the run.
    pub tag: Tag,
    /// Indices into `a`.
    pub a: Range<usize>,
    /// Indices into `b`.
    pub b: Range<usize>,
}

impl Opcode {
    const fn new(tag: Tag, a: Range<usize>, b: Range<usize>) -> Self {
        Self { tag, a, b }
    }
}

/// One line of a flattened alignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiffOp {
    /// The line is unchanged; carries the expected text.
    Equal(String),
    /// A new line; carries the edited text.
    Insert(String),
    /// The line was removed; carries the expected text.
    Delete(String),
    /// The line's content changed; carries the edited text.
    Replace(String),
}

impl DiffOp {
    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Equal(_) => "equal",
            Self::Insert(_) => "insert",
            Self::Delete(_) => "delete",
            Self::Replace(_) => "replace",
        }
    }

    /// The line text the op carries.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Equal(text) | Self::Insert(text) | Self::Delete(text) | Self::Replace(text) => {
                text
            }
        }
    }
}

/// Length of the LCS of `a[i..]` and `b[j..]`, read from a row-major table.
fn cell(table: &[usize], width: usize, i: usize, j: usize) -> usize {
    table.get(i * width + j).copied().unwrap_or_default()
}

/// Matching index pairs of a longest common subsequence of `a` and `b`.
fn lcs_pairs<T: PartialEq>(a: &[T], b: &[T]) -> Vec<(usize, usize)> {
    let width = b.len() + 1;
    let mut table = vec![0; (a.len() + 1) * width];
    for (i, x) in a.iter().enumerate().rev() {
        for (j, y) in b.iter().enumerate().rev() {
            let value = if x == y {
                cell(&table, width, i + 1, j + 1) + 1
            } else {
                cell(&table, width, i + 1, j).max(cell(&table, width, i, j + 1))
            };
            if let Some(slot) = table.get_mut(i * width + j) {
                *slot = value;
            }
        }
    }

    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while let (Some(x), Some(y)) = (a.get(i), b.get(j)) {
        if x == y {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if cell(&table, width, i + 1, j) >= cell(&table, width, i, j + 1) {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

/// Matching index pairs over the whole of `a` and `b`, in increasing order.
fn matching_pairs<T: PartialEq>(a: &[T], b: &[T]) -> Vec<(usize, usize)> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let a_rest = a.get(prefix..).unwrap_or_default();
    let b_rest = b.get(prefix..).unwrap_or_default();
    let suffix = a_rest
        .iter()
        .rev()
        .zip(b_rest.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let a_mid = a_rest.get(..a_rest.len() - suffix).unwrap_or_default();
    let b_mid = b_rest.get(..b_rest.len() - suffix).unwrap_or_default();

    let mut pairs: Vec<(usize, usize)> = (0..prefix).map(|k| (k, k)).collect();
    pairs.extend(
        lcs_pairs(a_mid, b_mid)
            .into_iter()
            .map(|(i, j)| (i + prefix, j + prefix)),
    );
    let a_tail = prefix + a_mid.len();
    let b_tail = prefix + b_mid.len();
    pairs.extend((0..suffix).map(|k| (a_tail + k, b_tail + k)));
    pairs
}

/// Align `a` with `b` and group the result into runs.
///
/// The runs cover both sequences completely and in order; an `Equal` run is
/// never adjacent to another `Equal` run.
///
/// ```
/// use uconf_cli::diff::{Tag, opcodes};
///
/// let tags: Vec<Tag> = opcodes(&["a", "b", "c"], &["a", "x", "c", "d"])
///     .into_iter()
///     .map(|op| op.tag)
///     .collect();
/// assert_eq!(tags, [Tag::Equal, Tag::Replace, Tag::Equal, Tag::Insert]);
/// ```
#[must_use]
pub fn opcodes<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Opcode> {
    let mut codes: Vec<Opcode> = Vec::new();
    let (mut i, mut j) = (0, 0);

    let sentinel = (a.len(), b.len());
    for (ai, bj) in matching_pairs(a, b).into_iter().chain([sentinel]) {
        let gap = match (i < ai, j < bj) {
            (true, true) => Some(Tag::Replace),
            (true, false) => Some(Tag::Delete),
            (false, true) => Some(Tag::Insert),
            (false, false) => None,
        };
        if let Some(tag) = gap {
            codes.push(Opcode::new(tag, i..ai, j..bj));
        }
        if (ai, bj) == sentinel {
            break;
        }

        match codes.last_mut() {
            Some(last) if last.tag == Tag::Equal && last.a.end == ai && last.b.end == bj => {
                last.a.end += 1;
                last.b.end += 1;
            }
            _ => codes.push(Opcode::new(Tag::Equal, ai..ai + 1, bj..bj + 1)),
        }
        i = ai + 1;
        j = bj + 1;
    }
    codes
}

fn lines<'a, S: AsRef<str>>(
    side: &'a [S],
    range: &Range<usize>,
) -> impl Iterator<Item = &'a str> + use<'a, S> {
    side.get(range.clone())
        .unwrap_or_default()
        .iter()
        .map(AsRef::as_ref)
}

/// Align `expected` with `edited` and flatten the result to one op per line.
///
/// A replaced run of `m` expected and `n` edited lines becomes `min(m, n)`
/// [`DiffOp::Replace`] ops, then the surplus edited lines as
/// [`DiffOp::Insert`], then the surplus expected lines as
/// [`DiffOp::Delete`].
///
/// ```
/// use uconf_cli::diff::{DiffOp, diff_ops};
///
/// let ops = diff_ops(&["a", "b"], &["a", "B", "c"]);
/// assert_eq!(
///     ops,
///     [
///         DiffOp::Equal("a".into()),
///         DiffOp::Replace("B".into()),
///         DiffOp::Insert("c".into()),
///     ]
/// );
/// ```
#[must_use]
pub fn diff_ops<A, B>(expected: &[A], edited: &[B]) -> Vec<DiffOp>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let a: Vec<&str> = expected.iter().map(AsRef::as_ref).collect();
    let b: Vec<&str> = edited.iter().map(AsRef::as_ref).collect();

    let mut ops = Vec::with_capacity(a.len().max(b.len()));
    for code in opcodes(&a, &b) {
        let old = lines(&a, &code.a);
        let new = lines(&b, &code.b);
        match code.tag {
            Tag::Equal => ops.extend(old.map(|l| DiffOp::Equal(l.to_string()))),
            Tag::Insert => ops.extend(new.map(|l| DiffOp::Insert(l.to_string()))),
            Tag::Delete => ops.extend(old.map(|l| DiffOp::Delete(l.to_string()))),
            Tag::Replace => {
                let paired = code.a.len().min(code.b.len());
                ops.extend(
                    lines(&b, &code.b)
                        .take(paired)
                        .map(|l| DiffOp::Replace(l.to_string())),
                );
                ops.extend(new.skip(paired).map(|l| DiffOp::Insert(l.to_string())));
                ops.extend(old.skip(paired).map(|l| DiffOp::Delete(l.to_string())));
            }
        }
    }

    tracing::trace!(
        expected = a.len(),
        edited = b.len(),
        ops = ops.len(),
        changed = ops.iter().filter(|op| !matches!(op, DiffOp::Equal(_))).count(),
        "aligned"
    );
    ops
}

/// Group runs into hunks with `context` lines of surrounding equal text.
fn grouped(mut codes: Vec<Opcode>, context: usize) -> Vec<Vec<Opcode>> {
    if let Some(first) = codes.first_mut()
        && first.tag == Tag::Equal
    {
        first.a.start = first.a.start.max(first.a.end.saturating_sub(context));
        first.b.start = first.b.start.max(first.b.end.saturating_sub(context));
    }
    if let Some(last) = codes.last_mut()
        && last.tag == Tag::Equal
    {
        last.a.end = last.a.end.min(last.a.start + context);
        last.b.end = last.b.end.min(last.b.start + context);
    }

    let mut groups = Vec::new();
    let mut group = Vec::new();
    for mut code in codes {
        if code.tag == Tag::Equal && code.a.len() > 2 * context {
            group.push(Opcode::new(
                Tag::Equal,
                code.a.start..code.a.start + context,
                code.b.start..code.b.start + context,
            ));
            if group.iter().any(|c| c.tag != Tag::Equal) {
                groups.push(std::mem::take(&mut group));
            } else {
                group.clear();
            }
            code.a.start = code.a.end - context;
            code.b.start = code.b.end - context;
        }
        group.push(code);
    }
    if group.iter().any(|c| c.tag != Tag::Equal) {
        groups.push(group);
    }
    groups
}

/// `start,length` range of a unified-diff hunk header.
fn hunk_range(range: &Range<usize>) -> String {
    match range.len() {
        0 => format!("{},0", range.start),
        1 => format!("{}", range.start + 1),
        len => format!("{},{len}", range.start + 1),
    }
}

/// Render a unified diff turning `a` into `b`.
///
/// Returns an empty string when the sequences are equal.
///
/// ```
/// use uconf_cli::diff::unified_diff;
///
/// let diff = unified_diff(&["a", "b"], &["a", "c"], "old", "new");
/// assert_eq!(diff, "--- old\n+++ new\n@@ -1,2 +1,2 @@\n a\n-b\n+c\n");
/// ```
#[must_use]
pub fn unified_diff<S: AsRef<str>>(a: &[S], b: &[S], from: &str, to: &str) -> String {
    let a: Vec<&str> = a.iter().map(AsRef::as_ref).collect();
    let b: Vec<&str> = b.iter().map(AsRef::as_ref).collect();

    let mut out = String::new();
    for group in grouped(opcodes(&a, &b), CONTEXT) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        if out.is_empty() {
            let _ = writeln!(out, "--- {from}\n+++ {to}");
        }
        let _ = writeln!(
            out,
            "@@ -{} +{} @@",
            hunk_range(&(first.a.start..last.a.end)),
            hunk_range(&(first.b.start..last.b.end))
        );
        for code in &group {
            if code.tag == Tag::Equal {
                for line in lines(&a, &code.a) {
                    let _ = writeln!(out, " {line}");
                }
                continue;
            }
            for line in lines(&a, &code.a) {
                let _ = writeln!(out, "-{line}");
            }
            for line in lines(&b, &code.b) {
                let _ = writeln!(out, "+{line}");
            }
        }
    }
    out
}
