//! Fold edits of a rendered file back into its template source.
//!
//! The source is rendered once to get the canonical output, which is aligned
//! with the edited file. A second, independent render pass then walks the
//! source: hidden lines are copied through untouched, and every visible line
//! consumes ops from the alignment.
//!
//! Text taken from the edited file is escaped when it looks like a
//! directive, so that rendering the result reproduces it literally.
use crate::diff::{self, DiffOp};
use crate::error::{AlignmentError, BackportError, RenderError};
use crate::template::directive::escape;
use crate::template::{Line, RenderConfig};

/// Merge `edited` (a modified render of `source`) back into `source`.
///
/// ```
/// use uconf_cli::backport::backport;
/// use uconf_cli::categories::CategorySet;
/// use uconf_cli::template::RenderConfig;
///
/// let config = RenderConfig::new(CategorySet::parse_list("web"));
/// let source = ["#@if web", "listen 80", "#@else", "listen 8080", "#@endif"];
/// let merged = backport(&config, &source, &["listen 443"]).unwrap();
/// assert_eq!(
///     merged,
///     ["#@if web", "listen 443", "#@else", "listen 8080", "#@endif"]
/// );
/// ```
///
/// # Errors
///
/// Returns [`BackportError::Render`] if `source` does not render and
/// [`BackportError::Alignment`] if the alignment does not line up with the
/// second render pass.
pub fn backport<S, E>(
    config: &RenderConfig,
    source: &[S],
    edited: &[E],
) -> Result<Vec<String>, BackportError>
where
    S: AsRef<str>,
    E: AsRef<str>,
{
    let canonical = config.render(source)?;
    let ops = diff::diff_ops(&canonical, edited);
    tracing::debug!(
        source = source.len(),
        canonical = canonical.len(),
        edited = edited.len(),
        "backport"
    );
    merge(config.renderer(source), ops)
}

/// Walk a render pass and apply `ops`, one per visible line.
///
/// Before each visible line any pending [`DiffOp::Insert`] ops are emitted;
/// then exactly one more op decides the line's fate. Ops left over once the
/// source is exhausted must all be inserts.
///
/// # Errors
///
/// Returns the first render error of `lines`, or an [`AlignmentError`] when
/// the ops run out early, carry text that differs from the rendered line,
/// or a non-insert op is left at the end.
pub fn merge<L, O>(lines: L, ops: O) -> Result<Vec<String>, BackportError>
where
    L: IntoIterator<Item = Result<Line, RenderError>>,
    O: IntoIterator<Item = DiffOp>,
{
    let mut ops = ops.into_iter();
    let mut merged = Vec::new();

    for (index, line) in lines.into_iter().enumerate() {
        let number = index + 1;
        let Line { output, original } = line?;
        let Some(rendered) = output else {
            merged.push(original);
            continue;
        };

        let op = loop {
            match ops.next() {
                Some(DiffOp::Insert(text)) => merged.push(escape(&text)),
                other => break other,
            }
        };
        match op {
            Some(DiffOp::Equal(text)) if text == rendered => merged.push(original),
            Some(DiffOp::Delete(text)) if text == rendered => {}
            Some(DiffOp::Replace(text)) => merged.push(escape(&text)),
            Some(DiffOp::Equal(text) | DiffOp::Delete(text)) => {
                return Err(AlignmentError::MismatchedLine {
                    line: number,
                    expected: text,
                    found: rendered,
                }
                .into());
            }
            Some(DiffOp::Insert(_)) | None => {
                return Err(AlignmentError::MissingOpcode { line: number }.into());
            }
        }
    }

    for op in ops {
        match op {
            DiffOp::Insert(text) => merged.push(escape(&text)),
            other => {
                return Err(AlignmentError::TrailingOpcode {
                    op: format!("{} {:?}", other.tag(), other.text()),
                }
                .into());
            }
        }
    }

    Ok(merged)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::categories::CategorySet;

    fn config(categories: &str) -> RenderConfig {
        RenderConfig::new(CategorySet::parse_list(categories))
    }

    fn shown(text: &str) -> Result<Line, RenderError> {
        Ok(Line {
            output: Some(text.to_string()),
            original: text.to_string(),
        })
    }

    fn hidden(text: &str) -> Result<Line, RenderError> {
        Ok(Line {
            output: None,
            original: text.to_string(),
        })
    }

    const SOURCES: [&[&str]; 6] = [
        &[],
        &["plain", "", "lines"],
        &[
            "#@if web",
            "listen 80",
            "#@elif db",
            "listen 5432",
            "#@else",
            "listen 8080",
            "#@endif",
        ],
        &[
            "#@# generated",
            "#@with port=8080",
            "port @@port@@",
            "#@endwith port",
            "port @@port@@",
        ],
        &["#@@if literal", "\"@@@@x@@", "#@if web", "#@@hidden", "#@endif"],
        &[
            "head",
            "#@if web",
            "#@if db",
            "both",
            "#@else",
            "web only",
            "#@endif",
            "#@endif",
            "tail",
        ],
    ];

    // -----------------------------------------------------------------------
    // Laws
    // -----------------------------------------------------------------------

    #[test]
    fn backport_of_unmodified_render_is_identity() {
        for categories in ["", "web", "db", "web,db"] {
            let cfg = config(categories);
            for source in SOURCES {
                let rendered = cfg.render(source).unwrap();
                let merged = backport(&cfg, source, &rendered).unwrap();
                assert_eq!(merged, source, "categories {categories:?}");
            }
        }
    }

    type Edit = fn(&mut Vec<String>);

    const EDITS: [Edit; 6] = [
        |lines| lines.push("appended".to_string()),
        |lines| lines.insert(0, "prepended".to_string()),
        |lines| {
            if !lines.is_empty() {
                lines.remove(0);
            }
        },
        |lines| {
            if let Some(last) = lines.last_mut() {
                *last = format!("{last} # changed");
            }
        },
        |lines| {
            let middle = lines.len() / 2;
            lines.insert(middle, "#@endif".to_string());
            lines.insert(middle, "\"@with x=1".to_string());
        },
        |lines| {
            lines.clear();
            lines.push("replaced everything".to_string());
        },
    ];

    #[test]
    fn rendering_the_backport_reproduces_the_edit() {
        for categories in ["", "web", "web,db"] {
            let cfg = config(categories);
            for source in SOURCES {
                for edit in EDITS {
                    let mut edited = cfg.render(source).unwrap();
                    edit(&mut edited);
                    let merged = backport(&cfg, source, &edited).unwrap();
                    assert_eq!(
                        cfg.render(&merged).unwrap(),
                        edited,
                        "source {source:?} categories {categories:?}"
                    );
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Behaviour
    // -----------------------------------------------------------------------

    #[test]
    fn hidden_branch_survives_an_edit() {
        let cfg = config("web");
        let source = ["#@if web", "listen 80", "#@else", "listen 8080", "#@endif", "tail"];
        let merged = backport(&cfg, &source, &["listen 81", "tail", "new"]).unwrap();
        assert_eq!(
            merged,
            [
                "#@if web",
                "listen 81",
                "#@else",
                "listen 8080",
                "#@endif",
                "tail",
                "new"
            ]
        );
    }

    #[test]
    fn unchanged_placeholder_lines_keep_their_template() {
        let cfg = config("");
        let source = ["#@with port=80", "port @@port@@", "#@endwith"];
        let merged = backport(&cfg, &source, &["port 80", "extra"]).unwrap();
        assert_eq!(merged, ["#@with port=80", "port @@port@@", "#@endwith", "extra"]);
    }

    #[test]
    fn inserted_placeholder_text_is_filled_on_rerender() {
        let cfg = config("");
        let source = ["#@with p=80", "port @@p@@", "#@endwith"];
        let merged = backport(&cfg, &source, &["x @@p@@", "port 80"]).unwrap();
        assert_eq!(merged, ["#@with p=80", "x @@p@@", "port @@p@@", "#@endwith"]);
        // Inline placeholders cannot be escaped, so the literal is bound again.
        assert_eq!(cfg.render(&merged).unwrap(), ["x 80", "port 80"]);
    }

    #[test]
    fn edited_directive_text_is_escaped() {
        let cfg = config("");
        let merged = backport(&cfg, &["a"], &["#@if evil", "!@#", "ok"]).unwrap();
        assert_eq!(merged, ["#@@if evil", "!@@#", "ok"]);
        assert_eq!(cfg.render(&merged).unwrap(), ["#@if evil", "!@#", "ok"]);
    }

    #[test]
    fn inserts_land_before_the_next_visible_line() {
        let cfg = config("");
        let merged = backport(&cfg, &["#@# note", "a"], &["z", "a"]).unwrap();
        assert_eq!(merged, ["#@# note", "z", "a"]);
    }

    #[test]
    fn deleted_lines_are_dropped() {
        let cfg = config("");
        let merged = backport(&cfg, &["a", "b", "c"], &["a", "c"]).unwrap();
        assert_eq!(merged, ["a", "c"]);
    }

    #[test]
    fn render_error_aborts_backport() {
        let cfg = config("");
        let err = backport(&cfg, &["#@endif"], &[] as &[&str]).unwrap_err();
        assert!(matches!(err, BackportError::Render(_)));
    }

    // -----------------------------------------------------------------------
    // merge invariants
    // -----------------------------------------------------------------------

    #[test]
    fn merge_fails_when_ops_run_out() {
        let err = merge([hidden("#@if x"), shown("a")], Vec::<DiffOp>::new()).unwrap_err();
        assert!(matches!(
            err,
            BackportError::Alignment(AlignmentError::MissingOpcode { line: 2 })
        ));
    }

    #[test]
    fn merge_fails_on_trailing_delete() {
        let err = merge(
            [shown("a")],
            [DiffOp::Equal("a".into()), DiffOp::Delete("b".into())],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), r#"Unexpected trailing diff opcode delete "b""#);
    }

    #[test]
    fn merge_fails_on_mismatched_equal() {
        let err = merge([shown("a")], [DiffOp::Equal("b".into())]).unwrap_err();
        assert!(matches!(
            err,
            BackportError::Alignment(AlignmentError::MismatchedLine { line: 1, .. })
        ));
    }

    #[test]
    fn merge_emits_trailing_inserts() {
        let merged = merge(
            [shown("a")],
            [
                DiffOp::Equal("a".into()),
                DiffOp::Insert("b".into()),
                DiffOp::Insert("#@c".into()),
            ],
        )
        .unwrap();
        assert_eq!(merged, ["a", "b", "#@@c"]);
    }
}
