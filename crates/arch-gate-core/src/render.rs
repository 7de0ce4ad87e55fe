//! Source snippet rendering for warning previews.

use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use crate::types::CodeReference;

const GRAY: &str = "\x1b[90m";
const RESET: &str = "\x1b[0m";

/// Renders annotated source snippets.
///
/// Rendering never fails: unreadable files or invalid references produce
/// an empty snippet.
pub trait SourceRenderer: Send + Sync {
    /// Renders the region with a column pointer under the main line.
    fn source_code(&self, reference: &CodeReference, highlight: bool) -> Vec<u8>;

    /// Renders the region without the column pointer.
    fn source_code_without_offset(&self, reference: &CodeReference, highlight: bool) -> Vec<u8>;
}

/// Line region to print, 1-indexed and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    first: usize,
    last: usize,
    main: usize,
}

/// Plain-text renderer reading files from disk.
///
/// Output looks like:
///
/// ```text
///      9 | func main() {
/// >   10 |   svc := app.NewService(repo.NewPostgres())
///                                  ^
/// ```
///
/// With `highlight` the line-number gutter is dimmed with ANSI codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl PlainRenderer {
    /// Creates a renderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn render(reference: &CodeReference, highlight: bool, column_pointer: bool) -> Vec<u8> {
        let Some(pointer) = &reference.pointer else {
            return Vec::new();
        };
        let Some(source) = read_source(&pointer.file) else {
            return Vec::new();
        };
        let lines: Vec<&str> = source.lines().collect();
        let Some(region) = region(reference, lines.len()) else {
            return Vec::new();
        };

        let gutter = |text: String| {
            if highlight {
                format!("{GRAY}{text}{RESET}")
            } else {
                text
            }
        };

        let mut out = String::new();
        for (idx, code) in lines[region.first - 1..region.last].iter().enumerate() {
            let line = region.first + idx;
            let marker = if line == region.main { "> " } else { "  " };
            let _ = writeln!(
                out,
                "{marker}{} {}",
                gutter(format!("{line:4} |")),
                code.replace('\t', "  ")
            );

            if column_pointer && line == region.main {
                let offset = pointer.column.saturating_sub(1);
                // Tabs are printed two columns wide.
                let tabs = code.bytes().take(offset).filter(|b| *b == b'\t').count();
                let spaces = " ".repeat(offset + tabs);
                let _ = writeln!(out, "{} {spaces}^", gutter(" ".repeat(8)));
            }
        }
        out.into_bytes()
    }
}

impl SourceRenderer for PlainRenderer {
    fn source_code(&self, reference: &CodeReference, highlight: bool) -> Vec<u8> {
        Self::render(reference, highlight, true)
    }

    fn source_code_without_offset(&self, reference: &CodeReference, highlight: bool) -> Vec<u8> {
        Self::render(reference, highlight, false)
    }
}

fn read_source(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(source) => Some(source),
        Err(e) => {
            debug!("Cannot render {}: {}", path.display(), e);
            None
        }
    }
}

/// Clamps the requested lines to the file; `None` if nothing is left.
fn region(reference: &CodeReference, lines_count: usize) -> Option<Region> {
    let main = reference.pointer.as_ref()?.line;
    let first = reference.line_from.min(reference.line_to).max(1);
    let last = reference.line_from.max(reference.line_to).min(lines_count);
    if first > last {
        return None;
    }
    Some(Region { first, last, main })
}
