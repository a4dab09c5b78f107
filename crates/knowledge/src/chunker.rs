//! Line-oriented text chunking.

/// One line of an article with its original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment<'a> {
    /// Zero-based line number within the article
    pub index: usize,
    pub text: &'a str,
}

/// Split text into one segment per `\n`-delimited line.
///
/// A trailing `\r` is stripped from each line. Empty text is a single empty
/// line. With `keep_empty` unset, blank and whitespace-only lines are dropped
/// but survivors keep their original line number.
pub fn chunk_lines(text: &str, keep_empty: bool) -> Vec<LineSegment<'_>> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
        .filter(|(_, line)| keep_empty || !line.trim().is_empty())
        .map(|(index, text)| LineSegment { index, text })
        .collect()
}
