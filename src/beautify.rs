//! Lossy reconstruction of readable text from unified diffs.
//!
//! The transform works one line at a time: `+` markers are stripped, `-`
//! lines are kept or dropped according to [`RemovedLines`], and a leading
//! `@@ -a,b +c,d @@ ` hunk header is removed from any other line. It does not
//! track hunk offsets or merge against a base file, so diff metadata such as
//! `diff --git` and `index` lines pass through nearly verbatim.

/// Policy for lines that the diff marks as removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovedLines {
    /// Emit removed lines with the `-` marker stripped.
    Keep,
    /// Omit removed lines entirely.
    #[default]
    Drop,
}

impl From<bool> for RemovedLines {
    fn from(keep: bool) -> Self {
        if keep { Self::Keep } else { Self::Drop }
    }
}

/// Rewrites unified-diff text into a plain rendering.
///
/// Every emitted line is terminated with `\n`.
///
/// # Example
///
/// ```
/// use diffharvest::beautify::{RemovedLines, beautify};
///
/// let diff = "@@ -1,2 +1,2 @@ fn main() {\n-    old();\n+    new();\n";
/// assert_eq!(beautify(diff, RemovedLines::Drop), "fn main() {\n    new();\n");
/// ```
#[must_use]
pub fn beautify(diff: &str, removed_lines: RemovedLines) -> String {
    let mut rendered = String::with_capacity(diff.len());

    for line in diff.lines() {
        let emitted = if let Some(added) = line.strip_prefix('+') {
            added
        } else if let Some(removed) = line.strip_prefix('-') {
            match removed_lines {
                RemovedLines::Keep => removed,
                RemovedLines::Drop => continue,
            }
        } else {
            strip_hunk_header(line)
        };

        rendered.push_str(emitted);
        rendered.push('\n');
    }

    rendered
}

/// Removes leading `@@ -<n>,<n> +<n>,<n> @@ ` headers until none is left,
/// returning the line unchanged when it does not start with one.
fn strip_hunk_header(line: &str) -> &str {
    let mut rest = line;
    while let Some(remainder) = hunk_header_remainder(rest) {
        rest = remainder;
    }
    rest
}

fn hunk_header_remainder(line: &str) -> Option<&str> {
    let after_old = strip_range(line.strip_prefix("@@ -")?)?;
    let after_new = strip_range(after_old.strip_prefix(" +")?)?;
    after_new.strip_prefix(" @@ ")
}

fn strip_range(input: &str) -> Option<&str> {
    let after_start = strip_digits(input)?;
    strip_digits(after_start.strip_prefix(',')?)
}

fn strip_digits(input: &str) -> Option<&str> {
    let rest = input.trim_start_matches(|ch: char| ch.is_ascii_digit());
    (rest.len() < input.len()).then_some(rest)
}
