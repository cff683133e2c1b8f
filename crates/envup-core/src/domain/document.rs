//! The merged document produced by an upgrade.

/// Ordered output lines, one per template line.
///
/// Lines never contain a trailing newline; [`MergedDocument::render`] joins
/// them and terminates the file with a single `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedDocument {
    lines: Vec<String>,
}

impl MergedDocument {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Serializes the document as file contents.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
