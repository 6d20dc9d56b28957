//! Indent-aware text buffer for generated code.

const INDENT: &str = "  ";

/// Accumulates output lines with a current indentation level.
#[derive(Debug, Default)]
pub struct Output {
    buffer: String,
    depth: usize,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced dedent");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Write one line at the current indentation.
    pub fn write_line(&mut self, line: &str) {
        for _ in 0..self.depth {
            self.buffer.push_str(INDENT);
        }
        self.buffer.push_str(line);
        self.buffer.push('\n');
    }

    /// Write an empty line (no indentation).
    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_nests_and_unnests() {
        let mut out = Output::new();
        out.write_line("func F");
        out.indent();
        out.write_line("x = 1");
        out.dedent();
        out.write_line("done");
        assert_eq!(out.finish(), "func F\n  x = 1\ndone\n");
    }

    #[test]
    fn blank_lines_are_unindented() {
        let mut out = Output::new();
        out.indent();
        out.blank_line();
        assert_eq!(out.finish(), "\n");
    }
}
