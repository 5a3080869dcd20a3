// Source line tracking for tokens and diagnostics

/// Maps byte offsets of a source text to 1-based line numbers and back.
pub struct SourceMap {
    source: String,
    lines: Vec<usize>, // Byte offsets of line starts
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut lines = vec![0];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                lines.push(i + 1);
            }
        }
        Self {
            source: source.to_string(),
            lines,
        }
    }

    /// Line (1-based) containing the given byte offset
    pub fn line_at(&self, offset: usize) -> usize {
        match self.lines.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Get a line of source code (1-based)
    pub fn get_line(&self, line_num: usize) -> Option<&str> {
        if line_num == 0 || line_num > self.lines.len() {
            return None;
        }

        let start = self.lines[line_num - 1];
        let end = if line_num < self.lines.len() {
            self.lines[line_num]
        } else {
            self.source.len()
        };

        let line = &self.source[start..end];
        Some(line.trim_end_matches('\n').trim_end_matches('\r'))
    }

    /// Lines surrounding `line`, clamped to the file
    pub fn get_context(&self, line: usize, context_lines: usize) -> Vec<(usize, String)> {
        let start_line = line.saturating_sub(context_lines).max(1);
        let end_line = (line + context_lines).min(self.lines.len());

        (start_line..=end_line)
            .filter_map(|i| self.get_line(i).map(|text| (i, text.to_string())))
            .collect()
    }
}
