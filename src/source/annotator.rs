use unicode_width::UnicodeWidthChar;

use super::span::Span;

/// Renders an input line with a caret underline beneath the span a
/// diagnostic refers to.
pub struct SourceAnnotator {
    pub show_line_numbers: bool,
    pub show_location: bool,
    pub underline_char: char,
    pub label: Option<String>,
}

impl SourceAnnotator {
    pub fn new() -> Self {
        Self {
            show_line_numbers: true,
            show_location: false,
            underline_char: '^',
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_location(mut self) -> Self {
        self.show_location = true;
        self
    }

    #[cfg(test)]
    pub fn without_line_numbers(mut self) -> Self {
        self.show_line_numbers = false;
        self
    }

    /// Annotate one line of input. `line_number` is 0-based; a `span` of
    /// `None` underlines the whole line.
    pub fn annotate(
        &self,
        filename: Option<&str>,
        line_number: usize,
        line: &str,
        span: Option<Span>,
        message: &str,
    ) -> String {
        let mut output = String::new();

        if let Some(ref label) = self.label {
            output.push_str(&format!("{}: {}\n", label, message));
        } else {
            output.push_str(&format!("{}\n", message));
        }

        let span = span.unwrap_or_else(|| Span::new(0, line.chars().count()));

        if self.show_location {
            let location = format!("(line {}, col {})", line_number + 1, span.start + 1);
            match filename {
                Some(filename) => output.push_str(&format!("  --> {} {}\n", filename, location)),
                None => output.push_str(&format!("  --> {}\n", location)),
            }
        }

        let gutter = (line_number + 1).to_string();
        if self.show_line_numbers {
            output.push_str(&format!("{} | ", gutter));
        }
        output.push_str(line);
        output.push('\n');

        if self.show_line_numbers {
            output.push_str(&format!("{:width$} | ", "", width = gutter.len()));
        }
        for (i, ch) in line.chars().enumerate() {
            if i >= span.start {
                break;
            }
            output.push_str(&" ".repeat(ch.width().unwrap_or(0)));
        }
        let width: usize = line
            .chars()
            .skip(span.start)
            .take(span.len())
            .map(|ch| ch.width().unwrap_or(0))
            .sum();
        // A zero-width span (end of line) still gets a single caret.
        output.push_str(&self.underline_char.to_string().repeat(width.max(1)));
        output.push('\n');

        output
    }
}

impl Default for SourceAnnotator {
    fn default() -> Self {
        Self::new()
    }
}
