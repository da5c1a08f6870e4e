//! Line wrapping for the strings displayed by the charts.
//!
//! Question texts and pollster names are long, and the renderers expect the
//! line breaks to be already present in the strings. The wrapping itself is a
//! collaborator of the selection logic: any implementation of [`TextWrapper`]
//! can be plugged in through [`crate::ViewOptions`].

/// The line separator understood by the HTML-like labels of the renderer.
pub const LINE_BREAK: &str = "<br>";

/// Inserts line breaks into a string so that no line is wider than `max_width`.
pub trait TextWrapper {
    fn wrap(&self, text: &str, max_width: usize) -> String;
}

/// Greedy word wrapping, with lines joined by [`LINE_BREAK`].
///
/// Consecutive whitespace is collapsed. Words wider than a full line are cut
/// into pieces of `max_width` characters. A width of zero disables wrapping.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct BreakWrapper;

impl TextWrapper for BreakWrapper {
    fn wrap(&self, text: &str, max_width: usize) -> String {
        if max_width == 0 {
            return text.to_string();
        }
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len: usize = 0;
        for word in text.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();
            while chars.len() > max_width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = chars.split_off(max_width);
                lines.push(chars.into_iter().collect());
                chars = rest;
            }
            let word_len = chars.len();
            if word_len == 0 {
                continue;
            }
            if current_len == 0 {
                current = chars.into_iter().collect();
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.extend(chars);
                current_len += 1 + word_len;
            } else {
                lines.push(std::mem::replace(&mut current, chars.into_iter().collect()));
                current_len = word_len;
            }
        }
        if current_len > 0 {
            lines.push(current);
        }
        lines.join(LINE_BREAK)
    }
}
