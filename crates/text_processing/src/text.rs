//! Byte-window helpers that never split a character

/// Up to `max_bytes` of text ending at `start`
pub(crate) fn preceding(text: &str, start: usize, max_bytes: usize) -> &str {
    let end = floor_boundary(text, start.min(text.len()));
    let begin = ceil_boundary(text, end.saturating_sub(max_bytes));
    &text[begin..end]
}

/// Up to `max_bytes` of text starting at `end`
pub(crate) fn following(text: &str, end: usize, max_bytes: usize) -> &str {
    let begin = ceil_boundary(text, end.min(text.len()));
    let stop = floor_boundary(text, begin.saturating_add(max_bytes).min(text.len()));
    &text[begin..stop.max(begin)]
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
