//! Text scan primitives.
//!
//! Every function here is a pure boundary finder over the source bytes. None
//! of them can fail: reading past the end of the buffer behaves like reading
//! a "no character" sentinel, and the result is always an offset the caller
//! can keep scanning from.
//!
//! Only ASCII bytes are ever tested, so offsets returned here always fall on
//! UTF-8 character boundaries of the (valid UTF-8) source.

/// Byte at `offset`, or `None` past the end of the buffer.
#[inline]
pub fn char_at(src: &[u8], offset: usize) -> Option<u8> {
    src.get(offset).copied()
}

/// Byte just before `offset`, or `None` at the start of the buffer.
#[inline]
pub fn char_before(src: &[u8], offset: usize) -> Option<u8> {
    offset.checked_sub(1).and_then(|i| char_at(src, i))
}

/// Signed distance of `offset` from the column `indent` of the line that
/// starts at `line_start`. Negative means "less indented".
#[inline]
pub fn indent_diff(offset: usize, line_start: usize, indent: isize) -> isize {
    offset as isize - (line_start as isize + indent)
}

/// Offset of the first byte of the line containing `offset`.
pub fn start_of_line(src: &[u8], offset: usize) -> usize {
    let end = offset.min(src.len());
    src[..end]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |nl| nl + 1)
}

/// Offset of the `\n` ending the line containing `offset`, or the buffer
/// length if the line is unterminated.
pub fn end_of_line(src: &[u8], offset: usize) -> usize {
    if offset >= src.len() {
        return offset;
    }
    src[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(src.len(), |i| offset + i)
}

/// Skip spaces and tabs.
pub fn end_of_white_space(src: &[u8], mut offset: usize) -> usize {
    while matches!(char_at(src, offset), Some(b' ' | b'\t')) {
        offset += 1;
    }
    offset
}

/// Skip spaces only; tabs never count as indentation.
pub fn end_of_indent(src: &[u8], mut offset: usize) -> usize {
    while char_at(src, offset) == Some(b' ') {
        offset += 1;
    }
    offset
}

/// End of an anchor, alias or tag name starting at `offset`.
///
/// A verbatim tag (`!<...>`) runs to its closing `>`; anything else stops at
/// whitespace or a flow indicator.
pub fn end_of_identifier(src: &[u8], mut offset: usize) -> usize {
    let verbatim = char_at(src, offset) == Some(b'<');
    loop {
        match char_at(src, offset) {
            None => return offset,
            Some(b'\n' | b'\t' | b' ') => break,
            Some(b'>') if verbatim => return offset + 1,
            Some(b'[' | b']' | b'{' | b'}' | b',') if !verbatim => break,
            Some(_) => offset += 1,
        }
    }
    offset
}

/// Whether `offset` is at a space, tab or line break; the end of the buffer
/// counts as blank only if `end_as_blank` is set.
pub fn at_blank(src: &[u8], offset: usize, end_as_blank: bool) -> bool {
    match char_at(src, offset) {
        Some(b'\n' | b'\t' | b' ') => true,
        None => end_as_blank,
        Some(_) => false,
    }
}

/// Move `offset` onto the next position a scan may resume from: the end of
/// the buffer stays put, a position just after a line break backs onto that
/// break, and anything else skips trailing spaces and tabs.
pub fn normalize_offset(src: &[u8], offset: usize) -> usize {
    match char_at(src, offset) {
        None => offset,
        Some(ch) if ch != b'\n' && char_before(src, offset) == Some(b'\n') => offset - 1,
        Some(_) => end_of_white_space(src, offset),
    }
}

/// For a line starting at `line_start`, the end of its indentation if the
/// line is more indented than `indent`, or the end of its whitespace if the
/// line is empty. `None` means the line ends the block.
pub fn end_of_block_indent(src: &[u8], indent: isize, line_start: usize) -> Option<usize> {
    let in_end = end_of_indent(src, line_start);
    if indent_diff(in_end, line_start, indent) > 0 {
        return Some(in_end);
    }
    let ws_end = end_of_white_space(src, in_end);
    match char_at(src, ws_end) {
        None | Some(b'\n') => Some(ws_end),
        Some(_) => None,
    }
}

/// Whether `offset` starts a `---` or `...` marker line. With `sep` set,
/// only that marker character is accepted. The end of the buffer counts as
/// a boundary.
pub fn at_document_boundary(src: &[u8], offset: usize, sep: Option<u8>) -> bool {
    let Some(ch0) = char_at(src, offset) else {
        return true;
    };
    if matches!(char_before(src, offset), Some(prev) if prev != b'\n') {
        return false;
    }
    let is_marker = match sep {
        Some(sep) => ch0 == sep,
        None => ch0 == b'-' || ch0 == b'.',
    };
    if !is_marker {
        return false;
    }
    if char_at(src, offset + 1) != Some(ch0) || char_at(src, offset + 2) != Some(ch0) {
        return false;
    }
    matches!(char_at(src, offset + 3), None | Some(b'\n' | b'\t' | b' '))
}

/// Whether content starting with `ch`, `indent_diff` columns away from the
/// parent indent, belongs to the parent. Block indicators count as indent
/// when `indicator_as_indent` is set.
pub fn next_node_is_indented(ch: Option<u8>, indent_diff: isize, indicator_as_indent: bool) -> bool {
    match ch {
        None => false,
        Some(_) if indent_diff < 0 => false,
        Some(_) if indent_diff > 0 => true,
        Some(ch) => indicator_as_indent && ch == b'-',
    }
}

/// Look past the line containing `offset` and any following comment or
/// empty lines: does the next real content reach column `indent`?
pub fn next_content_has_indent(src: &[u8], mut offset: usize, indent: isize) -> bool {
    loop {
        let line_start = end_of_line(src, offset) + 1;
        offset = end_of_white_space(src, line_start);
        match char_at(src, offset) {
            None => return false,
            Some(_) if indent_diff(offset, line_start, indent) >= 0 => return true,
            Some(b'#' | b'\n') => continue,
            Some(_) => return false,
        }
    }
}

/// Zero-based line and column (in bytes) of `offset`.
pub fn line_col(src: &[u8], offset: usize) -> (usize, usize) {
    let end = offset.min(src.len());
    let line = src[..end].iter().filter(|&&b| b == b'\n').count();
    (line, end - start_of_line(src, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_bounds() {
        let src = b"ab\ncd\n\nef";
        assert_eq!(start_of_line(src, 0), 0);
        assert_eq!(start_of_line(src, 4), 3);
        assert_eq!(start_of_line(src, 3), 3);
        assert_eq!(start_of_line(src, 6), 6);
        assert_eq!(end_of_line(src, 0), 2);
        assert_eq!(end_of_line(src, 6), 6);
        assert_eq!(end_of_line(src, 8), 9);
        assert_eq!(end_of_line(src, 9), 9);
    }

    #[test]
    fn test_whitespace_and_indent() {
        let src = b"  \t x";
        assert_eq!(end_of_indent(src, 0), 2);
        assert_eq!(end_of_white_space(src, 0), 4);
        assert_eq!(end_of_white_space(src, 4), 4);
        assert_eq!(end_of_indent(b"   ", 0), 3);
    }

    #[test]
    fn test_identifier() {
        assert_eq!(end_of_identifier(b"&anchor value", 1), 7);
        assert_eq!(end_of_identifier(b"!tag,x", 1), 4);
        assert_eq!(end_of_identifier(b"!<tag:a> x", 1), 8);
        assert_eq!(end_of_identifier(b"!<tag a>", 1), 5);
        assert_eq!(end_of_identifier(b"*a", 1), 2);
    }

    #[test]
    fn test_at_blank() {
        assert!(at_blank(b"- a", 1, false));
        assert!(!at_blank(b"-a", 1, false));
        assert!(!at_blank(b"-", 1, false));
        assert!(at_blank(b"-", 1, true));
    }

    #[test]
    fn test_normalize_offset() {
        let src = b"a  \nb";
        assert_eq!(normalize_offset(src, 1), 3);
        assert_eq!(normalize_offset(src, 3), 3);
        assert_eq!(normalize_offset(src, 4), 3);
        assert_eq!(normalize_offset(src, 5), 5);
    }

    #[test]
    fn test_end_of_block_indent() {
        let src = b"a\n    b\n  \nc";
        assert_eq!(end_of_block_indent(src, 2, 2), Some(6));
        assert_eq!(end_of_block_indent(src, 4, 2), None);
        assert_eq!(end_of_block_indent(src, 4, 8), Some(10));
        assert_eq!(end_of_block_indent(src, 0, 11), None);
        assert_eq!(end_of_block_indent(src, -1, 11), Some(11));
    }

    #[test]
    fn test_document_boundary() {
        assert!(at_document_boundary(b"---\n", 0, None));
        assert!(at_document_boundary(b"a\n...", 2, None));
        assert!(at_document_boundary(b"a\n--- x", 2, Some(b'-')));
        assert!(!at_document_boundary(b"a\n---", 2, Some(b'.')));
        assert!(!at_document_boundary(b"----", 0, None));
        assert!(!at_document_boundary(b" ---", 1, None));
        assert!(at_document_boundary(b"a", 1, None));
    }

    #[test]
    fn test_next_node_is_indented() {
        assert!(!next_node_is_indented(None, 3, true));
        assert!(!next_node_is_indented(Some(b'a'), -1, true));
        assert!(next_node_is_indented(Some(b'a'), 1, false));
        assert!(next_node_is_indented(Some(b'-'), 0, true));
        assert!(!next_node_is_indented(Some(b'-'), 0, false));
        assert!(!next_node_is_indented(Some(b'a'), 0, true));
    }

    #[test]
    fn test_next_content_has_indent() {
        let src = b"  - a\n# c\n\n  - b\n";
        assert!(next_content_has_indent(src, 6, 2));
        let src = b"  - a\n# c\n- b\n";
        assert!(!next_content_has_indent(src, 6, 2));
        let src = b"  - a\n# c\n";
        assert!(!next_content_has_indent(src, 6, 2));
    }

    #[test]
    fn test_line_col() {
        let src = b"a\n  b\n";
        assert_eq!(line_col(src, 0), (0, 0));
        assert_eq!(line_col(src, 4), (1, 2));
        assert_eq!(line_col(src, 6), (2, 0));
    }
}
