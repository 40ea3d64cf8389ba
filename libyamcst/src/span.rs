//! Byte ranges into the parsed source.

/// A `[start, end)` byte range in the (newline-normalized) source.
///
/// `orig` is only filled in by [`Span::set_orig_range`], after carriage
/// returns were stripped from the input; it then holds the same range
/// expressed in offsets of the original buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub orig: Option<(usize, usize)>,
}

impl Span {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            orig: None,
        }
    }

    /// A zero-width span at `offset`.
    #[inline]
    pub const fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[inline]
    pub const fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The slice of `src` covered by this span, clamped to the buffer.
    pub fn slice<'a>(&self, src: &'a str) -> &'a str {
        let end = self.end.min(src.len());
        let start = self.start.min(end);
        &src[start..end]
    }

    /// Map this span back onto a buffer that still had its `\r` bytes.
    ///
    /// `cr` lists, in ascending order, the normalized offsets at which a
    /// `\r` was removed; `offset` is the index into `cr` where the search may
    /// start, since spans are visited in source order. Returns the index to
    /// continue from for the next span.
    pub fn set_orig_range(&mut self, cr: &[usize], offset: usize) -> usize {
        let Span { start, end, .. } = *self;
        if cr.is_empty() || end <= cr[0] {
            self.orig = Some((start, end));
            return offset;
        }
        let mut i = offset;
        while i < cr.len() && cr[i] <= start {
            i += 1;
        }
        let orig_start = start + i;
        let next_offset = i;
        // an end sitting on `\n` now sits on the `\r` before it
        while i < cr.len() && cr[i] < end {
            i += 1;
        }
        self.orig = Some((orig_start, end + i));
        next_offset
    }
}
