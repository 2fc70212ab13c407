//! Character-indexed query text
//!
//! Every position the engine reports (NER spans, parameter matches,
//! segments) is a Unicode scalar offset, half-open. `QueryText` keeps the
//! raw characters next to a lowercase copy of the same length so a hit found
//! in the lowercase view maps straight back to the raw text.

/// Function words and generic nouns that never count as a parameter or a
/// manufacturer on their own (Ukrainian, Russian, English).
const STOPWORDS: &[&str] = &[
    // Ukrainian
    "які", "який", "яка", "яке", "що", "чи", "для", "від", "при", "під", "над", "про", "без",
    "через", "після", "перед", "біля", "коло", "поза", "між", "поміж", "серед", "вздовж",
    "всередині",
    // Russian
    "какой", "какая", "какое", "какие", "что", "от", "под", "после",
    // English
    "what", "which", "how", "for", "from", "with", "without", "the", "this", "that", "these",
    "those", "and", "or", "give", "me", "tell", "inverter", "battery",
];

/// Case-insensitive stopword test on a single word.
pub fn is_stopword(word: &str) -> bool {
    let word = lower_aligned(word.trim());
    STOPWORDS.contains(&word.as_str())
}

/// Lowercase a single character without changing the character count.
///
/// Characters whose lowercase form expands to several characters are kept as is.
#[inline]
pub fn lower_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Lowercase a string character by character (see [`lower_char`]).
pub fn lower_aligned(s: &str) -> String {
    s.chars().map(lower_char).collect()
}

/// Raw query text with a 1:1 aligned lowercase view.
#[derive(Debug, Clone)]
pub struct QueryText {
    raw: String,
    chars: Vec<char>,
    lower: Vec<char>,
    /// Byte offset of every char, plus `raw.len()` as a sentinel
    byte_offsets: Vec<usize>,
}

impl QueryText {
    pub fn new(raw: &str) -> Self {
        let mut chars = Vec::with_capacity(raw.len());
        let mut byte_offsets = Vec::with_capacity(raw.len() + 1);
        for (i, c) in raw.char_indices() {
            chars.push(c);
            byte_offsets.push(i);
        }
        byte_offsets.push(raw.len());
        let lower = chars.iter().copied().map(lower_char).collect();
        Self {
            raw: raw.to_string(),
            chars,
            lower,
            byte_offsets,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn lower(&self) -> &[char] {
        &self.lower
    }

    /// Raw text of the character range `[start, end)`, clamped to the text.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.len());
        let start = start.min(end);
        &self.raw[self.byte_offsets[start]..self.byte_offsets[end]]
    }

    /// Convert a byte offset (as returned by `regex`) to a character offset.
    pub fn char_offset(&self, byte: usize) -> usize {
        match self.byte_offsets.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    /// True when `[start, end)` is not glued to alphanumerics on either side.
    pub fn is_word_bounded(&self, start: usize, end: usize) -> bool {
        let before = start == 0 || !self.chars[start - 1].is_alphanumeric();
        let after = end >= self.len() || !self.chars[end].is_alphanumeric();
        before && after
    }

    /// Non-overlapping occurrences of `needle` in the lowercase view, left to right.
    pub fn find_lower<'a>(&'a self, needle: &'a [char]) -> impl Iterator<Item = usize> + 'a {
        let mut from = 0;
        std::iter::from_fn(move || {
            if needle.is_empty() {
                return None;
            }
            while from + needle.len() <= self.lower.len() {
                let at = from;
                if self.lower[at..at + needle.len()] == *needle {
                    from = at + needle.len();
                    return Some(at);
                }
                from += 1;
            }
            None
        })
    }
}
