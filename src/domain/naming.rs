//! File names for split output.

use std::collections::HashSet;

/// Transliterates text to ASCII.
pub trait Romanizer: Send + Sync {
    fn romanize(&self, text: &str) -> String;
}

/// [`Romanizer`] backed by `deunicode`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiRomanizer;

impl Romanizer for AsciiRomanizer {
    fn romanize(&self, text: &str) -> String {
        deunicode::deunicode(text)
    }
}

const UNTITLED: &str = "untitled";
const RESERVED: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Filesystem-safe stem for a display title.
///
/// Path separators, characters reserved on common filesystems and control
/// characters become `_`. Surrounding whitespace and dots are trimmed so the
/// stem can never be `.` or `..`.
pub fn file_stem(romanizer: &dyn Romanizer, title: &str) -> String {
    let sanitized: String = romanizer
        .romanize(title)
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = sanitized.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Hands out unique stems within one directory.
///
/// Every stem stands for a family of entries (`stem.xml`, the index file,
/// the `stem/` directory). A stem is only handed out when every name in its
/// family is still free, and then the whole family is taken.
#[derive(Debug, Default)]
pub struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a final name as taken without handing out a stem for it.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    /// Returns `stem`, or `stem-2`, `stem-3`, ... when any of
    /// `stem + suffix` for the given suffixes is already taken.
    pub fn allocate(&mut self, stem: &str, suffixes: &[&str]) -> String {
        let mut candidate = stem.to_string();
        let mut n = 1;
        while suffixes
            .iter()
            .any(|suffix| self.used.contains(&format!("{}{}", candidate, suffix)))
        {
            n += 1;
            candidate = format!("{}-{}", stem, n);
        }
        for suffix in suffixes {
            self.used.insert(format!("{}{}", candidate, suffix));
        }
        candidate
    }
}
