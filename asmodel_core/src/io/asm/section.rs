//! Split ASM text into sections of key/value entries and resolve `${...}` references
use indexmap::IndexMap;

use crate::io::asm::AsmParseError;

/// Sections which may appear in an ASM model specification
pub(crate) const KNOWN_SECTIONS: [&str; 7] = [
    "Specification",
    "Identifiers",
    "Objects",
    "Initials",
    "Bounds",
    "Variables",
    "Reactions",
];

/// Deepest chain of nested references followed before giving up
const MAX_INTERPOLATION_DEPTH: usize = 16;

/// A single `key : value` line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub key: String,
    pub value: String,
    /// 1-based line number in the source
    pub line: usize,
}

/// Entries of every section, in the order they appear
#[derive(Debug, Default)]
pub(crate) struct Sections {
    sections: IndexMap<String, Vec<Entry>>,
    /// Line of the first header of each section
    headers: IndexMap<String, usize>,
}

impl Sections {
    /// Scan the source text into sections
    pub fn scan(source: &str) -> Result<Sections, AsmParseError> {
        let mut sections = Sections::default();
        let mut current: Option<String> = None;
        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let text = strip_inline_comment(raw).trim();
            if text.is_empty() || text.starts_with('#') || text.starts_with(';') {
                continue;
            }
            if let Some(name) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
                let name = name.trim();
                if !KNOWN_SECTIONS.contains(&name) {
                    return Err(AsmParseError::malformed(line, name, "unknown section"));
                }
                sections.sections.entry(name.to_string()).or_default();
                sections.headers.entry(name.to_string()).or_insert(line);
                current = Some(name.to_string());
                continue;
            }
            let section = match current {
                Some(ref section) => section,
                None => {
                    return Err(AsmParseError::malformed(
                        line,
                        text,
                        "entry found before any section header",
                    ))
                }
            };
            let (key, value) = match text.find([':', '=']) {
                Some(split) => (text[..split].trim(), text[split + 1..].trim()),
                None => (text, ""),
            };
            if key.is_empty() {
                return Err(AsmParseError::malformed(line, text, "entry has no key"));
            }
            sections
                .sections
                .entry(section.clone())
                .or_default()
                .push(Entry {
                    key: key.to_string(),
                    value: value.to_string(),
                    line,
                });
        }
        Ok(sections)
    }

    /// All entries of a section, empty if the section is absent
    pub fn entries(&self, section: &str) -> &[Entry] {
        self.sections
            .get(section)
            .map(|entries| entries.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the section header appeared in the source
    pub fn contains(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Line of the section header, 0 if the section is absent
    pub fn header_line(&self, section: &str) -> usize {
        self.headers.get(section).copied().unwrap_or(0)
    }

    /// Last entry with `key` in `section` (later entries replace earlier ones)
    pub fn lookup(&self, section: &str, key: &str) -> Option<&Entry> {
        self.entries(section).iter().rev().find(|e| e.key == key)
    }

    /// Replace every `${Section:key}` (or `${key}`, which refers to `Variables`) in `value`
    pub fn interpolate(&self, value: &str, line: usize) -> Result<String, AsmParseError> {
        self.interpolate_depth(value, line, 0)
    }

    fn interpolate_depth(
        &self,
        value: &str,
        line: usize,
        depth: usize,
    ) -> Result<String, AsmParseError> {
        if depth > MAX_INTERPOLATION_DEPTH {
            return Err(AsmParseError::malformed(
                line,
                value,
                "interpolation is too deeply nested (circular reference?)",
            ));
        }
        let mut result = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| {
                AsmParseError::malformed(line, &rest[start..], "unterminated reference")
            })?;
            let reference = &after[..end];
            let (section, key) = match reference.split_once(':') {
                Some((section, key)) => (section.trim(), key.trim()),
                None => ("Variables", reference.trim()),
            };
            let entry = self.lookup(section, key).ok_or_else(|| {
                AsmParseError::malformed(line, reference, "reference to an undefined value")
            })?;
            result.push_str(&self.interpolate_depth(&entry.value, line, depth + 1)?);
            rest = &after[end + 1..];
        }
        result.push_str(rest);
        Ok(result)
    }
}

/// Remove a `#` or `;` comment which is preceded by whitespace
fn strip_inline_comment(line: &str) -> &str {
    let mut previous_whitespace = false;
    for (index, c) in line.char_indices() {
        if previous_whitespace && (c == '#' || c == ';') {
            return &line[..index];
        }
        previous_whitespace = c.is_whitespace();
    }
    line
}
