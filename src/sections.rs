//! Named content sections.
//!
//! Views render into sections (`main` by default); templates print them back
//! with the `section` trigger. Writes to the same name concatenate.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSections {
    sections: BTreeMap<String, String>,
}

impl ContentSections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append markup to `name`, creating the section if needed.
    pub fn append(&mut self, name: &str, markup: &str) {
        self.sections
            .entry(name.to_string())
            .or_default()
            .push_str(markup);
    }

    /// Accumulated markup, or `""` for a section nobody wrote to.
    pub fn get(&self, name: &str) -> &str {
        self.sections.get(name).map(String::as_str).unwrap_or("")
    }

    /// Like [`get`](Self::get) but distinguishes unset sections.
    pub fn try_get(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_concatenate() {
        let mut s = ContentSections::new();
        s.append("main", "<p>one</p>");
        s.append("main", "<p>two</p>");
        assert_eq!(s.get("main"), "<p>one</p><p>two</p>");
    }

    #[test]
    fn unset_section_reads_empty() {
        let s = ContentSections::new();
        assert_eq!(s.get("sidebar"), "");
        assert_eq!(s.try_get("sidebar"), None);
        assert!(!s.contains("sidebar"));
    }

    #[test]
    fn empty_write_still_creates_section() {
        let mut s = ContentSections::new();
        s.append("aside", "");
        assert_eq!(s.try_get("aside"), Some(""));
        assert_eq!(s.names().collect::<Vec<_>>(), vec!["aside"]);
    }
}
