//! Localized Text Table (spec §4.3). Grounded verbatim in
//! `original_source/sandrock/lib/text.py`'s `_TextEngine`/`_WikiTextEngine`:
//! per-language tables, a multi-language concatenation mode, and a
//! single-pass literal-substitution table applied after lookup.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Deserialize;

use crate::error::AtlasError;
use crate::helpers::FnvHashMap;

/// The fixed substitution table from `text.py::_substitutions`. Order
/// matters only in that longer keys should not be shadowed by shorter
/// ones; none of these happen to overlap, so a left-to-right scan is
/// sufficient for the "single pass" contract in spec §4.3.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("<color=#00ff78>", "{{textcolor|green|"),
    ("<color=#3aa964>", "{{textcolor|green|"),
    ("</color>", "}}"),
    ("[ChildCallPlayer]", "''Parent Name''"),
    ("[MarriageCall|Name]", "''Pet Name''"),
    ("[NpcName|8121]", "''Child 1''"),
    ("[NpcName|8122]", "''Child 2''"),
    ("[Player|Name]", "''Player''"),
];

/// Applies every substitution in a single left-to-right scan, so that a
/// replacement's own output is never itself re-scanned for matches (true
/// single-pass semantics, unlike chained `String::replace` calls).
pub fn substitute(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    'outer: while !rest.is_empty() {
        for (pattern, replacement) in SUBSTITUTIONS {
            if let Some(tail) = rest.strip_prefix(pattern) {
                output.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        let c = chars.next().expect("rest is non-empty");
        output.push(c);
        rest = chars.as_str();
    }
    output
}

#[derive(Debug, Deserialize)]
struct TextRecord {
    id: i64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct TextFile {
    #[serde(rename = "configList")]
    config_list: Vec<TextRecord>,
}

/// Holds the per-language text maps for every language configured, keyed
/// by the language's display name (e.g. `"English"`), loaded lazily and
/// memoized — matching `load_text`'s `@cache` decorator.
pub struct Localization {
    root: PathBuf,
    languages: Vec<String>,
    language_codes: Vec<String>,
    tables: Mutex<FnvHashMap<String, FnvHashMap<i64, String>>>,
}

impl Localization {
    pub fn new(localization_root: impl Into<PathBuf>, languages: Vec<String>, language_codes: Vec<String>) -> Localization {
        Localization { root: localization_root.into(), languages, language_codes, tables: Mutex::new(FnvHashMap::default()) }
    }

    fn path_for(&self, language: &str) -> PathBuf {
        self.root.join(language).join("text.json")
    }

    fn load_language(&self, language: &str) -> Result<(), AtlasError> {
        if self.tables.lock().expect("localization cache poisoned").contains_key(language) {
            return Ok(());
        }
        let path = self.path_for(language);
        let text = std::fs::read_to_string(&path).map_err(|_| AtlasError::AssetNotFound { path: path.clone() })?;
        let parsed: TextFile = serde_json::from_str(&text).map_err(|e| AtlasError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let map: FnvHashMap<i64, String> = parsed.config_list.into_iter().map(|r| (r.id, r.text)).collect();
        self.tables.lock().expect("localization cache poisoned").insert(language.to_string(), map);
        Ok(())
    }

    /// `text(text_id, language=None, sep="  ")`: when `language` is `None`,
    /// concatenates every configured language's rendering of `text_id`
    /// (skipping languages with no entry), joined by `sep`, then runs the
    /// substitution pass. When `language` matches a configured language
    /// name or code, only that language's rendering is used.
    pub fn text(&self, text_id: i64, language: Option<&str>, sep: &str) -> Result<String, AtlasError> {
        let mut parts = Vec::new();
        for (lang, code) in self.languages.iter().zip(self.language_codes.iter()) {
            if let Some(requested) = language {
                if requested != lang && requested != code {
                    continue;
                }
            }
            self.load_language(lang)?;
            let tables = self.tables.lock().expect("localization cache poisoned");
            if let Some(s) = tables.get(lang).and_then(|table| table.get(&text_id)) {
                parts.push(s.clone());
            }
        }
        Ok(substitute(&parts.join(sep)))
    }

    /// Convenience for the common single-language case.
    pub fn text_in(&self, text_id: i64, language: &str) -> Result<String, AtlasError> {
        self.text(text_id, Some(language), "  ")
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_language(dir: &Path, lang: &str, entries: &[(i64, &str)]) {
        let lang_dir = dir.join(lang);
        std::fs::create_dir_all(&lang_dir).unwrap();
        let config_list: Vec<_> = entries.iter().map(|(id, text)| format!(r#"{{"id":{id},"text":"{text}"}}"#)).collect();
        std::fs::write(lang_dir.join("text.json"), format!(r#"{{"configList":[{}]}}"#, config_list.join(","))).unwrap();
    }

    #[test]
    fn substitution_is_applied_after_lookup() {
        assert_eq!(substitute("[Player|Name] says hi"), "''Player'' says hi");
        assert_eq!(substitute("<color=#00ff78>green</color>"), "{{textcolor|green|green}}");
    }

    #[test]
    fn single_language_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write_language(dir.path(), "English", &[(1, "Hello")]);
        let loc = Localization::new(dir.path(), vec!["English".to_string()], vec!["en".to_string()]);
        assert_eq!(loc.text_in(1, "English").unwrap(), "Hello");
    }

    #[test]
    fn multi_language_concatenation_joins_with_separator() {
        let dir = tempfile::tempdir().unwrap();
        write_language(dir.path(), "English", &[(1, "Hello")]);
        write_language(dir.path(), "Chinese", &[(1, "Ni Hao")]);
        let loc = Localization::new(
            dir.path(),
            vec!["English".to_string(), "Chinese".to_string()],
            vec!["en".to_string(), "zh".to_string()],
        );
        assert_eq!(loc.text(1, None, "  ").unwrap(), "Hello  Ni Hao");
    }

    #[test]
    fn missing_entry_in_one_language_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_language(dir.path(), "English", &[(1, "Hello")]);
        write_language(dir.path(), "Chinese", &[(2, "Something else")]);
        let loc = Localization::new(
            dir.path(),
            vec!["English".to_string(), "Chinese".to_string()],
            vec!["en".to_string(), "zh".to_string()],
        );
        assert_eq!(loc.text(1, None, "  ").unwrap(), "Hello");
    }
}
