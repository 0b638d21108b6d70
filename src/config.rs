//! Sectioned INI-like model/config file parser (§4.1).

use std::collections::BTreeMap;

use crate::error::ModelError;

/// A parsed `section → key → raw_value` map.
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    pub fn section(&self, section: &str) -> Option<&BTreeMap<String, String>> {
        self.sections.get(section)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Parse a model file. Sections are `[name]`, entries are `key = value`,
    /// `;` and `#` start a comment (outside of quotes this grammar has no
    /// quoting so the whole rest of the line is dropped), and a value line
    /// with no `=` is treated as a continuation of the previous entry,
    /// joined with a single space. Unknown sections are kept, not rejected
    /// — only Model (§4.2) decides which sections matter.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current_section: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (lineno, raw_line) in text.lines().enumerate() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('[') {
                let Some(end) = line.find(']') else {
                    return Err(ModelError::MalformedLine(
                        lineno + 1,
                        "unterminated section header".to_string(),
                    ));
                };
                let name = line[1..end].trim().to_string();
                sections.entry(name.clone()).or_default();
                current_section = Some(name);
                last_key = None;
                continue;
            }

            let Some(section_name) = current_section.as_ref() else {
                return Err(ModelError::MalformedLine(
                    lineno + 1,
                    "entry outside of any section".to_string(),
                ));
            };

            if let Some(eq) = line.find('=') {
                let key = line[..eq].trim().to_string();
                let value = line[eq + 1..].trim().to_string();

                let section = sections.entry(section_name.clone()).or_default();
                if section.contains_key(&key) {
                    return Err(ModelError::DuplicateKey(key, section_name.clone()));
                }
                section.insert(key.clone(), value);
                last_key = Some(key);
            } else {
                // Continuation line: append to the previous entry's value.
                let Some(key) = last_key.clone() else {
                    return Err(ModelError::MalformedLine(
                        lineno + 1,
                        "continuation line with no preceding entry".to_string(),
                    ));
                };
                let section = sections.entry(section_name.clone()).or_default();
                if let Some(existing) = section.get_mut(&key) {
                    existing.push(' ');
                    existing.push_str(line);
                }
            }
        }

        Ok(Self { sections })
    }
}

fn strip_comment(line: &str) -> &str {
    for (i, c) in line.char_indices() {
        if c == ';' || c == '#' {
            return &line[..i];
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"
        [request_definition]
        r = sub, obj, act

        [policy_definition]
        p = sub, obj, act

        [policy_effect]
        e = some(where (p.eft == allow))

        [matchers]
        m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
    "#;

    #[test]
    fn parses_sections_and_keys() {
        let cfg = Config::parse(MODEL).unwrap();
        assert_eq!(cfg.get("request_definition", "r"), Some("sub, obj, act"));
        assert_eq!(
            cfg.get("policy_effect", "e"),
            Some("some(where (p.eft == allow))")
        );
    }

    #[test]
    fn rejects_duplicate_keys() {
        let text = "[request_definition]\nr = sub, obj\nr = sub, obj, act\n";
        let err = Config::parse(text).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateKey(_, _)));
    }

    #[test]
    fn strips_comments_and_ignores_blank_lines() {
        let text = "; leading comment\n[m]\n# another comment\nm = true\n\n";
        let cfg = Config::parse(text).unwrap();
        assert_eq!(cfg.get("m", "m"), Some("true"));
    }

    #[test]
    fn joins_continuation_lines() {
        let text = "[matchers]\nm = r.sub == p.sub &&\n    r.obj == p.obj\n";
        let cfg = Config::parse(text).unwrap();
        assert_eq!(cfg.get("matchers", "m"), Some("r.sub == p.sub && r.obj == p.obj"));
    }
}
