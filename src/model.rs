//! Typed model assertions built from a parsed [`Config`] (§4.2).

use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::ModelError;

/// One named entry in a model section with its comma-split token list, plus
/// the raw value (matchers and effect expressions are not comma-split).
#[derive(Debug, Clone)]
pub struct Assertion {
    pub key: String,
    pub tokens: Vec<String>,
    pub value: String,
}

/// The fully-typed representation of a model file: request/policy/role
/// definitions, the policy-effect expression, and the matcher expressions.
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct Model {
    pub request_defs: BTreeMap<String, Assertion>,
    pub policy_defs: BTreeMap<String, Assertion>,
    pub role_defs: BTreeMap<String, Assertion>,
    pub effect_defs: BTreeMap<String, Assertion>,
    pub matcher_defs: BTreeMap<String, Assertion>,
}

const REQUEST_SECTION: &str = "request_definition";
const POLICY_SECTION: &str = "policy_definition";
const ROLE_SECTION: &str = "role_definition";
const EFFECT_SECTION: &str = "policy_effect";
const MATCHER_SECTION: &str = "matchers";

impl Model {
    pub fn from_config(config: &Config) -> Result<Self, ModelError> {
        let request_defs = split_section(config, REQUEST_SECTION, true)?;
        let policy_defs = split_section(config, POLICY_SECTION, true)?;
        let role_defs = split_section(config, ROLE_SECTION, false)?;
        let effect_defs = whole_value_section(config, EFFECT_SECTION, true)?;
        let matcher_defs = whole_value_section(config, MATCHER_SECTION, true)?;

        let model = Self {
            request_defs,
            policy_defs,
            role_defs,
            effect_defs,
            matcher_defs,
        };
        model.validate_field_references()?;
        Ok(model)
    }

    pub fn from_str(text: &str) -> Result<Self, ModelError> {
        let config = Config::parse(text)?;
        Self::from_config(&config)
    }

    /// Field names declared for a request type, e.g. `r` → `["sub","obj","act"]`.
    pub fn request_fields(&self, name: &str) -> Option<&[String]> {
        self.request_defs.get(name).map(|a| a.tokens.as_slice())
    }

    /// Field names declared for a policy type. A trailing `eft` field is a
    /// convention, not a separate concept.
    pub fn policy_fields(&self, name: &str) -> Option<&[String]> {
        self.policy_defs.get(name).map(|a| a.tokens.as_slice())
    }

    pub fn effect_expr(&self, name: &str) -> Option<&str> {
        self.effect_defs.get(name).map(|a| a.value.as_str())
    }

    pub fn matcher_expr(&self, name: &str) -> Option<&str> {
        self.matcher_defs.get(name).map(|a| a.value.as_str())
    }

    /// Arity (2 or 3) declared for a grouping/role type, e.g. `g = _, _`.
    pub fn role_arity(&self, name: &str) -> Option<usize> {
        self.role_defs.get(name).map(|a| a.tokens.len())
    }

    /// Every field reference in every declared matcher must resolve to a
    /// declared request or policy token (§3 invariant). Scans for `r.<tok>`
    /// and `p.<tok>`-shaped identifiers; this is intentionally a coarse
    /// textual check rather than a full parse, since a full parse happens
    /// again (and authoritatively) when the matcher is compiled by `expr`.
    fn validate_field_references(&self) -> Result<(), ModelError> {
        for (_, assertion) in self.matcher_defs.iter() {
            for ident in extract_dotted_idents(&assertion.value) {
                let mut parts = ident.splitn(2, '.');
                let Some(root) = parts.next() else { continue };
                let Some(field) = parts.next() else { continue };
                // Only the first dotted segment is the field name we can
                // validate against the model; deeper segments are bag
                // sub-fields resolved at evaluation time.
                let field = field.split('.').next().unwrap_or(field);

                let declared = match root {
                    "r" => self.request_defs.get("r").map(|a| a.tokens.contains(&field.to_string())),
                    "p" => self.policy_defs.get("p").map(|a| {
                        a.tokens.contains(&field.to_string()) || field == "eft"
                    }),
                    _ => None,
                };

                if let Some(false) = declared {
                    return Err(ModelError::UnresolvedField {
                        matcher: assertion.value.clone(),
                        field: ident,
                    });
                }
            }
        }
        Ok(())
    }
}

fn split_section(
    config: &Config,
    section: &'static str,
    required: bool,
) -> Result<BTreeMap<String, Assertion>, ModelError> {
    let Some(entries) = config.section(section) else {
        if required {
            return Err(ModelError::MissingSection(section));
        }
        return Ok(BTreeMap::new());
    };

    let mut out = BTreeMap::new();
    for (key, value) in entries {
        let tokens = value
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        out.insert(
            key.clone(),
            Assertion {
                key: key.clone(),
                tokens,
                value: value.clone(),
            },
        );
    }

    if required && !out.contains_key(default_key(section)) {
        return Err(ModelError::MissingSection(section));
    }

    Ok(out)
}

fn whole_value_section(
    config: &Config,
    section: &'static str,
    required: bool,
) -> Result<BTreeMap<String, Assertion>, ModelError> {
    let Some(entries) = config.section(section) else {
        if required {
            return Err(ModelError::MissingSection(section));
        }
        return Ok(BTreeMap::new());
    };

    let mut out = BTreeMap::new();
    for (key, value) in entries {
        out.insert(
            key.clone(),
            Assertion {
                key: key.clone(),
                tokens: Vec::new(),
                value: value.clone(),
            },
        );
    }

    if required && !out.contains_key(default_key(section)) {
        return Err(ModelError::MissingSection(section));
    }

    Ok(out)
}

fn default_key(section: &str) -> &'static str {
    match section {
        REQUEST_SECTION => "r",
        POLICY_SECTION => "p",
        EFFECT_SECTION => "e",
        MATCHER_SECTION => "m",
        _ => "",
    }
}

/// Extract `word(.word)+`-shaped dotted identifiers from a matcher string.
fn extract_dotted_idents(expr: &str) -> Vec<String> {
    let mut idents = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_alphanumeric() || c == '_' || c == '.' {
            current.push(c);
        } else {
            if current.contains('.') {
                idents.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
        i += 1;
    }
    if current.contains('.') {
        idents.push(current);
    }
    idents
}
