// ============================================================
// Layer 3: Label Schemes and Annotation Records
// ============================================================
// A label scheme decides which attribute of a subject becomes
// the class name:
//
//   identity   -> the subject directory name itself ("01", "02", ...)
//   ethnicity  -> annotations.json["ethnicity"]
//   gender     -> annotations.json["gender"]
//
// Annotation records are free-form JSON objects. Values are
// rendered as strings because they end up as directory names.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// The attribute used to bucket subjects into classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelScheme {
    Identity,
    Ethnicity,
    Gender,
}

impl LabelScheme {
    /// Name used both as the annotation key and as the output directory
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelScheme::Identity => "identity",
            LabelScheme::Ethnicity => "ethnicity",
            LabelScheme::Gender => "gender",
        }
    }
}

impl fmt::Display for LabelScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "identity" => Ok(LabelScheme::Identity),
            "ethnicity" => Ok(LabelScheme::Ethnicity),
            "gender" => Ok(LabelScheme::Gender),
            other => bail!("unknown label scheme '{other}' (expected identity, ethnicity or gender)"),
        }
    }
}

// ─── Annotation ───────────────────────────────────────────────────────────────
/// One subject's annotation record, e.g. `{"gender": "m", "ethnicity": 1}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Annotation {
    fields: Map<String, Value>,
}

impl Annotation {
    /// Look up a field and render it as a label string.
    pub fn field(&self, key: &str) -> Result<String> {
        let value = self
            .fields
            .get(key)
            .ok_or_else(|| anyhow!("annotation has no '{key}' field"))?;

        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => bail!("annotation field '{key}' is not a scalar: {other}"),
        }
    }
}

/// Resolve the class label of a subject under `scheme`.
///
/// `identity` never consults the annotation, so subjects without the
/// other fields still partition cleanly under it.
pub fn resolve_label(scheme: LabelScheme, subject_dir: &str, annotation: &Annotation) -> Result<String> {
    match scheme {
        LabelScheme::Identity => Ok(subject_dir.to_string()),
        LabelScheme::Ethnicity | LabelScheme::Gender => annotation.field(scheme.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotation(v: Value) -> Annotation {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_identity_uses_directory_name() {
        let a = Annotation::default();
        assert_eq!(resolve_label(LabelScheme::Identity, "007", &a).unwrap(), "007");
    }

    #[test]
    fn test_numeric_field_is_rendered() {
        let a = annotation(json!({ "ethnicity": 3, "gender": "f" }));
        assert_eq!(resolve_label(LabelScheme::Ethnicity, "01", &a).unwrap(), "3");
        assert_eq!(resolve_label(LabelScheme::Gender, "01", &a).unwrap(), "f");
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let a = annotation(json!({ "gender": "m" }));
        assert!(resolve_label(LabelScheme::Ethnicity, "01", &a).is_err());
    }

    #[test]
    fn test_non_scalar_field_is_an_error() {
        let a = annotation(json!({ "gender": ["m"] }));
        assert!(a.field("gender").is_err());
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("Gender".parse::<LabelScheme>().unwrap(), LabelScheme::Gender);
        assert!("small".parse::<LabelScheme>().is_err());
    }
}
