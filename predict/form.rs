//! Submitted form data: a flat map from field name to raw string.

use super::PredictError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses an `application/x-www-form-urlencoded` body. A repeated key keeps its last
    /// value.
    pub fn from_urlencoded(body: &str) -> Self {
        Self::from_pairs(
            form_urlencoded::parse(body.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Parses command-line style `FIELD=VALUE` assignments.
    pub fn from_assignments<S: AsRef<str>>(assignments: &[S]) -> Result<Self, PredictError> {
        let mut form = Self::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (key, value) = assignment
                .split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .ok_or_else(|| PredictError::MalformedAssignment(assignment.to_string()))?;
            form.insert(key.trim(), value);
        }
        Ok(form)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The value of a field that must be present.
    pub fn require(&self, key: &str) -> Result<&str, PredictError> {
        self.get(key)
            .ok_or_else(|| PredictError::MissingField(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_urlencoded_bodies() {
        let form = FormData::from_urlencoded("Age=65&ChestPainType=ASY&RestingECG=ST&note=a+b%26c");
        assert_eq!(form.get("Age"), Some("65"));
        assert_eq!(form.get("note"), Some("a b&c"));
        assert_eq!(form.len(), 4);
    }

    #[test]
    fn parses_assignments() {
        let form = FormData::from_assignments(&["Age=65", "Oldpeak=2.5", "Sex="]).unwrap();
        assert_eq!(form.get("Oldpeak"), Some("2.5"));
        assert_eq!(form.get("Sex"), Some(""));
        assert!(matches!(
            FormData::from_assignments(&["Age65"]),
            Err(PredictError::MalformedAssignment(_))
        ));
        assert!(FormData::from_assignments(&["=65"]).is_err());
    }

    #[test]
    fn missing_fields_are_errors() {
        let form = FormData::from_pairs([("Age", "65")]);
        assert_eq!(form.require("Age").unwrap(), "65");
        assert!(matches!(form.require("Sex"), Err(PredictError::MissingField(f)) if f == "Sex"));
    }
}
