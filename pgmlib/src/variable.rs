use serde::{Deserialize, Serialize};

use crate::{PgmError, Result};

/// Discrete random variable: a name, a description and an ordered list of labels.
///
/// Two variables are equal when they have the same name and the same labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscreteVariable {
    name: String,
    description: String,
    labels: Vec<String>,
}

impl PartialEq for DiscreteVariable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.labels == other.labels
    }
}
impl Eq for DiscreteVariable {}

impl DiscreteVariable {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        description: impl Into<String>,
        labels: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let name = name.into();
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(PgmError::Size(format!("variable {} has an empty domain", name)));
        }
        for (i, l) in labels.iter().enumerate() {
            if labels[..i].contains(l) {
                return Err(PgmError::InvalidArgument(format!(
                    "duplicate label {} in variable {}",
                    l, name
                )));
            }
        }
        Ok(Self {
            name,
            description: description.into(),
            labels,
        })
    }

    /// Variable with labels `"0"`, `"1"`, ..., `"n-1"`.
    pub fn with_domain_size(name: impl Into<String>, domain_size: usize) -> Result<Self> {
        Self::new(name, "", (0..domain_size).map(|i| i.to_string()))
    }

    /// Variable whose labels are the integers of `min..=max`.
    pub fn range(name: impl Into<String>, min: i64, max: i64) -> Result<Self> {
        if max < min {
            let name = name.into();
            return Err(PgmError::Size(format!("variable {} has an empty range", name)));
        }
        Self::new(name, "", (min..=max).map(|i| i.to_string()))
    }

    /// Boolean variable with labels `"false"` and `"true"`.
    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            labels: vec!["false".to_owned(), "true".to_owned()],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }
    pub fn domain_size(&self) -> usize {
        self.labels.len()
    }
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
    pub fn label(&self, index: usize) -> Result<&str> {
        self.labels
            .get(index)
            .map(|l| l.as_str())
            .ok_or_else(|| self.out_of_bounds(index))
    }
    pub fn index_of(&self, label: &str) -> Result<usize> {
        self.labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| PgmError::NotFound(format!("label {} of variable {}", label, self.name)))
    }
    pub(crate) fn out_of_bounds(&self, value: usize) -> PgmError {
        PgmError::OutOfBounds {
            var: self.name.clone(),
            value,
            domain_size: self.domain_size(),
        }
    }
}

impl std::fmt::Display for DiscreteVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}<{}>", self.name, self.labels.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_lookup() {
        let v = DiscreteVariable::new("weather", "", ["sun", "rain", "snow"]).unwrap();
        assert_eq!(v.domain_size(), 3);
        assert_eq!(v.index_of("rain").unwrap(), 1);
        assert!(matches!(v.index_of("fog"), Err(PgmError::NotFound(_))));
        assert!(matches!(v.label(3), Err(PgmError::OutOfBounds { .. })));
        assert_eq!(v.to_string(), "weather<sun,rain,snow>");
    }

    #[test]
    fn identity_ignores_description() {
        let mut a = DiscreteVariable::range("x", 1, 3).unwrap();
        a.set_description("first");
        let b = DiscreteVariable::new("x", "second", ["1", "2", "3"]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, DiscreteVariable::with_domain_size("x", 3).unwrap());
    }

    #[test]
    fn empty_domain() {
        assert!(DiscreteVariable::with_domain_size("x", 0).is_err());
        assert!(DiscreteVariable::new("x", "", ["a", "a"]).is_err());
    }
}
