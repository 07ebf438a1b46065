use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a method within a class: its name plus the ordered list of
/// parameter-type texts. Two declarations with the same name but different
/// parameter lists are different signatures; return types never participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Method name, e.g. `add`.
    pub name: String,

    /// Parameter-type texts in declaration order, e.g. `["int", "int"]`.
    #[serde(default)]
    pub params: Vec<String>,
}

impl Signature {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Signature with an empty parameter list.
    pub fn nullary(name: impl Into<String>) -> Self {
        Self::new(name, vec![])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}
