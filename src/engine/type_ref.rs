use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// A type expression as it appears in a declaration: a concrete class name,
/// a formal template parameter, or a template applied to argument types.
///
/// Serialized externally tagged, so unit documents read
/// `{"class": "Widget"}`, `{"param": "T"}` or
/// `{"instance": {"template": "Vec", "args": [...]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// A concrete class identity.
    Class(String),

    /// A formal template parameter, meaningful only inside a template body.
    Param(String),

    /// A template applied to arguments, possibly nested and possibly still
    /// mentioning formal parameters.
    Instance {
        template: String,
        args: Vec<TypeRef>,
    },
}

impl TypeRef {
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn instance(template: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self::Instance {
            template: template.into(),
            args,
        }
    }

    /// True once no formal parameter remains anywhere in the expression.
    pub fn is_concrete(&self) -> bool {
        match self {
            Self::Class(_) => true,
            Self::Param(_) => false,
            Self::Instance { args, .. } => args.iter().all(TypeRef::is_concrete),
        }
    }

    /// Replaces every formal parameter through `binding`, leaving class names
    /// and template heads untouched. Fails if the expression names a
    /// parameter the binding does not cover.
    pub fn substitute(&self, binding: &Binding) -> Result<TypeRef> {
        match self {
            Self::Class(name) => Ok(Self::Class(name.clone())),
            Self::Param(name) => binding.lookup(name).map(Self::Class),
            Self::Instance { template, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.substitute(binding))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Instance {
                    template: template.clone(),
                    args,
                })
            }
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) | Self::Param(name) => write!(f, "{name}"),
            Self::Instance { template, args } => {
                let args: Vec<String> = args.iter().map(TypeRef::to_string).collect();
                write!(f, "{}<{}>", template, args.join(", "))
            }
        }
    }
}

/// Maps a template's formal parameters to concrete class identities for one
/// instantiation.
#[derive(Debug)]
pub struct Binding<'a> {
    template: &'a str,
    map: HashMap<&'a str, String>,
}

impl<'a> Binding<'a> {
    /// Pairs `params` with the concrete identities in `concrete`, positionally.
    /// Callers check arity first; the lengths must already agree.
    pub fn new(template: &'a str, params: &'a [String], concrete: &[String]) -> Self {
        debug_assert_eq!(params.len(), concrete.len());
        let map = params
            .iter()
            .map(String::as_str)
            .zip(concrete.iter().cloned())
            .collect();
        Self { template, map }
    }

    fn lookup(&self, param: &str) -> Result<String> {
        self.map
            .get(param)
            .cloned()
            .ok_or_else(|| Error::unbound_parameter(self.template, param))
    }

    /// Exact-match lookup for opaque parameter-type text. Text that is not a
    /// formal parameter is not an error; it passes through unchanged.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }
}
