use serde::{Deserialize, Serialize};

use crate::engine::call::{MethodCall, Resolution};
use crate::engine::signature::Signature;
use crate::engine::type_ref::{Binding, TypeRef};
use crate::error::Result;

/// One method declaration as the front end reports it. The body itself stays
/// opaque; only the outgoing calls the front end extracted from it are
/// carried, because template bodies may call through formal parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    #[serde(flatten)]
    pub signature: Signature,

    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,

    /// Base-class signature this declaration overrides, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Signature>,

    /// Opaque body token (`file:line` or similar).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Calls written in the body, receivers as type expressions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<MethodCall>,
}

impl MethodDecl {
    pub fn new(signature: Signature) -> Self {
        Self {
            signature,
            is_virtual: false,
            overrides: None,
            body: None,
            calls: vec![],
        }
    }

    /// Rewrites the declaration for one instantiation: call receivers go
    /// through structural substitution, signature texts through exact-match
    /// replacement of formal parameter names.
    pub fn substitute(&self, binding: &Binding) -> Result<MethodDecl> {
        let calls = self
            .calls
            .iter()
            .map(|call| call.substitute(binding))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            signature: substitute_signature(&self.signature, binding),
            is_virtual: self.is_virtual,
            overrides: self
                .overrides
                .as_ref()
                .map(|sig| substitute_signature(sig, binding)),
            body: self.body.clone(),
            calls,
        })
    }

    /// The reportable answer when this declaration is the resolved target.
    pub fn resolution(&self, owner: impl Into<String>) -> Resolution {
        Resolution {
            owner: owner.into(),
            signature: self.signature.clone(),
            is_virtual: self.is_virtual,
            overrides: self.overrides.clone(),
            body: self.body.clone(),
        }
    }
}

fn substitute_signature(signature: &Signature, binding: &Binding) -> Signature {
    let params = signature
        .params
        .iter()
        .map(|text| {
            binding
                .get(text)
                .map_or_else(|| text.clone(), str::to_string)
        })
        .collect();
    Signature::new(signature.name.clone(), params)
}

/// A concrete (non-template) class declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,

    /// Direct base identities in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: vec![],
            methods: vec![],
        }
    }
}

/// A class template declaration. Bases are type expressions because a
/// template may derive from another template applied to its own parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDecl {
    pub name: String,

    /// Formal parameter names in declaration order.
    pub params: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<TypeRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDecl>,
}
