use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::signature::Signature;
use crate::engine::type_ref::{Binding, TypeRef};
use crate::error::Result;

/// How a call site names its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// Unqualified call through an object; dispatches to the most-derived
    /// override of the signature.
    Virtual,

    /// Explicitly qualified `Class::method(...)`; pins the target to the
    /// named class's own declaration, bypassing dispatch.
    Qualified,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Virtual => write!(f, "virtual"),
            Self::Qualified => write!(f, "qualified"),
        }
    }
}

/// A call expression to resolve: a kind, a concrete receiver identity, and
/// the called signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub kind: CallKind,

    /// Identity of the receiver's static type. For a qualified call this is
    /// the class written before `::`.
    pub receiver: String,

    #[serde(flatten)]
    pub signature: Signature,
}

impl CallSite {
    pub fn new(kind: CallKind, receiver: impl Into<String>, signature: Signature) -> Self {
        Self {
            kind,
            receiver: receiver.into(),
            signature,
        }
    }
}

/// A call written inside a method body, as the front end reports it.
///
/// Unlike [`CallSite`] the receiver is a type expression: inside a template
/// body it may name a formal parameter (`T::ba()`), which only becomes a
/// resolvable class once the enclosing template is instantiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCall {
    pub kind: CallKind,

    pub receiver: TypeRef,

    #[serde(flatten)]
    pub signature: Signature,
}

impl MethodCall {
    pub fn new(kind: CallKind, receiver: TypeRef, signature: Signature) -> Self {
        Self {
            kind,
            receiver,
            signature,
        }
    }

    /// Rewrites the receiver through `binding`, turning parameter-bound calls
    /// into concrete ones.
    pub fn substitute(&self, binding: &Binding) -> Result<MethodCall> {
        Ok(Self {
            kind: self.kind,
            receiver: self.receiver.substitute(binding)?,
            signature: self.signature.clone(),
        })
    }

    /// A resolvable call site, once the receiver is fully concrete.
    pub fn to_call_site(&self) -> Option<CallSite> {
        if !self.receiver.is_concrete() {
            return None;
        }
        Some(CallSite::new(
            self.kind,
            self.receiver.to_string(),
            self.signature.clone(),
        ))
    }
}

/// The answer to a resolved call: which class's declaration of the signature
/// executes, with the declaration's own facts carried along for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Identity of the class whose body executes.
    pub owner: String,

    #[serde(flatten)]
    pub signature: Signature,

    #[serde(rename = "virtual")]
    pub is_virtual: bool,

    /// The base-class signature this declaration overrides, when the front
    /// end recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Signature>,

    /// Opaque body token (`file:line` or similar), passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}
