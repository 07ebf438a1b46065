use thiserror::Error;

/// Errors produced while registering declarations, building the hierarchy,
/// instantiating templates, or resolving call sites.
///
/// Every failing operation leaves the session state exactly as it was before
/// the operation began; callers decide whether to stop or move on to the next
/// call site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown identity: {identity}")]
    NotFound { identity: String },

    #[error("duplicate declaration: {identity}")]
    DuplicateDeclaration { identity: String },

    #[error("cyclic inheritance: {}", .cycle.join(" -> "))]
    CyclicInheritance { cycle: Vec<String> },

    #[error("template instantiation cycle: {}", .stack.join(" -> "))]
    TemplateInstantiationCycle { stack: Vec<String> },

    #[error("template {template} expects {expected} argument(s), got {got}")]
    TemplateArityMismatch {
        template: String,
        expected: usize,
        got: usize,
    },

    #[error("unbound type parameter {param} in template {template}")]
    UnboundTypeParameter { template: String, param: String },

    #[error("ambiguous override of {signature} on {receiver}: {}", .candidates.join(", "))]
    AmbiguousOverride {
        receiver: String,
        signature: String,
        candidates: Vec<String>,
    },

    #[error("no declaration of {signature} on {receiver} or its ancestors")]
    MethodNotFound { receiver: String, signature: String },
}

impl Error {
    pub fn not_found(identity: impl Into<String>) -> Self {
        Self::NotFound {
            identity: identity.into(),
        }
    }

    pub fn duplicate_declaration(identity: impl Into<String>) -> Self {
        Self::DuplicateDeclaration {
            identity: identity.into(),
        }
    }

    pub fn cyclic_inheritance(cycle: Vec<String>) -> Self {
        Self::CyclicInheritance { cycle }
    }

    pub fn instantiation_cycle(stack: Vec<String>) -> Self {
        Self::TemplateInstantiationCycle { stack }
    }

    pub fn arity_mismatch(template: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::TemplateArityMismatch {
            template: template.into(),
            expected,
            got,
        }
    }

    pub fn unbound_parameter(template: impl Into<String>, param: impl Into<String>) -> Self {
        Self::UnboundTypeParameter {
            template: template.into(),
            param: param.into(),
        }
    }

    pub fn ambiguous_override(
        receiver: impl Into<String>,
        signature: impl Into<String>,
        candidates: Vec<String>,
    ) -> Self {
        Self::AmbiguousOverride {
            receiver: receiver.into(),
            signature: signature.into(),
            candidates,
        }
    }

    pub fn method_not_found(receiver: impl Into<String>, signature: impl Into<String>) -> Self {
        Self::MethodNotFound {
            receiver: receiver.into(),
            signature: signature.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
