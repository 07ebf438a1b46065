//! Static call-target resolution for C++ class hierarchies and template
//! instantiations.
//!
//! The input is one declaration document per translation unit: the classes
//! and class templates a front end extracted, the template instantiations it
//! observed, and the call sites to resolve. For each call site the engine
//! determines which concrete method body executes: unqualified virtual calls
//! dispatch to the most-derived override of the receiver, qualified
//! `Class::method(...)` calls pin the named class's own declaration, and
//! calls written against template parameters become ordinary qualified calls
//! once the enclosing template is instantiated.
//!
//! [`Session`] ties the pieces together for one unit; [`loader`] and
//! [`report`] are the thin document/report layer the `callbind` binary is
//! built from.

pub mod cli;
pub mod engine;
pub mod error;
pub mod loader;
pub mod logging;
pub mod report;

pub use engine::{CallKind, CallSite, Resolution, Session};
pub use error::{Error, Result};
