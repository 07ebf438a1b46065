use std::collections::HashMap;
use tracing::debug;

use crate::engine::decl::{ClassDecl, TemplateDecl};
use crate::error::{Error, Result};

/// Registry of every class and template declaration in a translation unit,
/// keyed by identity. Classes and templates share one identity space, so a
/// template may not reuse a class name. Registration order is preserved;
/// everything downstream that iterates declarations sees it.
#[derive(Debug, Default)]
pub struct DeclTable {
    classes: Vec<ClassDecl>,
    templates: Vec<TemplateDecl>,
    class_index: HashMap<String, usize>,
    template_index: HashMap<String, usize>,
}

impl DeclTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a concrete class. Rejects an identity that is already
    /// taken, leaving the table unchanged.
    pub fn register_class(&mut self, decl: ClassDecl) -> Result<()> {
        if self.contains(&decl.name) {
            return Err(Error::duplicate_declaration(&decl.name));
        }
        debug!(class = %decl.name, bases = decl.bases.len(), "registered class");
        self.class_index.insert(decl.name.clone(), self.classes.len());
        self.classes.push(decl);
        Ok(())
    }

    /// Registers a class template under the same uniqueness rule.
    pub fn register_template(&mut self, decl: TemplateDecl) -> Result<()> {
        if self.contains(&decl.name) {
            return Err(Error::duplicate_declaration(&decl.name));
        }
        debug!(template = %decl.name, params = decl.params.len(), "registered template");
        self.template_index
            .insert(decl.name.clone(), self.templates.len());
        self.templates.push(decl);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.class_index.contains_key(name) || self.template_index.contains_key(name)
    }

    pub fn class(&self, name: &str) -> Result<&ClassDecl> {
        self.class_index
            .get(name)
            .map(|&idx| &self.classes[idx])
            .ok_or_else(|| Error::not_found(name))
    }

    pub fn template(&self, name: &str) -> Result<&TemplateDecl> {
        self.template_index
            .get(name)
            .map(|&idx| &self.templates[idx])
            .ok_or_else(|| Error::not_found(name))
    }

    /// Concrete classes in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.classes.iter()
    }
}
