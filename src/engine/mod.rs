pub mod call;
pub mod decl;
pub mod hierarchy;
pub mod instantiate;
pub mod overrides;
pub mod signature;
pub mod table;
pub mod type_ref;

pub use call::{CallKind, CallSite, MethodCall, Resolution};
pub use decl::{ClassDecl, MethodDecl, TemplateDecl};
pub use hierarchy::{Ancestors, ClassNode, HierarchyGraph, NodeId, Origin};
pub use instantiate::InstantiationIndex;
pub use signature::Signature;
pub use table::DeclTable;
pub use type_ref::{Binding, TypeRef};

use tracing::trace;

use crate::error::{Error, Result};

/// Resolution state for one translation unit: the declaration table, the
/// hierarchy graph built from it, and the instantiation index that grows the
/// graph on demand.
///
/// Construction builds and validates the graph, so a session that exists is
/// safe to query. Resolution never mutates; only [`Session::instantiate`]
/// does, and a failed instantiation publishes nothing.
pub struct Session {
    table: DeclTable,
    graph: HierarchyGraph,
    index: InstantiationIndex,
}

impl Session {
    pub fn new(table: DeclTable) -> Result<Self> {
        let graph = HierarchyGraph::build(&table)?;
        Ok(Self {
            table,
            graph,
            index: InstantiationIndex::new(),
        })
    }

    pub fn graph(&self) -> &HierarchyGraph {
        &self.graph
    }

    /// Materializes `template` applied to `args`, returning the node of the
    /// synthesized (or previously synthesized) class.
    pub fn instantiate(&mut self, template: &str, args: &[TypeRef]) -> Result<NodeId> {
        self.index
            .instantiate(&self.table, &mut self.graph, template, args)
    }

    /// Determines which concrete method body a call site executes.
    pub fn resolve(&self, site: &CallSite) -> Result<Resolution> {
        let receiver = self.graph.lookup(&site.receiver)?;
        match site.kind {
            CallKind::Virtual => {
                overrides::resolve_virtual(&self.graph, receiver, &site.signature)
            }
            CallKind::Qualified => self.resolve_qualified(receiver, &site.signature),
        }
    }

    /// A qualified call names its target class explicitly; only that class's
    /// own declarations count, ancestors are never consulted.
    fn resolve_qualified(&self, receiver: NodeId, signature: &Signature) -> Result<Resolution> {
        let node = self.graph.node(receiver);
        let decl = node
            .method(signature)
            .ok_or_else(|| Error::method_not_found(&node.name, signature.to_string()))?;
        trace!(receiver = %node.name, signature = %signature, "qualified call resolved");
        Ok(decl.resolution(&node.name))
    }

    /// Call sites written in the bodies of `id`'s own methods, each labeled
    /// with its enclosing method. Receivers still naming a formal parameter
    /// (possible only on uninstantiated declarations) are skipped.
    pub fn node_call_sites(&self, id: NodeId) -> Vec<(String, CallSite)> {
        let node = self.graph.node(id);
        node.methods
            .iter()
            .flat_map(|method| {
                method
                    .calls
                    .iter()
                    .filter_map(MethodCall::to_call_site)
                    .map(move |site| (format!("{}::{}", node.name, method.signature), site))
            })
            .collect()
    }
}
