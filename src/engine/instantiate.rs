use std::collections::HashMap;
use tracing::{debug, trace};

use crate::engine::hierarchy::{ClassNode, HierarchyGraph, NodeId, Origin};
use crate::engine::table::DeclTable;
use crate::engine::type_ref::{Binding, TypeRef};
use crate::error::{Error, Result};

/// Hard cap on instantiation nesting. The in-flight stack catches mutually
/// dependent bases; the cap catches member calls that keep spawning deeper
/// argument nesting, which no finite stack re-entry ever exhibits.
const MAX_INSTANTIATION_DEPTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InstKey {
    template: String,
    args: Vec<String>,
}

impl InstKey {
    fn display(&self) -> String {
        format!("{}<{}>", self.template, self.args.join(", "))
    }
}

fn display_request(template: &str, args: &[TypeRef]) -> String {
    let rendered: Vec<String> = args.iter().map(TypeRef::to_string).collect();
    format!("{}<{}>", template, rendered.join(", "))
}

/// Memoized template instantiation over one hierarchy graph.
///
/// Instantiating `(template, args)` resolves every argument to a concrete
/// class, synthesizes a class node named `Template<Arg1, Arg2>` with the
/// formal parameters substituted away, wires its bases (instantiating
/// parameterized bases first), and publishes it to the graph. The same
/// request always returns the same node, and failed synthesis publishes
/// nothing. Instances reached only through member-call receivers are
/// materialized after publication; a failure there fails the request but
/// leaves already-published nodes in place.
#[derive(Debug, Default)]
pub struct InstantiationIndex {
    cache: HashMap<InstKey, NodeId>,
    in_flight: Vec<InstKey>,
}

impl InstantiationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instantiate(
        &mut self,
        table: &DeclTable,
        graph: &mut HierarchyGraph,
        template: &str,
        args: &[TypeRef],
    ) -> Result<NodeId> {
        self.instantiate_at(table, graph, template, args, 0)
    }

    fn instantiate_at(
        &mut self,
        table: &DeclTable,
        graph: &mut HierarchyGraph,
        template: &str,
        args: &[TypeRef],
        depth: usize,
    ) -> Result<NodeId> {
        if depth >= MAX_INSTANTIATION_DEPTH {
            let mut stack = self.pending();
            stack.push(display_request(template, args));
            return Err(Error::instantiation_cycle(stack));
        }

        let mut arg_names = Vec::with_capacity(args.len());
        for arg in args {
            arg_names.push(self.resolve_arg(table, graph, template, arg, depth)?);
        }
        let key = InstKey {
            template: template.to_string(),
            args: arg_names,
        };

        if let Some(&id) = self.cache.get(&key) {
            trace!(instance = %key.display(), "instantiation cache hit");
            return Ok(id);
        }

        // An identity already in the graph (a specialization the unit
        // declared directly) is reused, never rebuilt.
        let name = key.display();
        if let Some(id) = graph.get(&name) {
            trace!(instance = %name, "existing declaration reused");
            self.cache.insert(key, id);
            return Ok(id);
        }

        if self.in_flight.contains(&key) {
            let from = self
                .in_flight
                .iter()
                .position(|k| k == &key)
                .unwrap_or(0);
            let mut stack: Vec<String> =
                self.in_flight[from..].iter().map(InstKey::display).collect();
            stack.push(name);
            return Err(Error::instantiation_cycle(stack));
        }

        self.in_flight.push(key.clone());
        let synthesized = self.synthesize(table, graph, &key, depth);
        self.in_flight.pop();
        let id = synthesized?;

        // Members may call through instances of their own; materialize those
        // after the node is published so mutual references hit the cache.
        let member_instances: Vec<(String, Vec<TypeRef>)> = graph
            .node(id)
            .methods
            .iter()
            .flat_map(|m| m.calls.iter())
            .filter_map(|call| match &call.receiver {
                TypeRef::Instance { template, args } => {
                    Some((template.clone(), args.clone()))
                }
                _ => None,
            })
            .collect();
        for (inner_template, inner_args) in member_instances {
            self.instantiate_at(table, graph, &inner_template, &inner_args, depth + 1)?;
        }

        Ok(id)
    }

    fn synthesize(
        &mut self,
        table: &DeclTable,
        graph: &mut HierarchyGraph,
        key: &InstKey,
        depth: usize,
    ) -> Result<NodeId> {
        let decl = table.template(&key.template)?;
        if decl.params.len() != key.args.len() {
            return Err(Error::arity_mismatch(
                &key.template,
                decl.params.len(),
                key.args.len(),
            ));
        }
        let binding = Binding::new(&key.template, &decl.params, &key.args);

        let mut bases = Vec::with_capacity(decl.bases.len());
        for base in &decl.bases {
            let substituted = base.substitute(&binding)?;
            bases.push(self.resolve_base(table, graph, &key.template, &substituted, depth)?);
        }

        let methods = decl
            .methods
            .iter()
            .map(|m| m.substitute(&binding))
            .collect::<Result<Vec<_>>>()?;
        debug_assert!(methods
            .iter()
            .flat_map(|m| m.calls.iter())
            .all(|call| call.receiver.is_concrete()));

        let node = ClassNode {
            name: key.display(),
            bases,
            methods,
            origin: Origin::Instantiated {
                template: key.template.clone(),
                args: key.args.clone(),
            },
        };
        let id = graph.add_node(node)?;
        self.cache.insert(key.clone(), id);
        debug!(instance = %key.display(), "template instantiated");
        Ok(id)
    }

    /// Resolves one instantiation argument to a concrete class identity.
    fn resolve_arg(
        &mut self,
        table: &DeclTable,
        graph: &mut HierarchyGraph,
        context: &str,
        arg: &TypeRef,
        depth: usize,
    ) -> Result<String> {
        match arg {
            TypeRef::Class(name) => {
                graph.lookup(name)?;
                Ok(name.clone())
            }
            TypeRef::Instance { template, args } => {
                let id = self.instantiate_at(table, graph, template, args, depth + 1)?;
                Ok(graph.node(id).name.clone())
            }
            TypeRef::Param(param) => Err(Error::unbound_parameter(context, param)),
        }
    }

    fn resolve_base(
        &mut self,
        table: &DeclTable,
        graph: &mut HierarchyGraph,
        context: &str,
        base: &TypeRef,
        depth: usize,
    ) -> Result<NodeId> {
        match base {
            TypeRef::Class(name) => graph.lookup(name),
            TypeRef::Instance { template, args } => {
                self.instantiate_at(table, graph, template, args, depth + 1)
            }
            TypeRef::Param(param) => Err(Error::unbound_parameter(context, param)),
        }
    }

    fn pending(&self) -> Vec<String> {
        self.in_flight.iter().map(InstKey::display).collect()
    }
}
