use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::engine::decl::MethodDecl;
use crate::engine::signature::Signature;
use crate::engine::table::DeclTable;
use crate::error::{Error, Result};

/// Index of a class node in the hierarchy graph.
///
/// Bases are held as node ids, so a class shared by several derived classes
/// (the diamond case) is one node with several incoming references, never a
/// copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Where a node came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Declared directly in the translation unit.
    Source,

    /// Synthesized by instantiating `template` with the named concrete
    /// arguments.
    Instantiated {
        template: String,
        args: Vec<String>,
    },
}

/// One class in the hierarchy: identity, direct bases in declaration order,
/// and its own method declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNode {
    pub name: String,
    pub bases: Vec<NodeId>,
    pub methods: Vec<MethodDecl>,
    pub origin: Origin,
}

impl ClassNode {
    /// This node's own declaration of `signature`, if any. Never consults
    /// bases.
    pub fn method(&self, signature: &Signature) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.signature == *signature)
    }
}

/// The inheritance graph of one translation unit: an arena of class nodes
/// plus an identity index. Source classes enter in registration order;
/// instantiated classes are appended as they are synthesized.
#[derive(Debug, Default)]
pub struct HierarchyGraph {
    nodes: Vec<ClassNode>,
    index: HashMap<String, NodeId>,
}

impl HierarchyGraph {
    /// Materializes the graph for every class in `table`: first a node per
    /// class in registration order, then base wiring, then a cycle check.
    /// A base naming an unregistered identity fails the build.
    pub fn build(table: &DeclTable) -> Result<Self> {
        let mut graph = Self::default();

        for decl in table.classes() {
            let id = NodeId(graph.nodes.len());
            graph.index.insert(decl.name.clone(), id);
            graph.nodes.push(ClassNode {
                name: decl.name.clone(),
                bases: vec![],
                methods: decl.methods.clone(),
                origin: Origin::Source,
            });
        }

        for (idx, decl) in table.classes().enumerate() {
            let bases = decl
                .bases
                .iter()
                .map(|base| graph.lookup(base))
                .collect::<Result<Vec<_>>>()?;
            graph.nodes[idx].bases = bases;
        }

        graph.check_acyclic()?;
        debug!(classes = graph.nodes.len(), "hierarchy graph built");
        Ok(graph)
    }

    pub fn lookup(&self, name: &str) -> Result<NodeId> {
        self.get(name).ok_or_else(|| Error::not_found(name))
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node(&self, id: NodeId) -> &ClassNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of every node, oldest first. Synthesized nodes always follow the
    /// source nodes and the instances they themselves depend on.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Appends a synthesized node. The identity must be new; base ids must
    /// already exist, which keeps the graph acyclic by construction (edges
    /// only point at older nodes).
    pub(crate) fn add_node(&mut self, node: ClassNode) -> Result<NodeId> {
        if self.contains(&node.name) {
            return Err(Error::duplicate_declaration(&node.name));
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(node.name.clone(), id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Strict ancestors of `id` (excluding `id` itself), depth-first in base
    /// declaration order, each node yielded once at its first encounter.
    /// Deterministic for a given graph.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        let mut stack: Vec<NodeId> = self.node(id).bases.clone();
        stack.reverse();
        Ancestors {
            graph: self,
            stack,
            seen: HashSet::new(),
        }
    }

    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        for start in 0..self.nodes.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            marks[start] = Mark::InProgress;
            while let Some(frame) = stack.last_mut() {
                let (node, next) = *frame;
                if next < self.nodes[node].bases.len() {
                    frame.1 += 1;
                    let base = self.nodes[node].bases[next].0;
                    match marks[base] {
                        Mark::Unvisited => {
                            marks[base] = Mark::InProgress;
                            stack.push((base, 0));
                        }
                        Mark::InProgress => {
                            let from = stack
                                .iter()
                                .position(|&(n, _)| n == base)
                                .unwrap_or(0);
                            let mut cycle: Vec<String> = stack[from..]
                                .iter()
                                .map(|&(n, _)| self.nodes[n].name.clone())
                                .collect();
                            cycle.push(self.nodes[base].name.clone());
                            return Err(Error::cyclic_inheritance(cycle));
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }
        Ok(())
    }
}

/// Lazy depth-first walk over strict ancestors. See
/// [`HierarchyGraph::ancestors`].
pub struct Ancestors<'a> {
    graph: &'a HierarchyGraph,
    stack: Vec<NodeId>,
    seen: HashSet<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            if !self.seen.insert(id) {
                continue;
            }
            for &base in self.graph.node(id).bases.iter().rev() {
                if !self.seen.contains(&base) {
                    self.stack.push(base);
                }
            }
            return Some(id);
        }
        None
    }
}
