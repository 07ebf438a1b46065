use std::collections::{HashSet, VecDeque};
use tracing::trace;

use crate::engine::call::Resolution;
use crate::engine::hierarchy::{HierarchyGraph, NodeId};
use crate::engine::signature::Signature;
use crate::error::{Error, Result};

/// Resolves an unqualified virtual call on `start`: the executing body is the
/// most-derived declaration of `signature`, starting at the receiver itself
/// and walking outward through bases in declaration order.
///
/// Nodes are ranked by shortest inheritance distance from the receiver, each
/// distinct ancestor counted once however many inheritance paths reach it.
/// Two declarations at the same minimal distance (typically two direct bases
/// of a receiver that declares nothing itself) have no most-derived member
/// and resolve to an ambiguity error.
pub fn resolve_virtual(
    graph: &HierarchyGraph,
    start: NodeId,
    signature: &Signature,
) -> Result<Resolution> {
    let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut best_depth: Option<usize> = None;
    let mut candidates: Vec<NodeId> = Vec::new();

    queue.push_back((start, 0));
    seen.insert(start);

    while let Some((id, depth)) = queue.pop_front() {
        if let Some(best) = best_depth {
            if depth > best {
                break;
            }
        }
        if graph.node(id).method(signature).is_some() {
            best_depth = Some(depth);
            candidates.push(id);
            continue;
        }
        for &base in &graph.node(id).bases {
            if seen.insert(base) {
                queue.push_back((base, depth + 1));
            }
        }
    }

    let receiver = &graph.node(start).name;
    match candidates.as_slice() {
        [] => Err(Error::method_not_found(receiver, signature.to_string())),
        [winner] => {
            let node = graph.node(*winner);
            let decl = node
                .method(signature)
                .ok_or_else(|| Error::method_not_found(receiver, signature.to_string()))?;
            trace!(
                receiver = %receiver,
                signature = %signature,
                owner = %node.name,
                "virtual call resolved"
            );
            Ok(decl.resolution(&node.name))
        }
        many => {
            let names = many
                .iter()
                .map(|&id| graph.node(id).name.clone())
                .collect();
            Err(Error::ambiguous_override(
                receiver,
                signature.to_string(),
                names,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::decl::{ClassDecl, MethodDecl};
    use crate::engine::table::DeclTable;
    use pretty_assertions::assert_eq;

    fn class(name: &str, bases: &[&str], methods: &[&str]) -> ClassDecl {
        let mut decl = ClassDecl::new(name);
        decl.bases = bases.iter().map(|b| b.to_string()).collect();
        decl.methods = methods
            .iter()
            .map(|&m| {
                let mut method = MethodDecl::new(Signature::nullary(m));
                method.is_virtual = true;
                method.body = Some(format!("{name}.cpp:1"));
                method
            })
            .collect();
        decl
    }

    fn graph_of(decls: Vec<ClassDecl>) -> HierarchyGraph {
        let mut table = DeclTable::new();
        for decl in decls {
            table.register_class(decl).unwrap();
        }
        HierarchyGraph::build(&table).unwrap()
    }

    fn resolve(graph: &HierarchyGraph, receiver: &str, method: &str) -> Result<Resolution> {
        let id = graph.lookup(receiver).unwrap();
        resolve_virtual(graph, id, &Signature::nullary(method))
    }

    #[test]
    fn test_receiver_own_declaration_wins() {
        let graph = graph_of(vec![
            class("Base", &[], &["run"]),
            class("Derived", &["Base"], &["run"]),
        ]);
        let res = resolve(&graph, "Derived", "run").unwrap();
        assert_eq!(res.owner, "Derived");
    }

    #[test]
    fn test_inherited_declaration_found_one_level_up() {
        let graph = graph_of(vec![
            class("Base", &[], &["run"]),
            class("Derived", &["Base"], &[]),
        ]);
        let res = resolve(&graph, "Derived", "run").unwrap();
        assert_eq!(res.owner, "Base");
    }

    #[test]
    fn test_nearer_declaration_shadows_deeper() {
        let graph = graph_of(vec![
            class("Grand", &[], &["run"]),
            class("Parent", &["Grand"], &["run"]),
            class("Child", &["Parent"], &[]),
        ]);
        let res = resolve(&graph, "Child", "run").unwrap();
        assert_eq!(res.owner, "Parent");
    }

    #[test]
    fn test_nearer_branch_wins_over_earlier_deeper_one() {
        let graph = graph_of(vec![
            class("Far", &[], &["run"]),
            class("Left", &["Far"], &[]),
            class("Right", &[], &["run"]),
            class("Child", &["Left", "Right"], &[]),
        ]);
        let res = resolve(&graph, "Child", "run").unwrap();
        assert_eq!(res.owner, "Right");
    }

    #[test]
    fn test_equal_depth_parents_are_ambiguous() {
        let graph = graph_of(vec![
            class("Left", &[], &["run"]),
            class("Right", &[], &["run"]),
            class("Child", &["Left", "Right"], &[]),
        ]);
        let err = resolve(&graph, "Child", "run").unwrap_err();
        assert_eq!(
            err,
            Error::ambiguous_override(
                "Child",
                "run()",
                vec!["Left".to_string(), "Right".to_string()]
            )
        );
    }

    #[test]
    fn test_distinct_signatures_from_two_parents_resolve_independently() {
        let graph = graph_of(vec![
            class("Left", &[], &["add"]),
            class("Right", &[], &["sub"]),
            class("Child", &["Left", "Right"], &[]),
        ]);
        assert_eq!(resolve(&graph, "Child", "add").unwrap().owner, "Left");
        assert_eq!(resolve(&graph, "Child", "sub").unwrap().owner, "Right");
    }

    #[test]
    fn test_diamond_single_declarer_is_not_ambiguous() {
        let graph = graph_of(vec![
            class("Top", &[], &["run"]),
            class("Left", &["Top"], &[]),
            class("Right", &["Top"], &[]),
            class("Bottom", &["Left", "Right"], &[]),
        ]);
        let res = resolve(&graph, "Bottom", "run").unwrap();
        assert_eq!(res.owner, "Top");
    }

    #[test]
    fn test_absent_signature_everywhere() {
        let graph = graph_of(vec![
            class("Base", &[], &["run"]),
            class("Derived", &["Base"], &[]),
        ]);
        let err = resolve(&graph, "Derived", "walk").unwrap_err();
        assert_eq!(err, Error::method_not_found("Derived", "walk()"));
    }

    #[test]
    fn test_parameter_list_participates_in_matching() {
        let mut base = ClassDecl::new("Base");
        base.methods.push(MethodDecl::new(Signature::new(
            "add",
            vec!["int".to_string(), "int".to_string()],
        )));
        let derived = class("Derived", &["Base"], &[]);
        let graph = graph_of(vec![base, derived]);

        let id = graph.lookup("Derived").unwrap();
        let unary = Signature::new("add", vec!["int".to_string()]);
        let err = resolve_virtual(&graph, id, &unary).unwrap_err();
        assert_eq!(err, Error::method_not_found("Derived", "add(int)"));

        let binary = Signature::new("add", vec!["int".to_string(), "int".to_string()]);
        assert_eq!(
            resolve_virtual(&graph, id, &binary).unwrap().owner,
            "Base"
        );
    }
}
