//! End-to-end resolution over the C++ playground fixtures: load a unit
//! document, build the session, perform the observed instantiations, and
//! resolve every call down to the owning method body.

use std::path::PathBuf;

use callbind_core::engine::{CallSite, Session, Signature};
use callbind_core::loader::TranslationUnit;

fn load_fixture(name: &str) -> (TranslationUnit, Session) {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let unit = TranslationUnit::from_path(&path).expect("fixture should load");
    let session = unit.build_session().expect("session should build");
    (unit, session)
}

fn instantiate_all(unit: &TranslationUnit, session: &mut Session) {
    for request in &unit.instantiations {
        session
            .instantiate(&request.template, &request.args)
            .expect("requested instantiation should succeed");
    }
}

/// The `index`-th call written inside `owner`'s declaration of `method`,
/// as a resolvable site.
fn member_site(session: &Session, owner: &str, method: &Signature, index: usize) -> CallSite {
    let id = session.graph().lookup(owner).expect("owner should exist");
    let decl = session
        .graph()
        .node(id)
        .method(method)
        .expect("method should be declared");
    decl.calls[index]
        .to_call_site()
        .expect("member call should be concrete")
}

mod simple_cpp_classes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inheritance_chain_resolves_three_distinct_bodies() {
        let (unit, session) = load_fixture("inheritance_chain.json");
        let add = Signature::new("add", vec!["int".to_string(), "int".to_string()]);

        let entry = session.resolve(&unit.calls[0]).expect("virtual call");
        assert_eq!(entry.owner, "TestClass");
        assert_eq!(entry.body.as_deref(), Some("file.cpp:18"));
        assert!(entry.is_virtual);

        let up_one = session
            .resolve(&member_site(&session, "TestClass", &add, 0))
            .expect("qualified call one level up");
        assert_eq!(up_one.owner, "TestParentClass");
        assert_eq!(up_one.body.as_deref(), Some("file.cpp:11"));

        let up_two = session
            .resolve(&member_site(&session, "TestParentClass", &add, 0))
            .expect("qualified call two levels up");
        assert_eq!(up_two.owner, "TestGrandParentClass");
        assert_eq!(up_two.body.as_deref(), Some("file.cpp:4"));

        let owners = [entry.owner, up_one.owner, up_two.owner];
        let distinct: std::collections::HashSet<&String> = owners.iter().collect();
        assert_eq!(distinct.len(), 3, "each level delegates to a different body");
    }

    #[test]
    fn test_inheritance_chain_ancestor_order() {
        let (_, session) = load_fixture("inheritance_chain.json");
        let id = session.graph().lookup("TestClass").expect("TestClass");
        let ancestors: Vec<String> = session
            .graph()
            .ancestors(id)
            .map(|a| session.graph().node(a).name.clone())
            .collect();
        assert_eq!(ancestors, vec!["TestParentClass", "TestGrandParentClass"]);
    }

    #[test]
    fn test_two_parent_classes_resolve_independently() {
        let (unit, session) = load_fixture("two_parent_classes.json");

        let add = session.resolve(&unit.calls[0]).expect("add resolves");
        assert_eq!(add.owner, "TestBaseClass1");

        let sub = session.resolve(&unit.calls[1]).expect("sub resolves");
        assert_eq!(sub.owner, "TestBaseClass2");

        assert!(add.is_virtual);
        assert!(sub.is_virtual);
    }
}

mod simple_templates {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_double_template_resolves_each_parameter() {
        let (unit, mut session) = load_fixture("double_template_class.json");
        instantiate_all(&unit, &mut session);

        let instance = "TemplateClass<SimpleClassA, SimpleClassB>";
        assert!(session.graph().contains(instance));

        let entry = session.resolve(&unit.calls[0]).expect("static call");
        assert_eq!(entry.owner, instance);

        let foo = Signature::nullary("foo");
        let via_t = session
            .resolve(&member_site(&session, instance, &foo, 0))
            .expect("T::ba()");
        let via_k = session
            .resolve(&member_site(&session, instance, &foo, 1))
            .expect("K::ba()");
        assert_eq!(via_t.owner, "SimpleClassA");
        assert_eq!(via_k.owner, "SimpleClassB");
        assert_ne!(via_t.body, via_k.body);
    }

    #[test]
    fn test_synthesized_members_are_fully_concrete() {
        let (unit, mut session) = load_fixture("double_template_class.json");
        instantiate_all(&unit, &mut session);

        let id = session
            .graph()
            .lookup("TemplateClass<SimpleClassA, SimpleClassB>")
            .expect("instance");
        for method in &session.graph().node(id).methods {
            for call in &method.calls {
                assert!(
                    call.receiver.is_concrete(),
                    "no formal parameter may survive instantiation"
                );
            }
        }
    }

    #[test]
    fn test_template_inheritance_wires_parent_instance_as_base() {
        let (unit, mut session) = load_fixture("template_inheritance.json");
        instantiate_all(&unit, &mut session);

        let child = session
            .graph()
            .lookup("ChildTemplateClass<SimpleClass>")
            .expect("child instance");
        let parent = session
            .graph()
            .lookup("ParentTemplateClass<SimpleClass>")
            .expect("parent instance exists without its own request");
        assert_eq!(session.graph().node(child).bases, vec![parent]);
    }

    #[test]
    fn test_template_inheritance_full_call_chain() {
        let (unit, mut session) = load_fixture("template_inheritance.json");
        instantiate_all(&unit, &mut session);

        let entry = session.resolve(&unit.calls[0]).expect("c.foo()");
        assert_eq!(entry.owner, "ChildTemplateClass<SimpleClass>");

        let foo = Signature::nullary("foo");
        let foo_parent = session
            .resolve(&member_site(
                &session,
                "ChildTemplateClass<SimpleClass>",
                &foo,
                0,
            ))
            .expect("ParentTemplateClass<T>::fooParent()");
        assert_eq!(foo_parent.owner, "ParentTemplateClass<SimpleClass>");

        let foo_parent_sig = Signature::nullary("fooParent");
        let ba = session
            .resolve(&member_site(
                &session,
                "ParentTemplateClass<SimpleClass>",
                &foo_parent_sig,
                0,
            ))
            .expect("T::ba()");
        assert_eq!(ba.owner, "SimpleClass");
        assert_eq!(ba.body.as_deref(), Some("file.cpp:16"));
    }

    #[test]
    fn test_repeated_requests_reuse_instances() {
        let (unit, mut session) = load_fixture("template_inheritance.json");
        instantiate_all(&unit, &mut session);
        let first_len = session.graph().len();
        instantiate_all(&unit, &mut session);
        assert_eq!(session.graph().len(), first_len);
    }
}
