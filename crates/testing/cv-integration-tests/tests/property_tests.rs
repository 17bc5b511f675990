//! Whole-pipeline properties: determinism, unique override targets,
//! return shape, transitive sealing and idempotent hiding

use cv_driver::{AnalysisOptions, analyze};
use cv_inherit::{DiagnosticKind, OverrideResolution};
use cv_integration_tests::{check, check_with, kinds, member_at, render};

const FIXTURES: [&str; 5] = [
    include_str!("fixtures/unimplemented_member.toml"),
    include_str!("fixtures/return_mismatch.toml"),
    include_str!("fixtures/sealed_indexer.toml"),
    include_str!("fixtures/collapsed_slots.toml"),
    include_str!("fixtures/library.toml"),
];

#[test]
fn test_results_do_not_depend_on_scheduling() {
    let sequential = AnalysisOptions {
        parallel: false,
        ..AnalysisOptions::default()
    };
    for fixture in FIXTURES {
        let parallel = check(fixture);
        let serial = check_with(fixture, &sequential);
        assert_eq!(render(&parallel), render(&serial));
        assert_eq!(parallel.result.overrides, serial.result.overrides);
        assert_eq!(parallel.result.implementation_maps, serial.result.implementation_maps);
    }
}

#[test]
fn test_reanalysis_is_idempotent() {
    for fixture in FIXTURES {
        let checked = check(fixture);
        let again = analyze(&checked.declarations.graph, &AnalysisOptions::default());
        assert_eq!(checked.result.diagnostics, again.diagnostics);
        assert_eq!(checked.result.hidden, again.hidden);
    }
}

#[test]
fn test_accepted_overrides_have_one_target() {
    for fixture in FIXTURES {
        let checked = check(fixture);
        for (member, resolution) in &checked.result.overrides {
            if let OverrideResolution::Accepted { base, .. } = resolution {
                assert_ne!(base, member);
                let graph = &checked.declarations.graph;
                assert_eq!(graph.member(*base).name, graph.member(*member).name);
            }
        }
    }
}

#[test]
fn test_collapsed_base_members_make_override_ambiguous() {
    let checked = check(
        r#"
        [[type]]
        name = "Base"
        type_params = ["T", "U"]
        [[type.member]]
        name = "M"
        params = ["T"]
        modifiers = ["virtual"]
        [[type.member]]
        name = "M"
        params = ["U"]
        modifiers = ["virtual"]

        [[type]]
        name = "Derived"
        base = "Base<int, int>"
        [[type.member]]
        name = "M"
        params = ["int"]
        modifiers = ["override"]
        "#,
    );
    assert_eq!(kinds(&checked), vec![DiagnosticKind::AmbigOverride]);
    let graph = &checked.declarations.graph;
    let resolution = checked.result.override_of(member_at(graph, "Derived", 0)).unwrap();
    assert!(!resolution.is_accepted());
}

#[test]
fn test_ref_return_is_shape_not_identity() {
    let checked = check(
        r#"
        [[type]]
        name = "Base"
        [[type.member]]
        name = "M"
        returns = "int"
        ref_return = true
        modifiers = ["virtual"]

        [[type]]
        name = "Derived"
        base = "Base"
        [[type.member]]
        name = "M"
        returns = "int"
        modifiers = ["override"]
        "#,
    );
    assert_eq!(kinds(&checked), vec![DiagnosticKind::CantChangeRefReturnOnOverride]);
    let graph = &checked.declarations.graph;
    let resolution = checked.result.override_of(member_at(graph, "Derived", 0)).unwrap();
    assert_eq!(resolution.target(), Some(member_at(graph, "Base", 0)));
}

#[test]
fn test_sealing_reaches_every_descendant() {
    let checked = check(include_str!("fixtures/sealed_indexer.toml"));
    let sealed: Vec<DiagnosticKind> = kinds(&checked)
        .into_iter()
        .filter(|kind| *kind == DiagnosticKind::CantOverrideSealed)
        .collect();
    assert_eq!(sealed.len(), 2);
}
