// crates/wfbuild/tests/pipeline.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wfactivities::{
    Break, CustomActivity, CustomPort, Fork, If, JoinMode, Sequence, SetVariable, While, WriteLine,
};
use wfbuild::{
    flatten, ActivityTypeRegistry, BuilderServices, SequentialIdentifierGenerator,
    WorkflowBuilder, WorkflowBuilderFactory,
};
use wfcore::{
    ActivationStrategy, Activity, BuildError, StructuralError, StructuralPath, Variable, Workflow,
    EMPTY_COMPOSITE_TYPE,
};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

fn services(registry: &ActivityTypeRegistry) -> BuilderServices {
    BuilderServices::new(Arc::new(registry.clone()))
        .with_identifiers(Arc::new(SequentialIdentifierGenerator::new("wf-")))
}

/// sequence
///   while
///     fork
///       sequence (A): set variable, if (then: break)
///       sequence (B): three write lines
fn loop_with_fork(message: &str) -> Sequence {
    let branch_a = Sequence::new()
        .with_activity(SetVariable::new("counter", 1))
        .with_activity(If::new("counter > 3").with_then(Break::new()));
    let branch_b = Sequence::new()
        .with_activity(WriteLine::new(message))
        .with_activity(WriteLine::new("second"))
        .with_activity(WriteLine::new("third"));

    Sequence::new().with_activity(
        While::new("true").with_body(
            Fork::new()
                .with_join_mode(JoinMode::WaitAny)
                .with_branch(branch_a)
                .with_branch(branch_b),
        ),
    )
}

fn ids_by_path(workflow: &Workflow) -> BTreeMap<StructuralPath, String> {
    workflow
        .activity_ids()
        .map(|id| (workflow.path_of(id).unwrap().clone(), id.to_string()))
        .collect()
}

async fn build(root: Sequence) -> Result<Workflow, BuildError> {
    let registry = ActivityTypeRegistry::new();
    let mut builder = WorkflowBuilder::new(services(&registry));
    builder.root(root);
    builder.build(&CancellationToken::new()).await
}

#[test]
fn loop_with_fork_flattens_to_one_node_per_activity() {
    let root = loop_with_fork("hello");
    let graph = flatten(&root).unwrap();

    assert_eq!(graph.len(), 11);

    let types: Vec<&str> = graph.nodes().iter().map(|n| n.activity_type.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "control.sequence",
            "control.while",
            "control.fork",
            "control.sequence",
            "primitives.set_variable",
            "control.if",
            "control.break",
            "control.sequence",
            "console.write_line",
            "console.write_line",
            "console.write_line",
        ]
    );

    let paths: Vec<String> = graph.nodes().iter().map(|n| n.path.to_string()).collect();
    assert_eq!(paths[6], "/Activities[0]/Body[0]/Branches[0]/Activities[1]/Then[0]");
    assert_eq!(paths[10], "/Activities[0]/Body[0]/Branches[1]/Activities[2]");

    // Every non-root node has exactly one parent that precedes it
    for node in graph.nodes().iter().skip(1) {
        let parent = node.parent.expect("non-root node without parent");
        assert!(parent < node.index);
        assert_eq!(node.path.parent().as_ref(), Some(&graph.nodes()[parent].path));
    }
}

#[tokio::test]
async fn rebuilding_an_unchanged_tree_yields_identical_ids() {
    init_tracing();

    let first = build(loop_with_fork("hello")).await.unwrap();
    let second = build(loop_with_fork("hello")).await.unwrap();

    assert_eq!(first.node_count(), 11);
    assert_eq!(ids_by_path(&first), ids_by_path(&second));
}

#[tokio::test]
async fn changing_a_message_does_not_change_ids() {
    let first = build(loop_with_fork("hello")).await.unwrap();
    let second = build(loop_with_fork("a completely different message")).await.unwrap();

    assert_eq!(ids_by_path(&first), ids_by_path(&second));
}

#[tokio::test]
async fn ids_are_written_back_onto_activities() {
    let workflow = build(loop_with_fork("hello")).await.unwrap();

    for id in workflow.activity_ids() {
        let activity = workflow.find_activity(id).expect("id should resolve to an activity");
        assert_eq!(activity.id(), Some(id));
    }
    assert_eq!(workflow.root().id(), workflow.activity_ids().find(|id| {
        workflow.path_of(id).map(StructuralPath::is_root).unwrap_or(false)
    }));
}

#[tokio::test]
async fn explicit_id_is_kept() {
    let root = Sequence::new()
        .with_activity(WriteLine::new("one").with_id("X"))
        .with_activity(WriteLine::new("two"));

    let workflow = build(root).await.unwrap();
    let path = workflow.path_of("X").expect("explicit id should be indexed");
    assert_eq!(path.to_string(), "/Activities[0]");
    assert_eq!(workflow.find_activity("X").unwrap().activity_type(), "console.write_line");
}

#[tokio::test]
async fn duplicate_explicit_ids_fail_the_build() {
    let root = Sequence::new()
        .with_activity(WriteLine::new("one").with_id("X"))
        .with_activity(Fork::new().with_branch(WriteLine::new("two").with_id("X")));

    match build(root).await {
        Err(BuildError::DuplicateIdentity { id, first, second }) => {
            assert_eq!(id, "X");
            assert_eq!(first.to_string(), "/Activities[0]");
            assert_eq!(second.to_string(), "/Activities[1]/Branches[0]");
        }
        other => panic!("expected duplicate identity error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn unnamed_container_variables_are_named_in_order() {
    let root = Sequence::new()
        .with_variable(Variable::new())
        .with_variable(Variable::new())
        .with_variable(Variable::new());

    let workflow = build(root).await.unwrap();
    let root_id = workflow.root().id().unwrap().to_string();
    let names = variable_names(&workflow, &root_id);
    assert_eq!(names, vec!["Variable_0", "Variable_1", "Variable_2"]);
}

#[tokio::test]
async fn named_container_variables_are_left_alone() {
    let inner = Sequence::new()
        .with_id("inner")
        .with_variable(Variable::new())
        .with_variable(Variable::named("Total").with_type("int"))
        .with_variable(Variable::new().with_value(5));
    let root = Sequence::new().with_activity(inner);

    let workflow = build(root).await.unwrap();
    assert_eq!(variable_names(&workflow, "inner"), vec!["Variable_0", "Total", "Variable_1"]);
}

fn variable_names(workflow: &Workflow, activity_id: &str) -> Vec<String> {
    workflow
        .find_activity(activity_id)
        .and_then(|activity| activity.variable_container())
        .map(|container| {
            container
                .variables()
                .iter()
                .map(|v| v.name.clone().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn registering_the_same_types_twice_keeps_the_count() {
    let registry = ActivityTypeRegistry::new();
    let factory = WorkflowBuilderFactory::new(services(&registry));
    let cancel = CancellationToken::new();

    let mut builder = factory.create();
    builder.root(loop_with_fork("hello"));
    builder.build(&cancel).await.unwrap();
    let count = registry.len().await;
    assert_eq!(count, 7);

    let mut builder = factory.create();
    builder.root(loop_with_fork("hello"));
    builder.build(&cancel).await.unwrap();
    assert_eq!(registry.len().await, count);
}

#[tokio::test]
async fn missing_root_defaults_to_empty_composite() {
    let registry = ActivityTypeRegistry::new();
    let builder = WorkflowBuilder::new(services(&registry));

    let workflow = builder.build(&CancellationToken::new()).await.unwrap();

    assert_eq!(workflow.root().activity_type(), EMPTY_COMPOSITE_TYPE);
    assert_eq!(workflow.node_count(), 1);
    assert!(registry.contains(EMPTY_COMPOSITE_TYPE).await);
}

#[tokio::test]
async fn missing_identifiers_come_from_the_generator() {
    let registry = ActivityTypeRegistry::new();
    let mut builder = WorkflowBuilder::new(services(&registry));
    builder.name("Defaults");

    let workflow = builder.build(&CancellationToken::new()).await.unwrap();

    assert_eq!(workflow.identity().definition_id, "wf-1");
    assert_eq!(workflow.identity().id, "wf-2");
    assert_eq!(workflow.identity().version, 1);
    assert_eq!(workflow.metadata().name.as_deref(), Some("Defaults"));
}

#[tokio::test]
async fn configured_fields_are_carried_through() {
    let registry = ActivityTypeRegistry::new();
    let mut builder = WorkflowBuilder::new(services(&registry));
    builder
        .definition_id("orders")
        .id("orders-v3")
        .version(3)
        .published(true)
        .description("Process incoming orders")
        .outcome("Done")
        .custom_property("owner", "sales")
        .activation_strategy(ActivationStrategy::Singleton)
        .usable_as_activity(true)
        .input(wfcore::InputDefinition::new("OrderId").with_type("string").required())
        .output(wfcore::OutputDefinition::new("Total").with_type("decimal"))
        .root(Sequence::new());

    let workflow = builder.build(&CancellationToken::new()).await.unwrap();

    assert_eq!(workflow.identity().definition_id, "orders");
    assert_eq!(workflow.identity().id, "orders-v3");
    assert_eq!(workflow.identity().version, 3);
    assert!(workflow.publication().is_published);
    assert_eq!(workflow.outcomes().to_vec(), vec!["Done".to_string()]);
    assert_eq!(workflow.custom_properties()["owner"], serde_json::json!("sales"));
    assert_eq!(workflow.options().activation_strategy, ActivationStrategy::Singleton);
    assert!(workflow.options().usable_as_activity);
    assert_eq!(workflow.inputs()[0].name, "OrderId");
    assert_eq!(workflow.outputs()[0].name, "Total");
}

#[tokio::test]
async fn result_variable_is_named_and_wired() {
    let registry = ActivityTypeRegistry::new();
    let mut builder = WorkflowBuilder::new(services(&registry));
    builder
        .variable(Variable::named("Input"))
        .variable(Variable::new())
        .result(Variable::new().with_type("string"));

    let workflow = builder.build(&CancellationToken::new()).await.unwrap();

    let names: Vec<_> = workflow
        .variables()
        .iter()
        .map(|v| v.name.as_deref().unwrap())
        .collect();
    assert_eq!(names, vec!["Input", "Variable_0", "Variable_1"]);
    let result = workflow.result_variable().unwrap();
    assert_eq!(result.name.as_deref(), Some("Variable_1"));
    assert_eq!(result.type_name.as_deref(), Some("string"));
}

#[tokio::test]
async fn named_result_variable_reuses_existing_declaration() {
    let registry = ActivityTypeRegistry::new();
    let mut builder = WorkflowBuilder::new(services(&registry));
    builder
        .variable(Variable::named("Output").with_value("pending"))
        .result(Variable::named("Output"));

    let workflow = builder.build(&CancellationToken::new()).await.unwrap();

    assert_eq!(workflow.variables().len(), 1);
    assert_eq!(
        workflow.result_variable().and_then(|v| v.value.clone()),
        Some(serde_json::json!("pending"))
    );
}

#[tokio::test]
async fn loop_without_body_is_a_structural_error() {
    let registry = ActivityTypeRegistry::new();
    let mut builder = WorkflowBuilder::new(services(&registry));
    builder.root(Sequence::new().with_activity(While::new("true")));

    let err = builder.build(&CancellationToken::new()).await.unwrap_err();
    match err {
        BuildError::Structural(StructuralError::MissingRequiredPort { path, port, .. }) => {
            assert_eq!(path.to_string(), "/Activities[0]");
            assert_eq!(port, "Body");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Nothing was registered for a build that failed while flattening
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn empty_list_entry_is_a_structural_error() {
    let registry = ActivityTypeRegistry::new();
    let mut builder = WorkflowBuilder::new(services(&registry));
    builder.root(CustomActivity::new("acme.approval").with_port(
        "Steps",
        false,
        CustomPort::List(vec![Some(Box::new(WriteLine::new("ok")) as Box<dyn Activity>), None]),
    ));

    let err = builder.build(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(
        err,
        BuildError::Structural(StructuralError::NullChild { ordinal: 1, .. })
    ));
}

#[tokio::test]
async fn unregistrable_type_fails_the_build() {
    let registry = ActivityTypeRegistry::new();
    let mut builder = WorkflowBuilder::new(services(&registry));
    builder.root(Sequence::new().with_activity(CustomActivity::new("not a type name")));

    let err = builder.build(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, BuildError::Registration(_)));
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn identity_namespace_changes_derived_ids() {
    let registry = ActivityTypeRegistry::new();
    let cancel = CancellationToken::new();

    let mut builder = WorkflowBuilder::new(services(&registry));
    builder.root(loop_with_fork("hello"));
    let default_ns = builder.build(&cancel).await.unwrap();

    let options = wfbuild::BuilderOptions {
        identity_namespace: uuid::Uuid::nil(),
        ..Default::default()
    };
    let mut builder = WorkflowBuilder::new(services(&registry).with_options(options));
    builder.root(loop_with_fork("hello"));
    let nil_ns = builder.build(&cancel).await.unwrap();

    assert_ne!(ids_by_path(&default_ns), ids_by_path(&nil_ns));
}

#[tokio::test]
async fn port_names_resembling_paths_get_distinct_ids() {
    let inner = CustomActivity::new("acme.inner").with_port(
        "B",
        false,
        CustomPort::List(vec![Some(Box::new(WriteLine::new("nested")) as Box<dyn Activity>)]),
    );
    let root = CustomActivity::new("acme.outer")
        .with_port(
            "A",
            false,
            CustomPort::List(vec![Some(Box::new(inner) as Box<dyn Activity>)]),
        )
        .with_port(
            "A[0]/B",
            false,
            CustomPort::List(vec![Some(Box::new(WriteLine::new("flat")) as Box<dyn Activity>)]),
        );

    let registry = ActivityTypeRegistry::new();
    let mut builder = WorkflowBuilder::new(services(&registry));
    builder.root(root);
    let workflow = builder.build(&CancellationToken::new()).await.unwrap();

    assert_eq!(workflow.node_count(), 4);
    let write_lines: Vec<&str> = workflow
        .activity_ids()
        .filter(|id| {
            workflow
                .find_activity(id)
                .map(|activity| activity.activity_type() == "console.write_line")
                .unwrap_or(false)
        })
        .collect();
    assert_eq!(write_lines.len(), 2);
    assert_ne!(write_lines[0], write_lines[1]);
}
