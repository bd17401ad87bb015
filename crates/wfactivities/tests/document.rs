// crates/wfactivities/tests/document.rs

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wfactivities::{
    register_all, standard_descriptors, ActivityDocument, Sequence, WorkflowDocument, WriteLine,
};
use wfbuild::{flatten, ActivityTypeRegistry, BuilderServices, WorkflowBuilder};
use wfcore::{ActivationStrategy, Activity, BuildError, StructuralError};

const APPROVAL: &str = r#"{
    "definition_id": "approval",
    "version": 2,
    "name": "Approval",
    "activation_strategy": "singleton",
    "variables": [{ "name": "Approved", "type_name": "bool" }, {}],
    "outcomes": ["Approved", "Rejected"],
    "result": { "type_name": "bool" },
    "root": {
        "type": "Sequence",
        "activities": [
            { "type": "WriteLine", "text": "Request received" },
            {
                "type": "If",
                "condition": "amount > 1000",
                "then": {
                    "type": "Custom",
                    "activity_type": "acme.manager_review",
                    "variables": [{}],
                    "ports": [
                        { "kind": "single", "name": "OnTimeout", "child": { "type": "WriteLine", "text": "Escalating" } },
                        { "kind": "list", "name": "Reviewers", "children": [{ "type": "Break" }] }
                    ]
                },
                "else": { "type": "SetVariable", "variable": "Approved", "value": true }
            }
        ]
    }
}"#;

fn services() -> BuilderServices {
    BuilderServices::new(Arc::new(ActivityTypeRegistry::new()))
}

#[tokio::test]
async fn document_builds_into_a_workflow() {
    let document = WorkflowDocument::from_json(APPROVAL).unwrap();

    let workflow = WorkflowBuilder::new(services())
        .build_from_definition(&document, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(workflow.identity().definition_id, "approval");
    assert_eq!(workflow.identity().version, 2);
    assert_eq!(workflow.options().activation_strategy, ActivationStrategy::Singleton);
    // sequence, write line, if, review, write line, break, set variable
    assert_eq!(workflow.node_count(), 7);

    let names: Vec<_> = workflow
        .variables()
        .iter()
        .map(|v| v.name.clone().unwrap())
        .collect();
    assert_eq!(names, vec!["Approved", "Variable_0", "Variable_1"]);
    assert_eq!(
        workflow.result_variable().and_then(|v| v.name.as_deref()),
        Some("Variable_1")
    );

    let review = workflow
        .activity_ids()
        .filter_map(|id| workflow.find_activity(id))
        .find(|activity| activity.activity_type() == "acme.manager_review")
        .expect("custom activity should be in the workflow");
    let scope = review.variable_container().unwrap();
    assert_eq!(scope.variables()[0].name.as_deref(), Some("Variable_0"));
}

#[tokio::test]
async fn document_and_typed_tree_get_the_same_ids() {
    let json = r#"{
        "root": {
            "type": "Sequence",
            "activities": [
                { "type": "WriteLine", "text": "one" },
                { "type": "WriteLine", "text": "two" }
            ]
        }
    }"#;
    let document = WorkflowDocument::from_json(json).unwrap();
    let from_document = WorkflowBuilder::new(services())
        .build_from_definition(&document, &CancellationToken::new())
        .await
        .unwrap();

    let mut builder = WorkflowBuilder::new(services());
    builder.root(
        Sequence::new()
            .with_activity(WriteLine::new("something else"))
            .with_activity(WriteLine::new("entirely")),
    );
    let typed = builder.build(&CancellationToken::new()).await.unwrap();

    let ids = |workflow: &wfcore::Workflow| workflow.activity_ids().map(String::from).collect::<Vec<_>>();
    assert_eq!(ids(&from_document), ids(&typed));
}

#[tokio::test]
async fn null_list_entry_is_rejected() {
    let json = r#"{
        "root": {
            "type": "Custom",
            "activity_type": "acme.batch",
            "ports": [{ "kind": "list", "name": "Steps", "children": [null] }]
        }
    }"#;
    let document = WorkflowDocument::from_json(json).unwrap();

    let err = WorkflowBuilder::new(services())
        .build_from_definition(&document, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        BuildError::Structural(StructuralError::NullChild { port, ordinal, .. }) => {
            assert_eq!(port, "Steps");
            assert_eq!(ordinal, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_required_custom_port_is_rejected() {
    let json = r#"{
        "root": {
            "type": "Custom",
            "activity_type": "acme.retry",
            "ports": [{ "kind": "single", "name": "Body", "required": true }]
        }
    }"#;
    let document = WorkflowDocument::from_json(json).unwrap();

    let err = WorkflowBuilder::new(services())
        .build_from_definition(&document, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::Structural(StructuralError::MissingRequiredPort { .. })
    ));
}

#[tokio::test]
async fn publication_and_update_flags_are_forwarded() {
    let json = r#"{
        "is_published": true,
        "is_latest": false,
        "auto_update_consuming_workflows": true
    }"#;
    let document = WorkflowDocument::from_json(json).unwrap();

    let workflow = WorkflowBuilder::new(services())
        .build_from_definition(&document, &CancellationToken::new())
        .await
        .unwrap();

    assert!(workflow.publication().is_published);
    assert!(!workflow.publication().is_latest);
    assert!(workflow.options().auto_update_consuming_workflows);
}

#[tokio::test]
async fn omitted_flags_keep_builder_defaults() {
    let document = WorkflowDocument::from_json("{}").unwrap();

    let workflow = WorkflowBuilder::new(services())
        .build_from_definition(&document, &CancellationToken::new())
        .await
        .unwrap();

    assert!(workflow.publication().is_latest);
    assert!(!workflow.publication().is_published);
    assert!(!workflow.options().auto_update_consuming_workflows);
}

#[test]
fn documents_round_trip_through_json() {
    let document = WorkflowDocument::from_json(APPROVAL).unwrap();
    let json = document.to_json_pretty().unwrap();
    assert_eq!(WorkflowDocument::from_json(&json).unwrap(), document);
}

#[test]
fn unknown_activity_kind_fails_to_parse() {
    let json = r#"{ "root": { "type": "Teleport" } }"#;
    assert!(WorkflowDocument::from_json(json).is_err());
}

#[test]
fn if_document_maps_else_branch() {
    let doc: ActivityDocument = serde_json::from_str(
        r#"{ "type": "If", "condition": "x", "else": { "type": "Break" } }"#,
    )
    .unwrap();
    let activity = doc.into_activity();
    let graph = flatten(activity.as_ref()).unwrap();

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.nodes()[1].path.to_string(), "/Else[0]");
}

#[tokio::test]
async fn standard_types_register_once() {
    let registry = ActivityTypeRegistry::new();

    let first = register_all(&registry).await.unwrap();
    let second = register_all(&registry).await.unwrap();

    assert_eq!(first.registered.len(), standard_descriptors().len());
    assert!(second.registered.is_empty());
    assert_eq!(second.already_known, standard_descriptors().len());
    assert_eq!(registry.len().await, 7);
}
