use crate::{
    activity::resolve_path, Activity, InputDefinition, OutputDefinition, StructuralPath, Variable,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable result of a workflow build.
///
/// Every activity reachable from the root carries its final identifier and
/// every variable is named. The aggregate also keeps an id → path index so
/// persisted runtime state (bookmarks, variable values) can be matched back
/// to the activity it belongs to.
#[derive(Debug)]
pub struct Workflow {
    identity: WorkflowIdentity,
    publication: WorkflowPublication,
    metadata: WorkflowMetadata,
    options: WorkflowOptions,
    root: Box<dyn Activity>,
    variables: Vec<Variable>,
    inputs: Vec<InputDefinition>,
    outputs: Vec<OutputDefinition>,
    outcomes: Vec<String>,
    custom_properties: BTreeMap<String, serde_json::Value>,
    result_variable: Option<Variable>,
    activity_paths: BTreeMap<String, StructuralPath>,
}

/// Everything needed to assemble a [`Workflow`].
#[derive(Debug)]
pub struct WorkflowParts {
    pub identity: WorkflowIdentity,
    pub publication: WorkflowPublication,
    pub metadata: WorkflowMetadata,
    pub options: WorkflowOptions,
    pub root: Box<dyn Activity>,
    pub variables: Vec<Variable>,
    pub inputs: Vec<InputDefinition>,
    pub outputs: Vec<OutputDefinition>,
    pub outcomes: Vec<String>,
    pub custom_properties: BTreeMap<String, serde_json::Value>,
    pub result_variable: Option<Variable>,
    pub activity_paths: BTreeMap<String, StructuralPath>,
}

impl Workflow {
    /// Assemble the aggregate. Callers are expected to have run the full
    /// build pipeline over `parts.root` first.
    pub fn assemble(parts: WorkflowParts) -> Self {
        Self {
            identity: parts.identity,
            publication: parts.publication,
            metadata: parts.metadata,
            options: parts.options,
            root: parts.root,
            variables: parts.variables,
            inputs: parts.inputs,
            outputs: parts.outputs,
            outcomes: parts.outcomes,
            custom_properties: parts.custom_properties,
            result_variable: parts.result_variable,
            activity_paths: parts.activity_paths,
        }
    }

    pub fn identity(&self) -> &WorkflowIdentity {
        &self.identity
    }

    pub fn publication(&self) -> &WorkflowPublication {
        &self.publication
    }

    pub fn metadata(&self) -> &WorkflowMetadata {
        &self.metadata
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    pub fn root(&self) -> &dyn Activity {
        self.root.as_ref()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn inputs(&self) -> &[InputDefinition] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputDefinition] {
        &self.outputs
    }

    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    pub fn custom_properties(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.custom_properties
    }

    pub fn result_variable(&self) -> Option<&Variable> {
        self.result_variable.as_ref()
    }

    pub fn node_count(&self) -> usize {
        self.activity_paths.len()
    }

    /// All activity identifiers, in id order
    pub fn activity_ids(&self) -> impl Iterator<Item = &str> {
        self.activity_paths.keys().map(String::as_str)
    }

    pub fn path_of(&self, activity_id: &str) -> Option<&StructuralPath> {
        self.activity_paths.get(activity_id)
    }

    pub fn find_activity(&self, activity_id: &str) -> Option<&dyn Activity> {
        let path = self.activity_paths.get(activity_id)?;
        resolve_path(self.root.as_ref(), path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowIdentity {
    pub definition_id: String,
    pub version: i32,
    /// Instance-facing identifier of this particular definition version
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPublication {
    pub is_latest: bool,
    pub is_published: bool,
}

impl Default for WorkflowPublication {
    fn default() -> Self {
        Self {
            is_latest: true,
            is_published: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub tool_version: Option<String>,
}

/// Execution options carried through to the runtime unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOptions {
    pub activation_strategy: ActivationStrategy,
    pub usable_as_activity: bool,
    pub auto_update_consuming_workflows: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            activation_strategy: ActivationStrategy::AllowAlways,
            usable_as_activity: false,
            auto_update_consuming_workflows: false,
        }
    }
}

/// Decides whether a new instance may be started while others exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStrategy {
    #[default]
    AllowAlways,
    Singleton,
    Correlation,
    CorrelatedSingleton,
}
