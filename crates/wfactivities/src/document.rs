use crate::control::{Break, Fork, If, JoinMode, Sequence, While};
use crate::custom::{CustomActivity, CustomPort};
use crate::primitives::{SetVariable, WriteLine};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use wfbuild::{WorkflowBuilder, WorkflowDefinition};
use wfcore::{
    ActivationStrategy, Activity, BuildError, InputDefinition, OutputDefinition, Variable,
};

/// JSON authoring form of an activity tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActivityDocument {
    Sequence {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        variables: Vec<Variable>,
        #[serde(default)]
        activities: Vec<ActivityDocument>,
    },
    Fork {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        join_mode: JoinMode,
        #[serde(default)]
        branches: Vec<ActivityDocument>,
    },
    If {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        condition: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then: Option<Box<ActivityDocument>>,
        #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<ActivityDocument>>,
    },
    While {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        condition: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Box<ActivityDocument>>,
    },
    Break {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    SetVariable {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        variable: String,
        #[serde(default)]
        value: serde_json::Value,
    },
    WriteLine {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        text: String,
    },
    Custom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        activity_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        variables: Vec<Variable>,
        #[serde(default)]
        ports: Vec<PortDocument>,
        #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
        properties: serde_json::Map<String, serde_json::Value>,
    },
}

/// Port of a custom activity. List entries may be `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortDocument {
    Single {
        name: String,
        #[serde(default)]
        required: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        child: Option<Box<ActivityDocument>>,
    },
    List {
        name: String,
        #[serde(default)]
        children: Vec<Option<ActivityDocument>>,
    },
}

impl ActivityDocument {
    pub fn into_activity(self) -> Box<dyn Activity> {
        match self {
            ActivityDocument::Sequence {
                id,
                variables,
                activities,
            } => Box::new(Sequence {
                id,
                variables,
                activities: activities.into_iter().map(Self::into_activity).collect(),
            }),
            ActivityDocument::Fork {
                id,
                join_mode,
                branches,
            } => Box::new(Fork {
                id,
                join_mode,
                branches: branches.into_iter().map(Self::into_activity).collect(),
            }),
            ActivityDocument::If {
                id,
                condition,
                then,
                otherwise,
            } => Box::new(If {
                id,
                condition,
                then_branch: then.map(|doc| (*doc).into_activity()),
                else_branch: otherwise.map(|doc| (*doc).into_activity()),
            }),
            ActivityDocument::While {
                id,
                condition,
                body,
            } => Box::new(While {
                id,
                condition,
                body: body.map(|doc| (*doc).into_activity()),
            }),
            ActivityDocument::Break { id } => Box::new(Break { id }),
            ActivityDocument::SetVariable {
                id,
                variable,
                value,
            } => Box::new(SetVariable {
                id,
                variable,
                value,
            }),
            ActivityDocument::WriteLine { id, text } => Box::new(WriteLine { id, text }),
            ActivityDocument::Custom {
                id,
                activity_type,
                category,
                variables,
                ports,
                properties,
            } => {
                let mut activity = CustomActivity::new(activity_type);
                activity.id = id;
                activity.variables = variables;
                activity.properties = properties;
                if let Some(category) = category {
                    activity = activity.with_category(category);
                }
                for port in ports {
                    activity = match port {
                        PortDocument::Single {
                            name,
                            required,
                            child,
                        } => activity.with_port(
                            name,
                            required,
                            CustomPort::Single(child.map(|doc| (*doc).into_activity())),
                        ),
                        PortDocument::List { name, children } => activity.with_port(
                            name,
                            false,
                            CustomPort::List(
                                children
                                    .into_iter()
                                    .map(|child| child.map(Self::into_activity))
                                    .collect(),
                            ),
                        ),
                    };
                }
                Box::new(activity)
            }
        }
    }
}

/// JSON workflow definition: metadata plus the root activity document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_published: bool,
    /// Left unset, a built workflow is marked as the latest version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_latest: Option<bool>,
    pub activation_strategy: ActivationStrategy,
    pub usable_as_activity: bool,
    pub auto_update_consuming_workflows: bool,
    pub variables: Vec<Variable>,
    pub inputs: Vec<InputDefinition>,
    pub outputs: Vec<OutputDefinition>,
    pub outcomes: Vec<String>,
    pub custom_properties: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Variable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<ActivityDocument>,
}

impl WorkflowDocument {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[async_trait]
impl WorkflowDefinition for WorkflowDocument {
    async fn populate(
        &self,
        builder: &mut WorkflowBuilder,
        cancel: &CancellationToken,
    ) -> Result<(), BuildError> {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        if let Some(definition_id) = &self.definition_id {
            builder.definition_id(definition_id.clone());
        }
        if let Some(id) = &self.id {
            builder.id(id.clone());
        }
        if let Some(version) = self.version {
            builder.version(version);
        }
        if let Some(name) = &self.name {
            builder.name(name.clone());
        }
        if let Some(description) = &self.description {
            builder.description(description.clone());
        }
        if let Some(is_latest) = self.is_latest {
            builder.latest(is_latest);
        }
        builder
            .published(self.is_published)
            .activation_strategy(self.activation_strategy)
            .usable_as_activity(self.usable_as_activity)
            .auto_update_consuming_workflows(self.auto_update_consuming_workflows);

        for variable in &self.variables {
            builder.variable(variable.clone());
        }
        for input in &self.inputs {
            builder.input(input.clone());
        }
        for output in &self.outputs {
            builder.output(output.clone());
        }
        for outcome in &self.outcomes {
            builder.outcome(outcome.clone());
        }
        for (key, value) in &self.custom_properties {
            builder.custom_property(key.clone(), value.clone());
        }
        if let Some(result) = &self.result {
            builder.result(result.clone());
        }
        if let Some(root) = &self.root {
            builder.root_boxed(root.clone().into_activity());
        }

        tracing::debug!(
            "Populated builder from document {}",
            self.name.as_deref().unwrap_or("(unnamed)")
        );
        Ok(())
    }
}
