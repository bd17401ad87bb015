use crate::identifiers::{IdentifierGenerator, UuidIdentifierGenerator};
use crate::identity::{self, DEFAULT_IDENTITY_NAMESPACE};
use crate::registry::TypeRegistry;
use crate::variables;
use crate::visitor;
use crate::WorkflowDefinition;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wfcore::{
    ActivationStrategy, Activity, BuildError, EmptyComposite, InputDefinition, OutputDefinition,
    Variable, Workflow, WorkflowIdentity, WorkflowMetadata, WorkflowOptions, WorkflowParts,
    WorkflowPublication,
};

/// Build-wide settings shared by every builder created from one set of
/// services
#[derive(Debug, Clone)]
pub struct BuilderOptions {
    /// Namespace for derived activity ids. Changing it changes every
    /// derived id.
    pub identity_namespace: Uuid,
    pub default_version: i32,
    pub tool_version: Option<String>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            identity_namespace: DEFAULT_IDENTITY_NAMESPACE,
            default_version: 1,
            tool_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}

/// Collaborators a build needs: the shared type registry and an
/// identifier generator for default ids.
#[derive(Clone)]
pub struct BuilderServices {
    pub registry: Arc<dyn TypeRegistry>,
    pub identifiers: Arc<dyn IdentifierGenerator>,
    pub options: BuilderOptions,
}

impl BuilderServices {
    pub fn new(registry: Arc<dyn TypeRegistry>) -> Self {
        Self {
            registry,
            identifiers: Arc::new(UuidIdentifierGenerator),
            options: BuilderOptions::default(),
        }
    }

    pub fn with_identifiers(mut self, identifiers: Arc<dyn IdentifierGenerator>) -> Self {
        self.identifiers = identifiers;
        self
    }

    pub fn with_options(mut self, options: BuilderOptions) -> Self {
        self.options = options;
        self
    }
}

/// Caller-configured part of a workflow, consumed by a build
#[derive(Debug, Default)]
pub struct WorkflowConfig {
    pub definition_id: Option<String>,
    pub id: Option<String>,
    pub version: Option<i32>,
    pub publication: WorkflowPublication,
    pub name: Option<String>,
    pub description: Option<String>,
    pub root: Option<Box<dyn Activity>>,
    pub variables: Vec<Variable>,
    pub inputs: Vec<InputDefinition>,
    pub outputs: Vec<OutputDefinition>,
    pub outcomes: Vec<String>,
    pub custom_properties: BTreeMap<String, serde_json::Value>,
    pub options: WorkflowOptions,
    /// Variable that captures the workflow's result
    pub result: Option<Variable>,
}

/// Turns a configured activity tree into an immutable [`Workflow`].
///
/// A builder is consumed by `build`, so each build needs its own instance;
/// use a [`WorkflowBuilderFactory`] to create them.
pub struct WorkflowBuilder {
    services: BuilderServices,
    config: WorkflowConfig,
}

impl WorkflowBuilder {
    pub fn new(services: BuilderServices) -> Self {
        Self::with_config(services, WorkflowConfig::default())
    }

    pub fn with_config(services: BuilderServices, config: WorkflowConfig) -> Self {
        Self { services, config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut WorkflowConfig {
        &mut self.config
    }

    pub fn definition_id(&mut self, definition_id: impl Into<String>) -> &mut Self {
        self.config.definition_id = Some(definition_id.into());
        self
    }

    pub fn id(&mut self, id: impl Into<String>) -> &mut Self {
        self.config.id = Some(id.into());
        self
    }

    pub fn version(&mut self, version: i32) -> &mut Self {
        self.config.version = Some(version);
        self
    }

    pub fn published(&mut self, is_published: bool) -> &mut Self {
        self.config.publication.is_published = is_published;
        self
    }

    pub fn latest(&mut self, is_latest: bool) -> &mut Self {
        self.config.publication.is_latest = is_latest;
        self
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.name = Some(name.into());
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.config.description = Some(description.into());
        self
    }

    pub fn root(&mut self, root: impl Activity + 'static) -> &mut Self {
        self.config.root = Some(Box::new(root));
        self
    }

    pub fn root_boxed(&mut self, root: Box<dyn Activity>) -> &mut Self {
        self.config.root = Some(root);
        self
    }

    pub fn variable(&mut self, variable: Variable) -> &mut Self {
        self.config.variables.push(variable);
        self
    }

    pub fn input(&mut self, input: InputDefinition) -> &mut Self {
        self.config.inputs.push(input);
        self
    }

    pub fn output(&mut self, output: OutputDefinition) -> &mut Self {
        self.config.outputs.push(output);
        self
    }

    pub fn outcome(&mut self, outcome: impl Into<String>) -> &mut Self {
        self.config.outcomes.push(outcome.into());
        self
    }

    pub fn custom_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> &mut Self {
        self.config.custom_properties.insert(key.into(), value.into());
        self
    }

    pub fn activation_strategy(&mut self, strategy: ActivationStrategy) -> &mut Self {
        self.config.options.activation_strategy = strategy;
        self
    }

    pub fn usable_as_activity(&mut self, usable: bool) -> &mut Self {
        self.config.options.usable_as_activity = usable;
        self
    }

    pub fn auto_update_consuming_workflows(&mut self, enabled: bool) -> &mut Self {
        self.config.options.auto_update_consuming_workflows = enabled;
        self
    }

    pub fn result(&mut self, variable: Variable) -> &mut Self {
        self.config.result = Some(variable);
        self
    }

    /// Populate this builder from `definition`, then build.
    ///
    /// Cancellation during either phase returns [`BuildError::Cancelled`].
    pub async fn build_from_definition(
        mut self,
        definition: &dyn WorkflowDefinition,
        cancel: &CancellationToken,
    ) -> Result<Workflow, BuildError> {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Build cancelled while populating from definition");
                return Err(BuildError::Cancelled);
            }
            result = definition.populate(&mut self, cancel) => result?,
        }

        self.build(cancel).await
    }

    /// Build the workflow aggregate.
    ///
    /// Steps run strictly in order: default ids, default root, flatten,
    /// register types, assign ids, name variables, assemble. Nothing is
    /// returned on failure or cancellation.
    pub async fn build(self, cancel: &CancellationToken) -> Result<Workflow, BuildError> {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        let WorkflowBuilder { services, config } = self;
        let WorkflowConfig {
            definition_id,
            id,
            version,
            publication,
            name,
            description,
            root,
            mut variables,
            inputs,
            outputs,
            outcomes,
            custom_properties,
            options,
            result,
        } = config;

        // 1. Default identifiers
        let definition_id = non_empty(definition_id).unwrap_or_else(|| services.identifiers.generate());
        let id = non_empty(id).unwrap_or_else(|| services.identifiers.generate());
        let version = version.unwrap_or(services.options.default_version);

        tracing::info!("Building workflow {} (version {})", definition_id, version);

        // 2. Default root
        let mut root = root.unwrap_or_else(|| {
            tracing::debug!("Workflow {} has no root, using an empty composite", definition_id);
            Box::new(EmptyComposite::new()) as Box<dyn Activity>
        });

        // 3. Flatten
        let graph = visitor::flatten(root.as_ref())?;

        // 4. Register the distinct activity types
        let descriptors = graph.descriptors().values().cloned().collect();
        let summary = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Build of workflow {} cancelled during type registration", definition_id);
                return Err(BuildError::Cancelled);
            }
            result = services.registry.register(descriptors) => result?,
        };
        tracing::debug!(
            "Registered {} new activity types ({} already known)",
            summary.registered.len(),
            summary.already_known
        );

        // 5. Assign identities
        let identities =
            identity::assign_identities(graph.nodes(), &services.options.identity_namespace)?;
        identity::apply_identities(root.as_mut(), &identities);

        // 6. Name variables: activity containers, then the workflow itself
        let mut generated = variables::resolve_scopes(root.as_mut());
        let result_index = result.map(|result| attach_result_variable(&mut variables, result));
        generated += variables::name_variables(&mut variables);
        let result_variable = result_index.map(|index| variables[index].clone());
        tracing::debug!(
            "Generated {} variable names across {} activity scopes",
            generated,
            graph.variable_containers().count()
        );

        // 7. Assemble
        let workflow = Workflow::assemble(WorkflowParts {
            identity: WorkflowIdentity {
                definition_id,
                version,
                id,
            },
            publication,
            metadata: WorkflowMetadata {
                name,
                description,
                created_at: Utc::now(),
                tool_version: services.options.tool_version.clone(),
            },
            options,
            root,
            variables,
            inputs,
            outputs,
            outcomes,
            custom_properties,
            result_variable,
            activity_paths: identities.to_path_index(),
        });

        tracing::info!(
            "Built workflow {} with {} activities",
            workflow.identity().definition_id,
            workflow.node_count()
        );

        Ok(workflow)
    }
}

/// Reuse a workflow variable with the same name as the result variable,
/// otherwise append it. Returns its position.
fn attach_result_variable(variables: &mut Vec<Variable>, result: Variable) -> usize {
    let existing = result
        .name
        .as_deref()
        .filter(|_| result.is_named())
        .and_then(|name| {
            variables
                .iter()
                .position(|variable| variable.name.as_deref() == Some(name))
        });

    match existing {
        Some(index) => index,
        None => {
            variables.push(result);
            variables.len() - 1
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Hands out fresh builders that share one set of services
#[derive(Clone)]
pub struct WorkflowBuilderFactory {
    services: BuilderServices,
}

impl WorkflowBuilderFactory {
    pub fn new(services: BuilderServices) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &BuilderServices {
        &self.services
    }

    pub fn create(&self) -> WorkflowBuilder {
        WorkflowBuilder::new(self.services.clone())
    }
}
