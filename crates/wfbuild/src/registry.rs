use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use wfcore::{ActivityDescriptor, RegistrationError};

/// Process-wide record of the activity types a build has encountered.
///
/// Implementations must be idempotent: registering an already known type
/// is a no-op, never an error.
#[async_trait]
pub trait TypeRegistry: Send + Sync {
    async fn register(
        &self,
        descriptors: Vec<ActivityDescriptor>,
    ) -> Result<RegistrationSummary, RegistrationError>;
}

/// Outcome of one registration call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    /// Type names newly added by this call
    pub registered: Vec<String>,
    pub already_known: usize,
}

/// In-memory registry of activity types.
///
/// Cloning yields another handle to the same registry. Entries are only
/// ever inserted, never removed.
#[derive(Debug, Clone, Default)]
pub struct ActivityTypeRegistry {
    types: Arc<RwLock<HashMap<String, ActivityDescriptor>>>,
}

impl ActivityTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.types.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.types.read().await.is_empty()
    }

    pub async fn contains(&self, type_name: &str) -> bool {
        self.types.read().await.contains_key(type_name)
    }

    pub async fn get(&self, type_name: &str) -> Option<ActivityDescriptor> {
        self.types.read().await.get(type_name).cloned()
    }

    /// Registered type names, sorted
    pub async fn list_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl TypeRegistry for ActivityTypeRegistry {
    async fn register(
        &self,
        descriptors: Vec<ActivityDescriptor>,
    ) -> Result<RegistrationSummary, RegistrationError> {
        // Reject the whole batch before touching shared state
        for descriptor in &descriptors {
            validate_descriptor(descriptor)?;
        }

        let mut summary = RegistrationSummary::default();
        let mut types = self.types.write().await;
        for descriptor in descriptors {
            if types.contains_key(&descriptor.type_name) {
                tracing::debug!("Activity type already registered: {}", descriptor.type_name);
                summary.already_known += 1;
                continue;
            }
            tracing::info!("Registering activity type: {}", descriptor.type_name);
            summary.registered.push(descriptor.type_name.clone());
            types.insert(descriptor.type_name.clone(), descriptor);
        }

        Ok(summary)
    }
}

fn validate_descriptor(descriptor: &ActivityDescriptor) -> Result<(), RegistrationError> {
    let name = descriptor.type_name.as_str();
    if name.trim().is_empty() {
        return Err(RegistrationError::MissingMetadata(
            "activity type name is empty".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(RegistrationError::InvalidTypeName(name.to_string()));
    }
    if descriptor.version == 0 {
        return Err(RegistrationError::MissingMetadata(format!(
            "{} has no version",
            name
        )));
    }
    if descriptor.ports.iter().any(|port| port.name.trim().is_empty()) {
        return Err(RegistrationError::MissingMetadata(format!(
            "{} declares a port without a name",
            name
        )));
    }
    Ok(())
}
