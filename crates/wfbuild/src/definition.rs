use crate::WorkflowBuilder;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use wfcore::BuildError;

/// External object that knows how to configure a builder.
///
/// `populate` is the configuration phase of a two-phase build: it may do
/// arbitrary asynchronous work (loading documents, resolving nested
/// definitions) and should stop early when `cancel` fires.
#[async_trait]
pub trait WorkflowDefinition: Send + Sync {
    async fn populate(
        &self,
        builder: &mut WorkflowBuilder,
        cancel: &CancellationToken,
    ) -> Result<(), BuildError>;
}
