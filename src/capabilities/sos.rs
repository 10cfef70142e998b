use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CollaboratorError;
use crate::model::{SosEventId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SosEventStatus {
    Active,
    HelpArriving,
    Resolved,
}

/// SOS event DTO as stored in the remote event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosEventRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub location_accuracy_meters: f64,
    #[serde(default)]
    pub status: Option<SosEventStatus>,
    #[serde(default)]
    pub triggered_at: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<String>,
}

impl SosEventRecord {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == Some(SosEventStatus::Resolved)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SosApiOperation {
    Create {
        event: SosEventRecord,
        timeout_ms: u64,
    },
    Delete {
        event_id: String,
        timeout_ms: u64,
    },
    ListByUser {
        user_id: String,
        timeout_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SosApiOutput {
    Created(SosEventRecord),
    Deleted,
    Events(Vec<SosEventRecord>),
}

impl Operation for SosApiOperation {
    type Output = Result<SosApiOutput, CollaboratorError>;
}

pub type SosCreateResult = Result<SosEventRecord, CollaboratorError>;
pub type SosDeleteResult = Result<(), CollaboratorError>;
pub type SosListResult = Result<Vec<SosEventRecord>, CollaboratorError>;

fn unexpected(output: &SosApiOutput) -> CollaboratorError {
    debug!(?output, "unexpected SOS collaborator output");
    CollaboratorError::internal("unexpected SOS collaborator output")
}

pub struct SosApi<Ev> {
    context: CapabilityContext<SosApiOperation, Ev>,
}

impl<Ev> SosApi<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<SosApiOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn create<F>(&self, event: SosEventRecord, timeout_ms: u64, make_event: F)
    where
        F: FnOnce(SosCreateResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let operation = SosApiOperation::Create { event, timeout_ms };
            let result = match ctx.request_from_shell(operation).await {
                Ok(SosApiOutput::Created(record)) => Ok(record),
                Ok(other) => Err(unexpected(&other)),
                Err(error) => Err(error),
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn delete<F>(&self, event_id: SosEventId, timeout_ms: u64, make_event: F)
    where
        F: FnOnce(SosDeleteResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let operation = SosApiOperation::Delete {
                event_id: event_id.0,
                timeout_ms,
            };
            let result = match ctx.request_from_shell(operation).await {
                Ok(SosApiOutput::Deleted) => Ok(()),
                Ok(other) => Err(unexpected(&other)),
                Err(error) => Err(error),
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn list_by_user<F>(&self, user_id: UserId, timeout_ms: u64, make_event: F)
    where
        F: FnOnce(SosListResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let operation = SosApiOperation::ListByUser {
                user_id: user_id.0,
                timeout_ms,
            };
            let result = match ctx.request_from_shell(operation).await {
                Ok(SosApiOutput::Events(events)) => Ok(events),
                Ok(other) => Err(unexpected(&other)),
                Err(error) => Err(error),
            };
            ctx.update_app(make_event(result));
        });
    }
}

impl<Ev> Capability<Ev> for SosApi<Ev> {
    type Operation = SosApiOperation;
    type MappedSelf<MappedEv> = SosApi<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        SosApi::new(self.context.map_event(f))
    }
}
