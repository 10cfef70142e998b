use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CollaboratorError;
use crate::model::{HazardId, UserId, VerificationId, VoteKind};

/// Hazard DTO as served by the hazard collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardReport {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub reporter_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub verification_count: Option<u32>,
    #[serde(default)]
    pub affected_radius_meters: Option<f64>,
}

/// Per-(hazard, user) vote as stored remotely. At most one exists for a
/// pair at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub id: String,
    pub hazard_id: String,
    pub user_id: String,
    pub verification_type: VoteKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub longitude: f64,
    pub latitude: f64,
    pub radius_meters: f64,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HazardApiOperation {
    Nearby(NearbyQuery),
    Get {
        hazard_id: String,
        timeout_ms: u64,
    },
    GetVerification {
        hazard_id: String,
        user_id: String,
        timeout_ms: u64,
    },
    CreateVerification {
        hazard_id: String,
        user_id: String,
        vote: VoteKind,
        timeout_ms: u64,
    },
    DeleteVerification {
        verification_id: String,
        timeout_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HazardApiOutput {
    Hazards(Vec<HazardReport>),
    Hazard(HazardReport),
    /// `None` is the 404-as-null case: no vote exists for the pair.
    Verification(Option<VerificationRecord>),
    VerificationSaved(VerificationRecord),
    Deleted,
}

impl Operation for HazardApiOperation {
    type Output = Result<HazardApiOutput, CollaboratorError>;
}

pub type HazardListResult = Result<Vec<HazardReport>, CollaboratorError>;
pub type HazardFetchResult = Result<HazardReport, CollaboratorError>;
pub type VerificationFetchResult = Result<Option<VerificationRecord>, CollaboratorError>;
pub type VoteMutationResult = Result<(), CollaboratorError>;

fn unexpected(output: &HazardApiOutput) -> CollaboratorError {
    debug!(?output, "unexpected hazard collaborator output");
    CollaboratorError::internal("unexpected hazard collaborator output")
}

pub struct HazardApi<Ev> {
    context: CapabilityContext<HazardApiOperation, Ev>,
}

impl<Ev> HazardApi<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<HazardApiOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn nearby<F>(&self, query: NearbyQuery, make_event: F)
    where
        F: FnOnce(HazardListResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(HazardApiOperation::Nearby(query)).await {
                Ok(HazardApiOutput::Hazards(reports)) => Ok(reports),
                Ok(other) => Err(unexpected(&other)),
                Err(error) => Err(error),
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn get<F>(&self, hazard_id: HazardId, timeout_ms: u64, make_event: F)
    where
        F: FnOnce(HazardFetchResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let operation = HazardApiOperation::Get {
                hazard_id: hazard_id.0,
                timeout_ms,
            };
            let result = match ctx.request_from_shell(operation).await {
                Ok(HazardApiOutput::Hazard(report)) => Ok(report),
                Ok(other) => Err(unexpected(&other)),
                Err(error) => Err(error),
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn verification<F>(
        &self,
        hazard_id: HazardId,
        user_id: UserId,
        timeout_ms: u64,
        make_event: F,
    ) where
        F: FnOnce(VerificationFetchResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let operation = HazardApiOperation::GetVerification {
                hazard_id: hazard_id.0,
                user_id: user_id.0,
                timeout_ms,
            };
            let result = match ctx.request_from_shell(operation).await {
                Ok(HazardApiOutput::Verification(record)) => Ok(record),
                Ok(other) => Err(unexpected(&other)),
                Err(error) => Err(error),
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn create_verification<F>(
        &self,
        hazard_id: HazardId,
        user_id: UserId,
        vote: VoteKind,
        timeout_ms: u64,
        make_event: F,
    ) where
        F: FnOnce(VoteMutationResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let operation = HazardApiOperation::CreateVerification {
                hazard_id: hazard_id.0,
                user_id: user_id.0,
                vote,
                timeout_ms,
            };
            let result = match ctx.request_from_shell(operation).await {
                Ok(HazardApiOutput::VerificationSaved(_)) => Ok(()),
                Ok(other) => Err(unexpected(&other)),
                Err(error) => Err(error),
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn delete_verification<F>(
        &self,
        verification_id: VerificationId,
        timeout_ms: u64,
        make_event: F,
    ) where
        F: FnOnce(VoteMutationResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let operation = HazardApiOperation::DeleteVerification {
                verification_id: verification_id.0,
                timeout_ms,
            };
            let result = match ctx.request_from_shell(operation).await {
                Ok(HazardApiOutput::Deleted) => Ok(()),
                Ok(other) => Err(unexpected(&other)),
                Err(error) => Err(error),
            };
            ctx.update_app(make_event(result));
        });
    }
}

impl<Ev> Capability<Ev> for HazardApi<Ev> {
    type Operation = HazardApiOperation;
    type MappedSelf<MappedEv> = HazardApi<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        HazardApi::new(self.context.map_event(f))
    }
}
