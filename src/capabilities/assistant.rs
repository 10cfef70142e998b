use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Car,
    Bicycle,
    Walking,
}

/// Conversation payload for the AI assistant collaborator. Coordinates
/// and addresses ride along only when both route endpoints are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<VehicleType>,
}

/// Route option as returned by the assistant. Every field is optional;
/// normalization into a display card happens in exactly one place
/// (`RouteSuggestion::from_option`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRouteOption {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub recommendation_tier: Option<String>,
    #[serde(default)]
    pub safety_score: Option<f64>,
    #[serde(default)]
    pub hazard_count: Option<i64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub distance_meters: Option<f64>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub polyline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub route_options: Vec<AssistantRouteOption>,
}

pub type AssistantResult = Result<AssistantResponse, CollaboratorError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssistantOperation {
    Converse {
        bearer_token: String,
        request: AssistantRequest,
        timeout_ms: u64,
    },
}

impl Operation for AssistantOperation {
    type Output = AssistantResult;
}

pub struct Assistant<Ev> {
    context: CapabilityContext<AssistantOperation, Ev>,
}

impl<Ev> Assistant<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<AssistantOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn converse<F>(
        &self,
        bearer_token: String,
        request: AssistantRequest,
        timeout_ms: u64,
        make_event: F,
    ) where
        F: FnOnce(AssistantResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(AssistantOperation::Converse {
                    bearer_token,
                    request,
                    timeout_ms,
                })
                .await;
            ctx.update_app(make_event(result));
        });
    }
}

impl<Ev> Capability<Ev> for Assistant<Ev> {
    type Operation = AssistantOperation;
    type MappedSelf<MappedEv> = Assistant<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Assistant::new(self.context.map_event(f))
    }
}
