use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::geo::LatLng;

/// Route query handed to the external directions collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteQuery {
    pub origin: LatLng,
    pub destination: LatLng,
    pub provide_alternatives: bool,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsStep {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub distance_text: String,
    #[serde(default)]
    pub duration_text: String,
    #[serde(default)]
    pub maneuver: Option<String>,
    pub start: LatLng,
    pub end: LatLng,
    #[serde(default)]
    pub path: Vec<LatLng>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsLeg {
    #[serde(default)]
    pub distance_meters: f64,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub start_address: Option<String>,
    #[serde(default)]
    pub end_address: Option<String>,
    #[serde(default)]
    pub steps: Vec<DirectionsStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRoute {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsResponse {
    pub routes: Vec<DirectionsRoute>,
}

pub type DirectionsResult = Result<DirectionsResponse, CollaboratorError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DirectionsOperation {
    ComputeRoutes(RouteQuery),
}

impl Operation for DirectionsOperation {
    type Output = DirectionsResult;
}

pub struct Directions<Ev> {
    context: CapabilityContext<DirectionsOperation, Ev>,
}

impl<Ev> Directions<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<DirectionsOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn compute_routes<F>(&self, query: RouteQuery, make_event: F)
    where
        F: FnOnce(DirectionsResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(DirectionsOperation::ComputeRoutes(query))
                .await;
            ctx.update_app(make_event(result));
        });
    }
}

impl<Ev> Capability<Ev> for Directions<Ev> {
    type Operation = DirectionsOperation;
    type MappedSelf<MappedEv> = Directions<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Directions::new(self.context.map_event(f))
    }
}
