mod assistant;
mod auth;
mod directions;
mod geolocation;
mod hazards;
mod sos;

pub use self::assistant::{
    Assistant, AssistantOperation, AssistantRequest, AssistantResponse, AssistantResult,
    AssistantRouteOption, VehicleType,
};
pub use self::auth::{Auth, AuthOperation, AuthResult};
pub use self::directions::{
    Directions, DirectionsLeg, DirectionsOperation, DirectionsResponse, DirectionsResult,
    DirectionsRoute, DirectionsStep, RouteQuery,
};
pub use self::geolocation::{Geolocation, GeolocationOperation, GeolocationResult};
pub use self::hazards::{
    HazardApi, HazardApiOperation, HazardApiOutput, HazardFetchResult, HazardListResult,
    HazardReport, NearbyQuery, VerificationFetchResult, VerificationRecord, VoteMutationResult,
};
pub use self::sos::{
    SosApi, SosApiOperation, SosApiOutput, SosCreateResult, SosDeleteResult, SosEventRecord,
    SosEventStatus, SosListResult,
};

pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

pub type AppRender = Render<Event>;
pub type AppDirections = Directions<Event>;
pub type AppAssistant = Assistant<Event>;
pub type AppHazardApi = HazardApi<Event>;
pub type AppSosApi = SosApi<Event>;
pub type AppGeolocation = Geolocation<Event>;
pub type AppAuth = Auth<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub directions: Directions<Event>,
    pub assistant: Assistant<Event>,
    pub hazards: HazardApi<Event>,
    pub sos: SosApi<Event>,
    pub geolocation: Geolocation<Event>,
    pub auth: Auth<Event>,
}
