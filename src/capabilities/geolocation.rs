use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::geo::LatLng;

pub type GeolocationResult = Result<LatLng, CollaboratorError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeolocationOperation {
    CurrentPosition,
}

impl Operation for GeolocationOperation {
    type Output = GeolocationResult;
}

pub struct Geolocation<Ev> {
    context: CapabilityContext<GeolocationOperation, Ev>,
}

impl<Ev> Geolocation<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<GeolocationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn current_position<F>(&self, make_event: F)
    where
        F: FnOnce(GeolocationResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(GeolocationOperation::CurrentPosition)
                .await;
            ctx.update_app(make_event(result));
        });
    }
}

impl<Ev> Capability<Ev> for Geolocation<Ev> {
    type Operation = GeolocationOperation;
    type MappedSelf<MappedEv> = Geolocation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Geolocation::new(self.context.map_event(f))
    }
}
