use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

/// Opaque bearer credential minted by the auth collaborator. Absence of
/// a signed-in user surfaces as `ErrorKind::Authentication`.
pub type AuthResult = Result<String, CollaboratorError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthOperation {
    GetBearerToken,
}

impl Operation for AuthOperation {
    type Output = AuthResult;
}

pub struct Auth<Ev> {
    context: CapabilityContext<AuthOperation, Ev>,
}

impl<Ev> Auth<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<AuthOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn bearer_token<F>(&self, make_event: F)
    where
        F: FnOnce(AuthResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx.request_from_shell(AuthOperation::GetBearerToken).await;
            ctx.update_app(make_event(result));
        });
    }
}

impl<Ev> Capability<Ev> for Auth<Ev> {
    type Operation = AuthOperation;
    type MappedSelf<MappedEv> = Auth<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Auth::new(self.context.map_event(f))
    }
}
