use crate::capabilities::{
    AssistantResult, AuthResult, DirectionsResult, GeolocationResult, HazardFetchResult,
    HazardListResult, SosCreateResult, SosDeleteResult, SosListResult, VerificationFetchResult,
    VoteMutationResult,
};
use crate::geo::LatLng;
use crate::model::{ChatMessageId, HazardId, SosEventId, SosPinId, TurnInstruction, VoteKind};

/// Every intent the shell can dispatch plus every async completion the
/// capabilities feed back. The reducer in `App::update` is total over
/// this enum.
#[derive(Debug, Clone)]
pub enum Event {
    // Session
    SessionEstablished { user_id: String },
    SessionCleared,

    // Route acquisition
    DirectionsReadyChanged { ready: bool },
    OriginChanged { text: String, position: Option<LatLng> },
    DestinationChanged { text: String, position: Option<LatLng> },
    RouteRequested,
    RoutesComputed(DirectionsResult),
    EnhanceCredentialReady(AuthResult),
    RoutesEnhanced(AssistantResult),
    RouteCleared,

    // Navigation
    NavigationStarted,
    NavigationEnded,
    TurnInstructionChanged(Option<TurnInstruction>),
    HazardAlertChanged { visible: bool },

    // Chat / assistant
    ChatToggled { open: bool },
    ChatMessageSent { text: String },
    ChatCredentialReady(AuthResult),
    ChatReplyReceived(AssistantResult),
    SuggestionApplied { message_id: ChatMessageId, card_index: usize },

    // Hazard overlay & verification
    PositionResolved(GeolocationResult),
    HazardsFetched(HazardListResult),
    HazardSelected { hazard_id: Option<HazardId> },
    VerificationFetched { hazard_id: HazardId, result: VerificationFetchResult },
    VoteSubmitted { vote: VoteKind },
    VoteReplacementDeleted { hazard_id: HazardId, vote: VoteKind },
    VoteMutationCompleted { hazard_id: HazardId, result: VoteMutationResult },
    HazardRefreshed { hazard_id: HazardId, result: HazardFetchResult },

    // SOS pins
    SosPinModeChanged { enabled: bool },
    SosPinDropped { position: LatLng },
    SosPinSelected { index: usize },
    SosPinRemoved { index: usize },
    SosPinsCleared,
    SosPopupClosed,
    SosEventsLoaded(SosListResult),
    SosCreateCompleted { pin_id: SosPinId, result: SosCreateResult },
    SosDeleteCompleted { event_id: SosEventId, result: SosDeleteResult },

    ErrorDismissed,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SessionEstablished { .. } => "session_established",
            Self::SessionCleared => "session_cleared",
            Self::DirectionsReadyChanged { .. } => "directions_ready_changed",
            Self::OriginChanged { .. } => "origin_changed",
            Self::DestinationChanged { .. } => "destination_changed",
            Self::RouteRequested => "route_requested",
            Self::RoutesComputed(_) => "routes_computed",
            Self::EnhanceCredentialReady(_) => "enhance_credential_ready",
            Self::RoutesEnhanced(_) => "routes_enhanced",
            Self::RouteCleared => "route_cleared",
            Self::NavigationStarted => "navigation_started",
            Self::NavigationEnded => "navigation_ended",
            Self::TurnInstructionChanged(_) => "turn_instruction_changed",
            Self::HazardAlertChanged { .. } => "hazard_alert_changed",
            Self::ChatToggled { .. } => "chat_toggled",
            Self::ChatMessageSent { .. } => "chat_message_sent",
            Self::ChatCredentialReady(_) => "chat_credential_ready",
            Self::ChatReplyReceived(_) => "chat_reply_received",
            Self::SuggestionApplied { .. } => "suggestion_applied",
            Self::PositionResolved(_) => "position_resolved",
            Self::HazardsFetched(_) => "hazards_fetched",
            Self::HazardSelected { .. } => "hazard_selected",
            Self::VerificationFetched { .. } => "verification_fetched",
            Self::VoteSubmitted { .. } => "vote_submitted",
            Self::VoteReplacementDeleted { .. } => "vote_replacement_deleted",
            Self::VoteMutationCompleted { .. } => "vote_mutation_completed",
            Self::HazardRefreshed { .. } => "hazard_refreshed",
            Self::SosPinModeChanged { .. } => "sos_pin_mode_changed",
            Self::SosPinDropped { .. } => "sos_pin_dropped",
            Self::SosPinSelected { .. } => "sos_pin_selected",
            Self::SosPinRemoved { .. } => "sos_pin_removed",
            Self::SosPinsCleared => "sos_pins_cleared",
            Self::SosPopupClosed => "sos_popup_closed",
            Self::SosEventsLoaded(_) => "sos_events_loaded",
            Self::SosCreateCompleted { .. } => "sos_create_completed",
            Self::SosDeleteCompleted { .. } => "sos_delete_completed",
            Self::ErrorDismissed => "error_dismissed",
        }
    }

    /// Intents a user gesture can produce, as opposed to pipeline
    /// completions.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::OriginChanged { .. }
                | Self::DestinationChanged { .. }
                | Self::RouteRequested
                | Self::RouteCleared
                | Self::NavigationStarted
                | Self::NavigationEnded
                | Self::ChatToggled { .. }
                | Self::ChatMessageSent { .. }
                | Self::SuggestionApplied { .. }
                | Self::HazardSelected { .. }
                | Self::VoteSubmitted { .. }
                | Self::SosPinModeChanged { .. }
                | Self::SosPinDropped { .. }
                | Self::SosPinSelected { .. }
                | Self::SosPinRemoved { .. }
                | Self::SosPinsCleared
                | Self::SosPopupClosed
                | Self::ErrorDismissed
        )
    }
}
