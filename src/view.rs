use serde::{Deserialize, Serialize};

use crate::geo::{format_coordinate, LatLng};
use crate::model::{
    ChatMessage, Hazard, HazardId, LocationField, Model, Route, Severity, SosPinId,
    TurnInstruction, ViewMode, VoteKind,
};

/// Map marker projection of a hazard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardPin {
    pub id: HazardId,
    pub position: LatLng,
    pub severity: Severity,
    pub title: String,
    pub report_count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardDetail {
    pub id: HazardId,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub position_text: String,
    pub image_url: Option<String>,
    pub reported_at: Option<String>,
    pub report_count: u32,
    pub vote: VoteControls,
}

/// Vote-button state; a control is disabled while the opposite vote is
/// active or any verification round trip is pending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteControls {
    pub active_vote: Option<VoteKind>,
    pub is_pending: bool,
    pub can_confirm: bool,
    pub can_dispute: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatView {
    pub is_open: bool,
    pub is_sending: bool,
    pub messages: Vec<ChatMessage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SosPinView {
    pub id: SosPinId,
    pub position: LatLng,
    pub is_synced: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SosView {
    pub pins: Vec<SosPinView>,
    pub selected_index: Option<usize>,
    pub selected_position_text: Option<String>,
    pub is_popup_open: bool,
    pub is_pin_mode: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub view_mode: ViewMode,
    pub origin: LocationField,
    pub destination: LocationField,
    pub is_loading_route: bool,
    pub active_route: Option<Route>,
    pub alternate_route: Option<Route>,
    pub hazards: Vec<HazardPin>,
    pub selected_hazard: Option<HazardDetail>,
    pub chat: ChatView,
    pub sos: SosView,
    pub current_instruction: Option<TurnInstruction>,
    pub is_hazard_alert_visible: bool,
    pub is_authenticated: bool,
    pub error: Option<String>,
}

impl ViewModel {
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        Self {
            view_mode: model.view_mode,
            origin: model.origin.clone(),
            destination: model.destination.clone(),
            is_loading_route: model.is_loading_route,
            active_route: model.active_route.clone(),
            alternate_route: model.alternate_route.clone(),
            hazards: model.hazards.iter().map(hazard_pin).collect(),
            selected_hazard: model
                .is_hazard_detail_open
                .then(|| model.selected_hazard().map(|hazard| hazard_detail(model, hazard)))
                .flatten(),
            chat: ChatView {
                is_open: model.is_chat_open,
                is_sending: model.is_chat_sending,
                messages: model.chat_messages.clone(),
            },
            sos: sos_view(model),
            current_instruction: model.current_instruction.clone(),
            is_hazard_alert_visible: model.is_hazard_alert_visible,
            is_authenticated: model.is_authenticated(),
            error: model.error.clone(),
        }
    }
}

fn hazard_pin(hazard: &Hazard) -> HazardPin {
    HazardPin {
        id: hazard.id.clone(),
        position: hazard.position,
        severity: hazard.severity,
        title: hazard.title.clone(),
        report_count: hazard.report_count,
    }
}

fn hazard_detail(model: &Model, hazard: &Hazard) -> HazardDetail {
    let pending = model.verification_panel.is_pending();
    let active_vote = model.verification_panel.active_vote();
    let signed_in = model.is_authenticated();

    HazardDetail {
        id: hazard.id.clone(),
        title: hazard.title.clone(),
        description: hazard.description.clone(),
        severity: hazard.severity,
        position_text: position_text(hazard.position),
        image_url: hazard.image_url.clone(),
        reported_at: hazard.reported_at.clone(),
        report_count: hazard.report_count,
        vote: VoteControls {
            active_vote,
            is_pending: pending,
            can_confirm: signed_in && !pending && active_vote != Some(VoteKind::Dispute),
            can_dispute: signed_in && !pending && active_vote != Some(VoteKind::Confirm),
        },
    }
}

fn sos_view(model: &Model) -> SosView {
    let selected_position_text = model
        .selected_sos_index
        .and_then(|index| model.sos_pins.get(index))
        .map(|pin| position_text(pin.position));

    SosView {
        pins: model
            .sos_pins
            .iter()
            .map(|pin| SosPinView {
                id: pin.id.clone(),
                position: pin.position,
                is_synced: pin.is_synced(),
            })
            .collect(),
        selected_index: model.selected_sos_index,
        selected_position_text,
        is_popup_open: model.is_sos_popup_open,
        is_pin_mode: model.is_sos_pin_mode,
    }
}

fn position_text(position: LatLng) -> String {
    format!(
        "{}, {}",
        format_coordinate(position.lat, true),
        format_coordinate(position.lng, false)
    )
}
