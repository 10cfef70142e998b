use tracing::{debug, warn};

use crate::capabilities::{
    AssistantRequest, AssistantResult, AuthResult, Capabilities, DirectionsResult,
    DirectionsRoute, GeolocationResult, HazardFetchResult, HazardListResult, NearbyQuery,
    RouteQuery, SosCreateResult, SosEventRecord, SosEventStatus, SosListResult,
    VerificationFetchResult, VerificationRecord, VehicleType, VoteMutationResult,
};
use crate::event::Event;
use crate::geo::{meters_to_miles, route_pair_key, seconds_to_minutes, LatLng};
use crate::model::{
    ChatMessage, ChatMessageId, Hazard, HazardId, LocationField, Model, RecommendationTier,
    Route, RouteId, RouteKind, RouteStep, RouteSuggestion, Session, SosEventId, SosPin, SosPinId,
    UserId, Verification, VerificationId, VerificationPanel, ViewMode, VoteKind,
};
use crate::view::ViewModel;
use crate::{
    polyline, ASSISTANT_UNREACHABLE_REPLY, DEFAULT_CENTER, DEFAULT_SOS_ACCURACY_M,
    EMPTY_REPLY_FALLBACK, MISSING_POLYLINE_ERROR, ROUTE_UNAVAILABLE_ERROR,
    SAFETY_ANALYSIS_PROMPT, SIGN_IN_REQUIRED_ERROR,
};

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Self::Event, model: &mut Self::Model, caps: &Self::Capabilities) {
        debug!(event = event.name(), "update");

        match event {
            Event::SessionEstablished { user_id } => {
                Self::establish_session(model, caps, user_id);
            }
            Event::SessionCleared => Self::clear_session(model),

            Event::DirectionsReadyChanged { ready } => {
                model.directions_ready = ready;
                if ready {
                    Self::maybe_request_route(model, caps);
                }
            }
            Event::OriginChanged { text, position } => {
                model.origin = LocationField { text, position };
                Self::maybe_request_route(model, caps);
            }
            Event::DestinationChanged { text, position } => {
                let has_position = position.is_some();
                model.destination = LocationField { text, position };
                if has_position {
                    model.view_mode = ViewMode::Routing;
                }
                Self::maybe_request_route(model, caps);
            }
            Event::RouteRequested => Self::maybe_request_route(model, caps),
            Event::RoutesComputed(result) => Self::commit_routes(model, caps, result),
            Event::EnhanceCredentialReady(result) => {
                Self::request_enhancement(model, caps, result);
            }
            Event::RoutesEnhanced(result) => Self::apply_enhancement(model, result),
            Event::RouteCleared => {
                model.active_route = None;
                model.alternate_route = None;
                model.view_mode = ViewMode::Browse;
            }

            Event::NavigationStarted => {
                model.view_mode = ViewMode::Navigating;
                model.is_chat_open = false;
                model.is_hazard_detail_open = false;
            }
            Event::NavigationEnded => {
                model.view_mode = ViewMode::Routing;
                model.current_instruction = None;
                model.is_hazard_alert_visible = false;
            }
            Event::TurnInstructionChanged(instruction) => {
                model.current_instruction = instruction;
            }
            Event::HazardAlertChanged { visible } => model.is_hazard_alert_visible = visible,

            Event::ChatToggled { open } => Self::toggle_chat(model, caps, open),
            Event::ChatMessageSent { text } => Self::send_chat_turn(model, caps, text),
            Event::ChatCredentialReady(result) => {
                Self::continue_chat_turn(model, caps, result);
            }
            Event::ChatReplyReceived(result) => Self::finish_chat_turn(model, result),
            Event::SuggestionApplied {
                message_id,
                card_index,
            } => Self::apply_suggestion(model, &message_id, card_index),

            Event::PositionResolved(result) => Self::fetch_nearby_hazards(model, caps, result),
            Event::HazardsFetched(result) => Self::store_hazards(model, result),
            Event::HazardSelected { hazard_id } => Self::select_hazard(model, caps, hazard_id),
            Event::VerificationFetched { hazard_id, result } => {
                Self::store_verification(model, hazard_id, result);
            }
            Event::VoteSubmitted { vote } => Self::submit_vote(model, caps, vote),
            Event::VoteReplacementDeleted { hazard_id, vote } => {
                Self::complete_vote_replacement(model, caps, hazard_id, vote);
            }
            Event::VoteMutationCompleted { hazard_id, result } => {
                Self::finish_vote_mutation(model, caps, hazard_id, result);
            }
            Event::HazardRefreshed { hazard_id, result } => {
                Self::refresh_hazard(model, hazard_id, result);
            }

            Event::SosPinModeChanged { enabled } => model.is_sos_pin_mode = enabled,
            Event::SosPinDropped { position } => Self::drop_sos_pin(model, caps, position),
            Event::SosPinSelected { index } => {
                if index < model.sos_pins.len() {
                    model.selected_sos_index = Some(index);
                    model.is_sos_popup_open = true;
                } else {
                    debug!(index, "selection outside pin list ignored");
                }
            }
            Event::SosPinRemoved { index } => {
                if let Some(removed) = model.remove_sos_pin(index) {
                    if let Some(event_id) = removed.event_id {
                        Self::delete_sos_event(model, caps, event_id);
                    }
                }
            }
            Event::SosPinsCleared => {
                for event_id in model.clear_sos_pins() {
                    Self::delete_sos_event(model, caps, event_id);
                }
            }
            Event::SosPopupClosed => model.is_sos_popup_open = false,
            Event::SosEventsLoaded(result) => Self::seed_sos_pins(model, result),
            Event::SosCreateCompleted { pin_id, result } => {
                Self::finish_sos_create(model, caps, &pin_id, result);
            }
            Event::SosDeleteCompleted { event_id, result } => match result {
                Ok(()) => debug!(event = %event_id, "SOS event deleted"),
                Err(error) => warn!(%error, event = %event_id, "SOS event delete failed"),
            },

            Event::ErrorDismissed => model.clear_error(),
        }

        caps.render.render();
    }

    fn view(&self, model: &Self::Model) -> Self::ViewModel {
        ViewModel::from_model(model)
    }
}

// --- Session & bootstrap ---

impl App {
    fn establish_session(model: &mut Model, caps: &Capabilities, user_id: String) {
        let user_id = UserId::new(user_id);
        model.session = Some(Session {
            user_id: user_id.clone(),
        });

        // One-shot per session: hazard overlay fetch and SOS pin seeding.
        if !model.hazards_requested {
            model.hazards_requested = true;
            caps.geolocation.current_position(Event::PositionResolved);
        }
        if !model.sos_seeded {
            model.sos_seeded = true;
            caps.sos
                .list_by_user(user_id, model.config.request_timeout_ms, Event::SosEventsLoaded);
        }
    }

    fn clear_session(model: &mut Model) {
        model.session = None;
        model.hazards_requested = false;
        model.sos_seeded = false;
        model.hazards.clear();
        model.selected_hazard = None;
        model.is_hazard_detail_open = false;
        model.verification_panel = VerificationPanel::Idle;
        model.sos_pins.clear();
        model.selected_sos_index = None;
        model.is_sos_popup_open = false;
    }
}

// --- Route acquisition pipeline ---

impl App {
    /// Single-flight trigger: both endpoints set, directions collaborator
    /// ready, nothing already in flight. Anything else is a no-op; the
    /// next readiness or endpoint change retries.
    fn maybe_request_route(model: &mut Model, caps: &Capabilities) {
        if model.route_request_in_flight || !model.directions_ready {
            return;
        }
        let Some((origin, destination)) = model.route_endpoints() else {
            return;
        };

        model.route_request_in_flight = true;
        model.is_loading_route = true;
        caps.directions.compute_routes(
            RouteQuery {
                origin,
                destination,
                provide_alternatives: true,
                timeout_ms: model.config.request_timeout_ms,
            },
            Event::RoutesComputed,
        );
    }

    fn commit_routes(model: &mut Model, caps: &Capabilities, result: DirectionsResult) {
        model.is_loading_route = false;

        match result {
            Ok(response) if !response.routes.is_empty() => {
                let endpoints = model.route_endpoints();
                model.active_route = Some(build_route(&response.routes[0], 0, endpoints));
                model.alternate_route = response
                    .routes
                    .get(1)
                    .map(|route| build_route(route, 1, endpoints));
                // A new route always takes the user back to route review.
                model.view_mode = ViewMode::Routing;
                model.clear_error();

                // Best-effort AI assessment; the geometric result above
                // already stands on its own.
                caps.auth.bearer_token(Event::EnhanceCredentialReady);
            }
            Ok(_) => {
                warn!("directions returned no routes");
                model.set_error(ROUTE_UNAVAILABLE_ERROR);
                model.route_request_in_flight = false;
            }
            Err(error) => {
                warn!(%error, "directions request failed");
                model.set_error(ROUTE_UNAVAILABLE_ERROR);
                model.route_request_in_flight = false;
            }
        }
    }

    fn request_enhancement(model: &mut Model, caps: &Capabilities, result: AuthResult) {
        if model.active_route.is_none() {
            model.route_request_in_flight = false;
            return;
        }
        match result {
            Ok(token) => {
                let request =
                    build_assistant_request(model, SAFETY_ANALYSIS_PROMPT.to_string());
                caps.assistant.converse(
                    token,
                    request,
                    model.config.request_timeout_ms,
                    Event::RoutesEnhanced,
                );
            }
            Err(error) => {
                debug!(%error, "no credential for route assessment; baseline routes stand");
                model.route_request_in_flight = false;
            }
        }
    }

    fn apply_enhancement(model: &mut Model, result: AssistantResult) {
        model.route_request_in_flight = false;

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, "route assessment failed; baseline routes stand");
                return;
            }
        };

        let tier_of = |option: &crate::capabilities::AssistantRouteOption| {
            RecommendationTier::from_wire(option.recommendation_tier.as_deref())
        };

        let recommended = response
            .route_options
            .iter()
            .find(|option| tier_of(option) == RecommendationTier::Recommended);
        if let (Some(option), Some(route)) = (recommended, model.active_route.as_mut()) {
            route.apply_assessment(
                option.distance_meters,
                option.duration_seconds,
                option.safety_score,
            );
        }

        let other = response
            .route_options
            .iter()
            .find(|option| tier_of(option) != RecommendationTier::Recommended);
        if let (Some(option), Some(route)) = (other, model.alternate_route.as_mut()) {
            route.apply_assessment(
                option.distance_meters,
                option.duration_seconds,
                option.safety_score,
            );
        }
    }
}

// --- Chat / assistant pipeline ---

impl App {
    fn toggle_chat(model: &mut Model, caps: &Capabilities, open: bool) {
        model.is_chat_open = open;
        model.view_mode = if open {
            ViewMode::Chat
        } else if model.active_route.is_some() {
            ViewMode::Routing
        } else {
            ViewMode::Browse
        };
        if open {
            Self::maybe_auto_ask(model, caps);
        }
    }

    /// Fires the synthesized route request once per rounded
    /// (origin, destination) pair; re-entering chat with the same pair is
    /// silent.
    fn maybe_auto_ask(model: &mut Model, caps: &Capabilities) {
        if model.is_chat_sending {
            return;
        }
        let Some((origin, destination)) = model.route_endpoints() else {
            return;
        };
        let key = route_pair_key(origin, destination);
        if !model.auto_asked_pairs.insert(key) {
            return;
        }
        let from = location_phrase(&model.origin, origin);
        let to = location_phrase(&model.destination, destination);
        let prompt = format!("Find me the safest route from {from} to {to}.");
        Self::send_chat_turn(model, caps, prompt);
    }

    fn send_chat_turn(model: &mut Model, caps: &Capabilities, text: String) {
        if model.is_chat_sending {
            debug!("chat turn already in flight");
            return;
        }

        // The user's message lands in the transcript no matter what
        // happens to the assistant turn.
        model.chat_messages.push(ChatMessage::user(text.clone()));

        if !model.is_authenticated() {
            model.set_error(SIGN_IN_REQUIRED_ERROR);
            return;
        }

        model.is_chat_sending = true;
        model.pending_chat = Some(text);
        caps.auth.bearer_token(Event::ChatCredentialReady);
    }

    fn continue_chat_turn(model: &mut Model, caps: &Capabilities, result: AuthResult) {
        let Some(text) = model.pending_chat.take() else {
            debug!("credential arrived with no pending chat turn");
            return;
        };
        match result {
            Ok(token) => {
                let request = build_assistant_request(model, text);
                caps.assistant.converse(
                    token,
                    request,
                    model.config.request_timeout_ms,
                    Event::ChatReplyReceived,
                );
            }
            Err(error) => {
                warn!(%error, "could not obtain assistant credential");
                model
                    .chat_messages
                    .push(ChatMessage::assistant(ASSISTANT_UNREACHABLE_REPLY, Vec::new()));
                model.is_chat_sending = false;
            }
        }
    }

    fn finish_chat_turn(model: &mut Model, result: AssistantResult) {
        model.is_chat_sending = false;
        match result {
            Ok(response) => {
                let cards: Vec<RouteSuggestion> = response
                    .route_options
                    .iter()
                    .enumerate()
                    .map(|(index, option)| RouteSuggestion::from_option(index, option))
                    .collect();
                let content = if response.reply.trim().is_empty() {
                    EMPTY_REPLY_FALLBACK.to_string()
                } else {
                    response.reply
                };
                model
                    .chat_messages
                    .push(ChatMessage::assistant(content, cards));
            }
            Err(error) => {
                warn!(%error, "assistant turn failed");
                model
                    .chat_messages
                    .push(ChatMessage::assistant(ASSISTANT_UNREACHABLE_REPLY, Vec::new()));
            }
        }
    }

    fn apply_suggestion(model: &mut Model, message_id: &ChatMessageId, card_index: usize) {
        let card = model
            .chat_messages
            .iter()
            .find(|message| &message.id == message_id)
            .and_then(|message| message.cards.get(card_index))
            .cloned();
        let Some(card) = card else {
            debug!("suggestion card not found");
            return;
        };

        let path = card
            .polyline
            .as_deref()
            .map(polyline::decode)
            .unwrap_or_default();
        if path.is_empty() {
            model.set_error(MISSING_POLYLINE_ERROR);
            return;
        }

        let from_position = model.origin.position.unwrap_or(path[0]);
        let to_position = model.destination.position.unwrap_or(path[path.len() - 1]);

        model.active_route = Some(Route {
            id: RouteId::generate(),
            name: card.name.clone(),
            from_label: label_or(&model.origin, "Origin"),
            to_label: label_or(&model.destination, "Destination"),
            from_position,
            to_position,
            distance_miles: card.distance_miles,
            eta_minutes: card.eta_minutes,
            safety_percent: 0,
            kind: RouteKind::Safest,
            path,
            steps: Vec::new(),
            description: card.summary.clone().unwrap_or_default(),
        });
        model.alternate_route = None;
        model.view_mode = ViewMode::Routing;
        model.is_chat_open = false;
        model.clear_error();
    }
}

// --- Hazard overlay & verification subsystem ---

impl App {
    fn fetch_nearby_hazards(model: &Model, caps: &Capabilities, result: GeolocationResult) {
        let position = match result {
            Ok(position) if position.is_valid() => position,
            Ok(position) => {
                warn!(?position, "implausible device position; using default center");
                DEFAULT_CENTER
            }
            Err(error) => {
                debug!(%error, "geolocation unavailable; using default center");
                DEFAULT_CENTER
            }
        };
        caps.hazards.nearby(
            NearbyQuery {
                longitude: position.lng,
                latitude: position.lat,
                radius_meters: model.config.hazard_search_radius_m,
                timeout_ms: model.config.request_timeout_ms,
            },
            Event::HazardsFetched,
        );
    }

    fn store_hazards(model: &mut Model, result: HazardListResult) {
        match result {
            Ok(reports) => {
                model.hazards = reports.iter().map(Hazard::from_report).collect();
            }
            Err(error) => warn!(%error, "hazard fetch failed"),
        }
    }

    fn select_hazard(model: &mut Model, caps: &Capabilities, hazard_id: Option<HazardId>) {
        match hazard_id {
            Some(id) => {
                if !model.hazards.iter().any(|hazard| hazard.id == id) {
                    debug!(hazard = %id, "unknown hazard selected");
                    return;
                }
                model.selected_hazard = Some(id.clone());
                model.is_hazard_detail_open = true;
                Self::request_verification(model, caps, id);
            }
            None => {
                model.selected_hazard = None;
                model.is_hazard_detail_open = false;
                model.verification_panel = VerificationPanel::Idle;
            }
        }
    }

    fn request_verification(model: &mut Model, caps: &Capabilities, hazard_id: HazardId) {
        let Some(session) = &model.session else {
            model.verification_panel = VerificationPanel::Loaded(None);
            return;
        };
        model.verification_panel = VerificationPanel::Pending;
        let user_id = session.user_id.clone();
        let id_for_event = hazard_id.clone();
        caps.hazards.verification(
            hazard_id,
            user_id,
            model.config.request_timeout_ms,
            move |result| Event::VerificationFetched {
                hazard_id: id_for_event,
                result,
            },
        );
    }

    fn store_verification(
        model: &mut Model,
        hazard_id: HazardId,
        result: VerificationFetchResult,
    ) {
        if model.selected_hazard.as_ref() != Some(&hazard_id) {
            debug!(hazard = %hazard_id, "stale verification result ignored");
            return;
        }
        match result {
            Ok(record) => {
                model.verification_panel =
                    VerificationPanel::Loaded(record.map(into_verification));
            }
            Err(error) => {
                warn!(%error, "verification fetch failed");
                model.verification_panel = VerificationPanel::Loaded(None);
            }
        }
    }

    /// Toggle/replace semantics: same vote again deletes it, the other
    /// vote deletes the old one first, a fresh vote just creates. The
    /// remote invariant is at most one verification per (hazard, user).
    fn submit_vote(model: &mut Model, caps: &Capabilities, vote: VoteKind) {
        let Some(hazard_id) = model.selected_hazard.clone() else {
            return;
        };
        let Some(session) = model.session.clone() else {
            model.set_error(SIGN_IN_REQUIRED_ERROR);
            return;
        };
        let VerificationPanel::Loaded(current) = model.verification_panel.clone() else {
            debug!("vote ignored while verification state is pending");
            return;
        };

        let timeout_ms = model.config.request_timeout_ms;
        model.verification_panel = VerificationPanel::Pending;

        match current {
            Some(existing) if existing.vote == vote => {
                caps.hazards
                    .delete_verification(existing.id, timeout_ms, move |result| {
                        Event::VoteMutationCompleted { hazard_id, result }
                    });
            }
            Some(existing) => {
                caps.hazards
                    .delete_verification(existing.id, timeout_ms, move |result| match result {
                        Ok(()) => Event::VoteReplacementDeleted { hazard_id, vote },
                        Err(error) => Event::VoteMutationCompleted {
                            hazard_id,
                            result: Err(error),
                        },
                    });
            }
            None => {
                let id_for_operation = hazard_id.clone();
                caps.hazards.create_verification(
                    id_for_operation,
                    session.user_id,
                    vote,
                    timeout_ms,
                    move |result| Event::VoteMutationCompleted { hazard_id, result },
                );
            }
        }
    }

    fn complete_vote_replacement(
        model: &mut Model,
        caps: &Capabilities,
        hazard_id: HazardId,
        vote: VoteKind,
    ) {
        let Some(session) = model.session.clone() else {
            return;
        };
        let id_for_operation = hazard_id.clone();
        caps.hazards.create_verification(
            id_for_operation,
            session.user_id,
            vote,
            model.config.request_timeout_ms,
            move |result| Event::VoteMutationCompleted { hazard_id, result },
        );
    }

    fn finish_vote_mutation(
        model: &mut Model,
        caps: &Capabilities,
        hazard_id: HazardId,
        result: VoteMutationResult,
    ) {
        if let Err(error) = result {
            warn!(%error, hazard = %hazard_id, "verification mutation failed");
        }

        // Re-fetch for the authoritative verification id.
        if model.selected_hazard.as_ref() == Some(&hazard_id) {
            Self::request_verification(model, caps, hazard_id.clone());
        }

        // Report-count refresh is non-critical; a failure leaves the
        // stale count until the next open.
        let id_for_event = hazard_id.clone();
        caps.hazards.get(
            hazard_id,
            model.config.request_timeout_ms,
            move |result| Event::HazardRefreshed {
                hazard_id: id_for_event,
                result,
            },
        );
    }

    fn refresh_hazard(model: &mut Model, hazard_id: HazardId, result: HazardFetchResult) {
        match result {
            Ok(report) => {
                if let Some(hazard) = model.hazard_mut(&hazard_id) {
                    hazard.refresh_report_count(report.verification_count.unwrap_or(0));
                }
            }
            Err(error) => debug!(%error, "hazard refresh failed; stale report count stands"),
        }
    }
}

// --- SOS pin subsystem ---

impl App {
    fn drop_sos_pin(model: &mut Model, caps: &Capabilities, position: LatLng) {
        if !model.is_sos_pin_mode {
            debug!("map tap outside pin-drop mode ignored");
            return;
        }

        let pin = SosPin::at(position);
        let pin_id = pin.id.clone();
        model.add_sos_pin(pin);

        let Some(session) = &model.session else {
            warn!("SOS pin dropped without a session; pin stays local");
            return;
        };

        let event = SosEventRecord {
            id: None,
            user_id: session.user_id.as_str().to_string(),
            latitude: position.lat,
            longitude: position.lng,
            location_accuracy_meters: DEFAULT_SOS_ACCURACY_M,
            status: Some(SosEventStatus::Active),
            triggered_at: None,
            resolved_at: None,
        };
        caps.sos
            .create(event, model.config.request_timeout_ms, move |result| {
                Event::SosCreateCompleted { pin_id, result }
            });
    }

    fn finish_sos_create(
        model: &mut Model,
        caps: &Capabilities,
        pin_id: &SosPinId,
        result: SosCreateResult,
    ) {
        match result {
            Ok(record) => {
                let Some(event_id) = record.id.map(SosEventId::new) else {
                    warn!("SOS event created without an id");
                    return;
                };
                if !model.assign_sos_event_id(pin_id, event_id.clone()) {
                    // The pin was removed while its creation was in
                    // flight; clean up the orphaned remote event.
                    debug!(event = %event_id, "pin gone before sync; deleting remote event");
                    Self::delete_sos_event(model, caps, event_id);
                }
            }
            Err(error) => {
                warn!(%error, "SOS event creation failed; pin stays unsynced");
            }
        }
    }

    fn seed_sos_pins(model: &mut Model, result: SosListResult) {
        let events = match result {
            Ok(events) => events,
            Err(error) => {
                warn!(%error, "could not load existing SOS events");
                return;
            }
        };

        let pins: Vec<SosPin> = events
            .iter()
            .filter(|event| !event.is_resolved())
            .filter_map(|event| {
                event.id.clone().map(|id| SosPin {
                    id: SosPinId::generate(),
                    position: LatLng::new(event.latitude, event.longitude),
                    event_id: Some(SosEventId::new(id)),
                })
            })
            .collect();

        if model.sos_pins.is_empty() {
            model.selected_sos_index = if pins.is_empty() { None } else { Some(0) };
            model.sos_pins = pins;
        } else {
            // Pins dropped before the seed arrived stay put.
            model.sos_pins.extend(pins);
        }
    }

    fn delete_sos_event(model: &Model, caps: &Capabilities, event_id: SosEventId) {
        let id_for_event = event_id.clone();
        caps.sos
            .delete(event_id, model.config.request_timeout_ms, move |result| {
                Event::SosDeleteCompleted {
                    event_id: id_for_event,
                    result,
                }
            });
    }
}

// --- Shared helpers ---

fn build_assistant_request(model: &Model, message: String) -> AssistantRequest {
    let mut request = AssistantRequest {
        message,
        ..AssistantRequest::default()
    };
    if let Some((origin, destination)) = model.route_endpoints() {
        request.origin_latitude = Some(origin.lat);
        request.origin_longitude = Some(origin.lng);
        request.destination_latitude = Some(destination.lat);
        request.destination_longitude = Some(destination.lng);
        if !model.origin.text.is_empty() {
            request.origin_address = Some(model.origin.text.clone());
        }
        if !model.destination.text.is_empty() {
            request.destination_address = Some(model.destination.text.clone());
        }
        request.vehicle_type = Some(VehicleType::Car);
    }
    request
}

fn build_route(
    route: &DirectionsRoute,
    index: usize,
    endpoints: Option<(LatLng, LatLng)>,
) -> Route {
    let first_leg = route.legs.first();
    let distance_meters = first_leg.map_or(0.0, |leg| leg.distance_meters);
    let duration_seconds = first_leg.map_or(0.0, |leg| leg.duration_seconds);

    let path: Vec<LatLng> = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .flat_map(|step| step.path.iter().copied())
        .collect();
    let steps: Vec<RouteStep> = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(|step| RouteStep {
            instruction: strip_markup(&step.instruction),
            distance_text: step.distance_text.clone(),
            duration_text: step.duration_text.clone(),
            maneuver: step.maneuver.clone(),
            start: step.start,
            end: step.end,
        })
        .collect();

    let (from_position, to_position) = endpoints.unwrap_or_else(|| {
        (
            path.first().copied().unwrap_or_default(),
            path.last().copied().unwrap_or_default(),
        )
    });

    let is_safest = index == 0;
    Route {
        id: RouteId::generate(),
        name: if is_safest {
            "Safest Route".to_string()
        } else {
            "Fastest Route".to_string()
        },
        from_label: first_leg
            .and_then(|leg| leg.start_address.clone())
            .unwrap_or_else(|| "Origin".to_string()),
        to_label: first_leg
            .and_then(|leg| leg.end_address.clone())
            .unwrap_or_else(|| "Destination".to_string()),
        from_position,
        to_position,
        distance_miles: meters_to_miles(distance_meters),
        eta_minutes: seconds_to_minutes(duration_seconds),
        safety_percent: 0,
        kind: if is_safest {
            RouteKind::Safest
        } else {
            RouteKind::Fastest
        },
        path,
        steps,
        description: route.summary.clone().unwrap_or_default(),
    }
}

fn into_verification(record: VerificationRecord) -> Verification {
    Verification {
        id: VerificationId::new(record.id),
        vote: record.verification_type,
    }
}

fn label_or(field: &LocationField, fallback: &str) -> String {
    if field.text.is_empty() {
        fallback.to_string()
    } else {
        field.text.clone()
    }
}

fn location_phrase(field: &LocationField, position: LatLng) -> String {
    if field.text.is_empty() {
        format!("{:.5}, {:.5}", position.lat, position.lng)
    } else {
        field.text.clone()
    }
}

/// Turn-by-turn instructions arrive with display markup; strip it.
fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{DirectionsLeg, DirectionsStep};

    #[test]
    fn markup_is_stripped_from_instructions() {
        assert_eq!(
            strip_markup("Turn <b>left</b> onto <div class=\"x\">Main St</div>"),
            "Turn left onto Main St"
        );
        assert_eq!(strip_markup("plain"), "plain");
    }

    #[test]
    fn first_route_is_safest_second_is_fastest() {
        let wire_route = DirectionsRoute {
            summary: Some("I-95".into()),
            legs: vec![DirectionsLeg {
                distance_meters: 5000.0,
                duration_seconds: 600.0,
                start_address: Some("1 Main St".into()),
                end_address: Some("9 Oak Ave".into()),
                steps: vec![DirectionsStep {
                    instruction: "Head <b>north</b>".into(),
                    distance_text: "0.3 mi".into(),
                    duration_text: "1 min".into(),
                    maneuver: None,
                    start: LatLng::new(40.71, -74.0),
                    end: LatLng::new(40.72, -73.99),
                    path: vec![LatLng::new(40.71, -74.0), LatLng::new(40.72, -73.99)],
                }],
            }],
        };

        let endpoints = Some((LatLng::new(40.71, -74.0), LatLng::new(40.72, -73.99)));
        let active = build_route(&wire_route, 0, endpoints);
        assert_eq!(active.name, "Safest Route");
        assert_eq!(active.kind, RouteKind::Safest);
        assert_eq!(active.safety_percent, 0);
        assert!((active.distance_miles - 3.1).abs() < f64::EPSILON);
        assert_eq!(active.eta_minutes, 10);
        assert_eq!(active.path.len(), 2);
        assert_eq!(active.steps[0].instruction, "Head north");
        assert_eq!(active.from_label, "1 Main St");

        let alternate = build_route(&wire_route, 1, endpoints);
        assert_eq!(alternate.name, "Fastest Route");
        assert_eq!(alternate.kind, RouteKind::Fastest);
    }

    #[test]
    fn endpoints_fall_back_to_path_extremes() {
        let wire_route = DirectionsRoute {
            summary: None,
            legs: vec![DirectionsLeg {
                distance_meters: 100.0,
                duration_seconds: 60.0,
                start_address: None,
                end_address: None,
                steps: vec![DirectionsStep {
                    instruction: String::new(),
                    distance_text: String::new(),
                    duration_text: String::new(),
                    maneuver: None,
                    start: LatLng::new(1.0, 2.0),
                    end: LatLng::new(3.0, 4.0),
                    path: vec![LatLng::new(1.0, 2.0), LatLng::new(3.0, 4.0)],
                }],
            }],
        };
        let route = build_route(&wire_route, 0, None);
        assert_eq!(route.from_position, LatLng::new(1.0, 2.0));
        assert_eq!(route.to_position, LatLng::new(3.0, 4.0));
        assert_eq!(route.from_label, "Origin");
    }
}
