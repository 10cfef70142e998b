use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capabilities::{AssistantRouteOption, HazardReport};
use crate::geo::{meters_to_miles, seconds_to_minutes, LatLng};
use crate::{
    current_time_ms, DEFAULT_REQUEST_TIMEOUT_MS, HAZARD_SEARCH_RADIUS_M, HAZARD_TITLE_MAX_CHARS,
};

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(UserId);
typed_id!(HazardId);
typed_id!(RouteId);
typed_id!(ChatMessageId);
typed_id!(VerificationId);
typed_id!(SosPinId);
typed_id!(SosEventId);

impl RouteId {
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("route-{}", Uuid::new_v4()))
    }
}

impl ChatMessageId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl SosPinId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

// --- Session ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
}

// --- View mode ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Browse,
    Routing,
    Navigating,
    Chat,
}

impl ViewMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::Routing => "routing",
            Self::Navigating => "navigating",
            Self::Chat => "chat",
        }
    }
}

// --- Hazards ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Parses the collaborator's upper-case severity; anything
    /// unrecognized reads as `Low`.
    #[must_use]
    pub fn from_report(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "CRITICAL" => Self::Critical,
            "HIGH" => Self::High,
            "MEDIUM" => Self::Medium,
            _ => Self::Low,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Display title: first sentence of the description, truncated to
/// [`HAZARD_TITLE_MAX_CHARS`] with an ellipsis.
#[must_use]
pub fn derive_hazard_title(description: &str) -> String {
    let first_sentence = description.split('.').next().unwrap_or(description).trim();
    let mut title: String = first_sentence.chars().take(HAZARD_TITLE_MAX_CHARS).collect();
    if first_sentence.chars().count() > HAZARD_TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: HazardId,
    pub position: LatLng,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub reported_at: Option<String>,
    /// Verified reports plus one for the original report.
    pub report_count: u32,
}

impl Hazard {
    #[must_use]
    pub fn from_report(report: &HazardReport) -> Self {
        Self {
            id: HazardId::new(report.id.clone().unwrap_or_default()),
            position: LatLng::new(report.latitude, report.longitude),
            severity: Severity::from_report(report.severity.as_deref().unwrap_or_default()),
            title: derive_hazard_title(&report.description),
            description: report.description.clone(),
            image_url: report.image_url.clone(),
            reported_at: report.created_at.clone(),
            report_count: report.verification_count.unwrap_or(0) + 1,
        }
    }

    pub fn refresh_report_count(&mut self, verification_count: u32) {
        self.report_count = verification_count + 1;
    }
}

// --- Hazard verification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteKind {
    Confirm,
    Dispute,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub id: VerificationId,
    pub vote: VoteKind,
}

/// Vote-control state for the currently open hazard detail.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerificationPanel {
    #[default]
    Idle,
    /// A fetch or mutation is in flight; both vote controls are disabled.
    Pending,
    Loaded(Option<Verification>),
}

impl VerificationPanel {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn active_vote(&self) -> Option<VoteKind> {
        match self {
            Self::Loaded(Some(verification)) => Some(verification.vote),
            _ => None,
        }
    }
}

// --- Routes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Safest,
    Fastest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction: String,
    pub distance_text: String,
    pub duration_text: String,
    pub maneuver: Option<String>,
    pub start: LatLng,
    pub end: LatLng,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    pub from_label: String,
    pub to_label: String,
    pub from_position: LatLng,
    pub to_position: LatLng,
    pub distance_miles: f64,
    pub eta_minutes: u32,
    /// 0–100; 0 means "not yet assessed".
    pub safety_percent: u8,
    pub kind: RouteKind,
    pub path: Vec<LatLng>,
    pub steps: Vec<RouteStep>,
    pub description: String,
}

impl Route {
    /// Supersedes distance/duration/safety in place from an AI
    /// assessment. The geometric path and steps are never touched.
    pub fn apply_assessment(
        &mut self,
        distance_meters: Option<f64>,
        duration_seconds: Option<f64>,
        safety_score: Option<f64>,
    ) {
        if let Some(meters) = distance_meters {
            self.distance_miles = meters_to_miles(meters);
        }
        if let Some(seconds) = duration_seconds {
            self.eta_minutes = seconds_to_minutes(seconds);
        }
        if let Some(score) = safety_score {
            self.safety_percent = clamp_safety(score);
        }
    }
}

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_safety(score: f64) -> u8 {
    if !score.is_finite() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnInstruction {
    pub direction: TurnDirection,
    pub distance_miles: f64,
    pub street_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnDirection {
    Left,
    Right,
    Straight,
    UTurn,
    Arrive,
}

// --- Chat ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyBadge {
    Safe,
    Caution,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationTier {
    Recommended,
    Alternative,
    Risky,
}

impl RecommendationTier {
    /// Absent or unrecognized tiers read as `Alternative`.
    #[must_use]
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_uppercase).as_deref() {
            Some("RECOMMENDED") => Self::Recommended,
            Some("RISKY") => Self::Risky,
            _ => Self::Alternative,
        }
    }

    #[must_use]
    pub const fn badge(self) -> SafetyBadge {
        match self {
            Self::Recommended => SafetyBadge::Safe,
            Self::Risky => SafetyBadge::Danger,
            Self::Alternative => SafetyBadge::Caution,
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Recommended => "Recommended",
            Self::Alternative => "Alternative",
            Self::Risky => "Risky",
        }
    }

    #[must_use]
    pub const fn terrain_label(self) -> &'static str {
        match self {
            Self::Recommended => "Maintained roads",
            Self::Alternative => "Mixed conditions",
            Self::Risky => "Hazard-prone roads",
        }
    }
}

/// Display-ready projection of one AI-proposed route option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSuggestion {
    pub name: String,
    pub distance_miles: f64,
    pub eta_minutes: u32,
    pub safety_badge: SafetyBadge,
    pub terrain: String,
    pub tags: Vec<String>,
    pub polyline: Option<String>,
    pub summary: Option<String>,
    pub tier: RecommendationTier,
    pub hazard_count: u32,
}

impl RouteSuggestion {
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_option(index: usize, option: &AssistantRouteOption) -> Self {
        let tier = RecommendationTier::from_wire(option.recommendation_tier.as_deref());
        let hazard_count = option.hazard_count.map_or(0, |count| count.max(0) as u32);
        let eta_minutes = match option.duration_seconds {
            Some(seconds) if seconds > 0.0 => seconds_to_minutes(seconds).max(1),
            _ => 0,
        };
        let name = option
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("Route Option {}", index + 1));

        let mut tags = vec![tier.display_name().to_string()];
        if hazard_count > 0 {
            tags.push(format!("{hazard_count} hazards"));
        }

        Self {
            name,
            distance_miles: option.distance_meters.map_or(0.0, meters_to_miles),
            eta_minutes,
            safety_badge: tier.badge(),
            terrain: tier.terrain_label().to_string(),
            tags,
            polyline: option.polyline.clone(),
            summary: option.summary.clone(),
            tier,
            hazard_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub role: ChatRole,
    pub content: String,
    pub timestamp_ms: u64,
    pub cards: Vec<RouteSuggestion>,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: ChatMessageId::generate(),
            role: ChatRole::User,
            content: content.into(),
            timestamp_ms: current_time_ms(),
            cards: Vec::new(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>, cards: Vec<RouteSuggestion>) -> Self {
        Self {
            id: ChatMessageId::generate(),
            role: ChatRole::Ai,
            content: content.into(),
            timestamp_ms: current_time_ms(),
            cards,
        }
    }
}

// --- SOS pins ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosPin {
    /// Locally-generated stable identity; remote reconciliation is
    /// addressed by this id, never by list index.
    pub id: SosPinId,
    pub position: LatLng,
    /// Absent until the create-on-backend round trip completes.
    pub event_id: Option<SosEventId>,
}

impl SosPin {
    #[must_use]
    pub fn at(position: LatLng) -> Self {
        Self {
            id: SosPinId::generate(),
            position,
            event_id: None,
        }
    }

    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.event_id.is_some()
    }
}

// --- Location input fields ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationField {
    pub text: String,
    pub position: Option<LatLng>,
}

// --- Configuration ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Deadline the shell enforces on every collaborator call. A hung
    /// call reports `ErrorKind::Timeout` instead of leaving a loading
    /// flag stuck forever.
    pub request_timeout_ms: u64,
    pub hazard_search_radius_m: f64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            hazard_search_radius_m: HAZARD_SEARCH_RADIUS_M,
        }
    }
}

// --- Model ---

/// The single shared view-state machine. Mutated only inside
/// `App::update`; every async pipeline reads the latest snapshot and
/// re-enters through an [`crate::event::Event`].
#[derive(Debug, Default)]
pub struct Model {
    pub config: CoreConfig,
    pub session: Option<Session>,

    pub view_mode: ViewMode,
    pub error: Option<String>,

    pub origin: LocationField,
    pub destination: LocationField,
    pub directions_ready: bool,
    pub is_loading_route: bool,
    /// Single-flight guard covering acquisition plus enhancement.
    pub route_request_in_flight: bool,
    pub active_route: Option<Route>,
    pub alternate_route: Option<Route>,

    pub hazards: Vec<Hazard>,
    pub hazards_requested: bool,
    pub selected_hazard: Option<HazardId>,
    pub is_hazard_detail_open: bool,
    pub is_hazard_alert_visible: bool,
    pub verification_panel: VerificationPanel,

    pub chat_messages: Vec<ChatMessage>,
    pub is_chat_open: bool,
    pub is_chat_sending: bool,
    pub pending_chat: Option<String>,
    pub auto_asked_pairs: HashSet<String>,

    pub current_instruction: Option<TurnInstruction>,

    pub sos_pins: Vec<SosPin>,
    pub selected_sos_index: Option<usize>,
    pub is_sos_popup_open: bool,
    pub is_sos_pin_mode: bool,
    pub sos_seeded: bool,
}

impl Model {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    #[must_use]
    pub fn selected_hazard(&self) -> Option<&Hazard> {
        let id = self.selected_hazard.as_ref()?;
        self.hazards.iter().find(|hazard| &hazard.id == id)
    }

    #[must_use]
    pub fn hazard_mut(&mut self, id: &HazardId) -> Option<&mut Hazard> {
        self.hazards.iter_mut().find(|hazard| &hazard.id == id)
    }

    #[must_use]
    pub fn route_endpoints(&self) -> Option<(LatLng, LatLng)> {
        Some((self.origin.position?, self.destination.position?))
    }

    /// Appends a pin, auto-selects it, opens the popup, and exits
    /// pin-drop mode.
    pub fn add_sos_pin(&mut self, pin: SosPin) {
        self.sos_pins.push(pin);
        self.selected_sos_index = Some(self.sos_pins.len() - 1);
        self.is_sos_popup_open = true;
        self.is_sos_pin_mode = false;
    }

    /// Removes the pin at `index`, re-clamping the selection to
    /// `min(index, len - 1)` or clearing it when the list empties. The
    /// popup stays open only while pins remain.
    pub fn remove_sos_pin(&mut self, index: usize) -> Option<SosPin> {
        if index >= self.sos_pins.len() {
            return None;
        }
        let removed = self.sos_pins.remove(index);
        self.selected_sos_index = if self.sos_pins.is_empty() {
            None
        } else {
            Some(index.min(self.sos_pins.len() - 1))
        };
        self.is_sos_popup_open = !self.sos_pins.is_empty();
        Some(removed)
    }

    /// Clears every pin and returns the event ids that still need a
    /// best-effort remote delete.
    pub fn clear_sos_pins(&mut self) -> Vec<SosEventId> {
        let event_ids = self
            .sos_pins
            .drain(..)
            .filter_map(|pin| pin.event_id)
            .collect();
        self.selected_sos_index = None;
        self.is_sos_popup_open = false;
        event_ids
    }

    /// In-place event-id assignment addressed by stable pin id; list
    /// order and selection are untouched. Returns false when the pin was
    /// removed before its creation round trip finished.
    pub fn assign_sos_event_id(&mut self, pin_id: &SosPinId, event_id: SosEventId) -> bool {
        match self.sos_pins.iter_mut().find(|pin| &pin.id == pin_id) {
            Some(pin) => {
                pin.event_id = Some(event_id);
                true
            }
            None => false,
        }
    }
}
