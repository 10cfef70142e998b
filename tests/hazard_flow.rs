use crux_core::testing::AppTester;

use hazmap_core::capabilities::{
    HazardApiOperation, HazardApiOutput, HazardReport, VerificationRecord,
};
use hazmap_core::error::CollaboratorError;
use hazmap_core::model::{HazardId, Severity, VerificationPanel, VoteKind};
use hazmap_core::{App, Effect, Event, Model, DEFAULT_CENTER, HAZARD_SEARCH_RADIUS_M};

macro_rules! expect_request {
    ($effects:expr, $variant:path) => {
        $effects
            .iter_mut()
            .find_map(|effect| match effect {
                $variant(request) => Some(request),
                _ => None,
            })
            .expect(concat!("expected ", stringify!($variant), " request"))
    };
}

fn report(id: &str, severity: &str, description: &str, verification_count: u32) -> HazardReport {
    HazardReport {
        id: Some(id.into()),
        reporter_id: Some("reporter-1".into()),
        latitude: 40.715,
        longitude: -74.009,
        severity: Some(severity.into()),
        description: description.into(),
        image_url: None,
        created_at: Some("2025-01-03T10:00:00Z".into()),
        verification_count: Some(verification_count),
        affected_radius_meters: Some(50.0),
    }
}

/// Establishes a session and walks the one-shot hazard fetch through a
/// failed geolocation attempt, leaving `reports` in the model.
fn seed_hazards(app: &AppTester<App, Effect>, model: &mut Model, reports: Vec<HazardReport>) {
    let mut effects = app
        .update(
            Event::SessionEstablished {
                user_id: "user-1".into(),
            },
            model,
        )
        .effects;

    let geo_request = expect_request!(effects, Effect::Geolocation);
    let update = app
        .resolve(
            geo_request,
            Err(CollaboratorError::new(
                hazmap_core::ErrorKind::Location,
                "denied",
            )),
        )
        .expect("resolves");
    let event = update.events.into_iter().next().expect("position event");
    let mut effects = app.update(event, model).effects;

    let hazard_request = expect_request!(effects, Effect::Hazards);
    match &hazard_request.operation {
        HazardApiOperation::Nearby(query) => {
            // Geolocation failure falls back to the fixed default point.
            assert!((query.latitude - DEFAULT_CENTER.lat).abs() < f64::EPSILON);
            assert!((query.longitude - DEFAULT_CENTER.lng).abs() < f64::EPSILON);
            assert!((query.radius_meters - HAZARD_SEARCH_RADIUS_M).abs() < f64::EPSILON);
        }
        other => panic!("expected nearby query, got {other:?}"),
    }
    let update = app
        .resolve(hazard_request, Ok(HazardApiOutput::Hazards(reports)))
        .expect("resolves");
    let event = update.events.into_iter().next().expect("hazards event");
    let _ = app.update(event, model);
}

fn verification_record(id: &str, vote: VoteKind) -> VerificationRecord {
    VerificationRecord {
        id: id.into(),
        hazard_id: "h1".into(),
        user_id: "user-1".into(),
        verification_type: vote,
    }
}

/// Opens hazard `h1` and resolves its verification fetch with `current`.
fn open_hazard_with_verification(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    current: Option<VerificationRecord>,
) {
    let mut effects = app
        .update(
            Event::HazardSelected {
                hazard_id: Some(HazardId::new("h1")),
            },
            model,
        )
        .effects;
    let request = expect_request!(effects, Effect::Hazards);
    let update = app
        .resolve(request, Ok(HazardApiOutput::Verification(current)))
        .expect("resolves");
    let event = update.events.into_iter().next().expect("verification event");
    let _ = app.update(event, model);
}

#[test]
fn session_fetch_maps_reports_with_fallback_center() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    seed_hazards(
        &app,
        &mut model,
        vec![
            report(
                "h1",
                "HIGH",
                "Snow accumulation of 12+ inches blocking the right lane. Multiple \
                 vehicles have been getting stuck in this area.",
                2,
            ),
            report("h2", "bogus", "Black ice. Careful.", 0),
        ],
    );

    assert_eq!(model.hazards.len(), 2);
    let first = &model.hazards[0];
    assert_eq!(first.severity, Severity::High);
    assert_eq!(first.report_count, 3);
    // First sentence, truncated to the display budget.
    assert_eq!(
        first.title,
        "Snow accumulation of 12+ inches blocking the right lane"
    );
    assert_eq!(model.hazards[1].severity, Severity::Low);
    assert_eq!(model.hazards[1].title, "Black ice");
}

#[test]
fn hazard_fetch_is_one_shot_per_session() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    seed_hazards(&app, &mut model, vec![report("h1", "LOW", "Pothole.", 0)]);

    let update = app.update(
        Event::SessionEstablished {
            user_id: "user-1".into(),
        },
        &mut model,
    );
    assert!(!update
        .effects
        .iter()
        .any(|effect| matches!(effect, Effect::Geolocation(_))));
}

#[test]
fn fetch_failure_is_absorbed() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let mut effects = app
        .update(
            Event::SessionEstablished {
                user_id: "user-1".into(),
            },
            &mut model,
        )
        .effects;
    let geo_request = expect_request!(effects, Effect::Geolocation);
    let update = app
        .resolve(geo_request, Ok(hazmap_core::LatLng::new(40.7, -74.0)))
        .expect("resolves");
    let event = update.events.into_iter().next().expect("position event");
    let mut effects = app.update(event, &mut model).effects;

    let hazard_request = expect_request!(effects, Effect::Hazards);
    let update = app
        .resolve(hazard_request, Err(CollaboratorError::timeout()))
        .expect("resolves");
    let event = update.events.into_iter().next().expect("hazards event");
    let _ = app.update(event, &mut model);

    // No user-visible error for an overlay fetch; map stays usable.
    assert!(model.error.is_none());
    assert!(model.hazards.is_empty());
}

#[test]
fn selecting_a_hazard_opens_detail_and_loads_verification() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    seed_hazards(&app, &mut model, vec![report("h1", "HIGH", "Flooding.", 1)]);

    let mut effects = app
        .update(
            Event::HazardSelected {
                hazard_id: Some(HazardId::new("h1")),
            },
            &mut model,
        )
        .effects;

    assert!(model.is_hazard_detail_open);
    assert!(model.verification_panel.is_pending());

    // Controls are disabled while the status fetch is pending.
    let view = crux_core::App::view(&App::default(), &model);
    let detail = view.selected_hazard.expect("detail view");
    assert!(!detail.vote.can_confirm);
    assert!(!detail.vote.can_dispute);

    let request = expect_request!(effects, Effect::Hazards);
    match &request.operation {
        HazardApiOperation::GetVerification {
            hazard_id, user_id, ..
        } => {
            assert_eq!(hazard_id, "h1");
            assert_eq!(user_id, "user-1");
        }
        other => panic!("expected verification fetch, got {other:?}"),
    }
    let update = app
        .resolve(request, Ok(HazardApiOutput::Verification(None)))
        .expect("resolves");
    let event = update.events.into_iter().next().expect("verification event");
    let _ = app.update(event, &mut model);

    assert_eq!(model.verification_panel, VerificationPanel::Loaded(None));
    let view = crux_core::App::view(&App::default(), &model);
    let detail = view.selected_hazard.expect("detail view");
    assert!(detail.vote.can_confirm);
    assert!(detail.vote.can_dispute);

    // Clearing the selection closes the panel.
    let _ = app.update(Event::HazardSelected { hazard_id: None }, &mut model);
    assert!(!model.is_hazard_detail_open);
    assert_eq!(model.verification_panel, VerificationPanel::Idle);
}

#[test]
fn fresh_vote_creates_then_resyncs() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    seed_hazards(&app, &mut model, vec![report("h1", "HIGH", "Flooding.", 1)]);
    open_hazard_with_verification(&app, &mut model, None);

    let mut effects = app
        .update(
            Event::VoteSubmitted {
                vote: VoteKind::Confirm,
            },
            &mut model,
        )
        .effects;
    assert!(model.verification_panel.is_pending());

    let request = expect_request!(effects, Effect::Hazards);
    match &request.operation {
        HazardApiOperation::CreateVerification { vote, .. } => {
            assert_eq!(*vote, VoteKind::Confirm);
        }
        other => panic!("expected create, got {other:?}"),
    }
    let update = app
        .resolve(
            request,
            Ok(HazardApiOutput::VerificationSaved(verification_record(
                "v1",
                VoteKind::Confirm,
            ))),
        )
        .expect("resolves");
    let event = update.events.into_iter().next().expect("mutation event");
    let mut effects = app.update(event, &mut model).effects;

    // The mutation is followed by an authoritative re-fetch and a
    // best-effort hazard refresh.
    let mut verification_fetch = None;
    let mut hazard_get = None;
    for effect in &mut effects {
        if let Effect::Hazards(request) = effect {
            match &request.operation {
                HazardApiOperation::GetVerification { .. } => {
                    verification_fetch = Some(request);
                }
                HazardApiOperation::Get { .. } => hazard_get = Some(request),
                other => panic!("unexpected hazard operation {other:?}"),
            }
        }
    }

    let update = app
        .resolve(
            verification_fetch.expect("verification re-fetch"),
            Ok(HazardApiOutput::Verification(Some(verification_record(
                "v1",
                VoteKind::Confirm,
            )))),
        )
        .expect("resolves");
    let event = update.events.into_iter().next().expect("verification event");
    let _ = app.update(event, &mut model);
    assert_eq!(
        model.verification_panel.active_vote(),
        Some(VoteKind::Confirm)
    );

    let update = app
        .resolve(
            hazard_get.expect("hazard refresh"),
            Ok(HazardApiOutput::Hazard(report("h1", "HIGH", "Flooding.", 2))),
        )
        .expect("resolves");
    let event = update.events.into_iter().next().expect("refresh event");
    let _ = app.update(event, &mut model);
    assert_eq!(model.hazards[0].report_count, 3);
}

#[test]
fn switching_votes_deletes_before_creating() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    seed_hazards(&app, &mut model, vec![report("h1", "HIGH", "Flooding.", 1)]);
    open_hazard_with_verification(
        &app,
        &mut model,
        Some(verification_record("v1", VoteKind::Confirm)),
    );

    let mut effects = app
        .update(
            Event::VoteSubmitted {
                vote: VoteKind::Dispute,
            },
            &mut model,
        )
        .effects;

    // Old vote goes first; nothing is created yet.
    let request = expect_request!(effects, Effect::Hazards);
    match &request.operation {
        HazardApiOperation::DeleteVerification {
            verification_id, ..
        } => assert_eq!(verification_id, "v1"),
        other => panic!("expected delete, got {other:?}"),
    }

    let update = app
        .resolve(request, Ok(HazardApiOutput::Deleted))
        .expect("resolves");
    let event = update.events.into_iter().next().expect("replacement event");
    let mut effects = app.update(event, &mut model).effects;

    // Only after the delete resolves does the new vote get created.
    let request = expect_request!(effects, Effect::Hazards);
    match &request.operation {
        HazardApiOperation::CreateVerification { vote, .. } => {
            assert_eq!(*vote, VoteKind::Dispute);
        }
        other => panic!("expected create, got {other:?}"),
    }
}

#[test]
fn clicking_the_active_vote_toggles_it_off() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    seed_hazards(&app, &mut model, vec![report("h1", "HIGH", "Flooding.", 1)]);
    open_hazard_with_verification(
        &app,
        &mut model,
        Some(verification_record("v1", VoteKind::Dispute)),
    );

    // Dispute is active, so confirm is the one disabled control.
    let view = crux_core::App::view(&App::default(), &model);
    let detail = view.selected_hazard.expect("detail view");
    assert!(!detail.vote.can_confirm);
    assert!(detail.vote.can_dispute);

    let mut effects = app
        .update(
            Event::VoteSubmitted {
                vote: VoteKind::Dispute,
            },
            &mut model,
        )
        .effects;

    let request = expect_request!(effects, Effect::Hazards);
    match &request.operation {
        HazardApiOperation::DeleteVerification {
            verification_id, ..
        } => assert_eq!(verification_id, "v1"),
        other => panic!("expected delete, got {other:?}"),
    }

    let update = app
        .resolve(request, Ok(HazardApiOutput::Deleted))
        .expect("resolves");
    let event = update.events.into_iter().next().expect("mutation event");
    let mut effects = app.update(event, &mut model).effects;

    // Re-fetch reports no remaining verification.
    let verification_fetch = effects
        .iter_mut()
        .find_map(|effect| match effect {
            Effect::Hazards(request)
                if matches!(
                    request.operation,
                    HazardApiOperation::GetVerification { .. }
                ) =>
            {
                Some(request)
            }
            _ => None,
        })
        .expect("verification re-fetch");
    let update = app
        .resolve(verification_fetch, Ok(HazardApiOutput::Verification(None)))
        .expect("resolves");
    let event = update.events.into_iter().next().expect("verification event");
    let _ = app.update(event, &mut model);

    assert_eq!(model.verification_panel, VerificationPanel::Loaded(None));
}

#[test]
fn votes_are_ignored_while_status_is_pending() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    seed_hazards(&app, &mut model, vec![report("h1", "HIGH", "Flooding.", 1)]);

    // Select but do not resolve the status fetch.
    let _ = app.update(
        Event::HazardSelected {
            hazard_id: Some(HazardId::new("h1")),
        },
        &mut model,
    );
    assert!(model.verification_panel.is_pending());

    let update = app.update(
        Event::VoteSubmitted {
            vote: VoteKind::Confirm,
        },
        &mut model,
    );
    assert!(!update
        .effects
        .iter()
        .any(|effect| matches!(effect, Effect::Hazards(_))));
}

#[test]
fn stale_verification_results_are_ignored() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    seed_hazards(
        &app,
        &mut model,
        vec![
            report("h1", "HIGH", "Flooding.", 1),
            report("h2", "LOW", "Pothole.", 0),
        ],
    );

    let mut first_effects = app
        .update(
            Event::HazardSelected {
                hazard_id: Some(HazardId::new("h1")),
            },
            &mut model,
        )
        .effects;
    let first_request = expect_request!(first_effects, Effect::Hazards);

    // The user moves on before the first status fetch lands.
    let _ = app.update(
        Event::HazardSelected {
            hazard_id: Some(HazardId::new("h2")),
        },
        &mut model,
    );

    let update = app
        .resolve(
            first_request,
            Ok(HazardApiOutput::Verification(Some(verification_record(
                "v1",
                VoteKind::Confirm,
            )))),
        )
        .expect("resolves");
    let event = update.events.into_iter().next().expect("verification event");
    let _ = app.update(event, &mut model);

    // The late result for h1 must not leak into h2's panel.
    assert!(model.verification_panel.is_pending());
}
