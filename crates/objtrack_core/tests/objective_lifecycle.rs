use chrono::NaiveDate;
use objtrack_core::db::open_db_in_memory;
use objtrack_core::{
    Category, MemoryObjectiveStore, ObjectiveDraft, ObjectiveError, ObjectiveService,
    ObjectiveStatus, ObjectiveStore, Period, SqliteObjectiveStore, ValidationOutcome,
};
use uuid::Uuid;

#[test]
fn create_starts_pending_with_null_evaluation_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let objective = service.create_objective(period(), draft("Nadia", 100.0)).unwrap();
    assert_eq!(objective.status, ObjectiveStatus::Pending);
    assert_eq!(objective.period, period());
    assert!(objective.evaluated_value.is_none());
    assert!(objective.outcome.is_none());
    assert!(objective.achievement_percent.is_none());
    assert!(objective.validated_at.is_none());

    let stored = service.get_objectives(period()).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], objective);
}

#[test]
fn create_rejects_non_positive_target() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    for target in [0.0, -1.0, f64::NAN] {
        let err = service
            .create_objective(period(), draft("Nadia", target))
            .unwrap_err();
        assert!(matches!(err, ObjectiveError::Validation(_)));
    }
    assert!(service.get_objectives(period()).unwrap().is_empty());
}

#[test]
fn edit_replaces_fields_and_stamps_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service.create_objective(period(), draft("Nadia", 100.0)).unwrap();
    assert!(created.updated_at.is_none());

    let edited = service
        .edit_objective(created.id, period(), draft("Malik", 80.0))
        .unwrap();
    assert_eq!(edited.owner, "Malik");
    assert_eq!(edited.target_value, 80.0);
    assert!(edited.updated_at.is_some());
    assert_eq!(edited.created_at, created.created_at);

    let stored = service.get_objectives(period()).unwrap();
    assert_eq!(stored[0].owner, "Malik");
}

#[test]
fn edit_unknown_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.create_objective(period(), draft("Nadia", 100.0)).unwrap();

    let missing = Uuid::new_v4();
    let err = service
        .edit_objective(missing, period(), draft("Malik", 80.0))
        .unwrap_err();
    assert!(matches!(err, ObjectiveError::NotFound(id) if id == missing));
}

#[test]
fn validated_objective_is_immutable() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let objective = service.create_objective(period(), draft("Nadia", 100.0)).unwrap();
    service
        .evaluate_objective(objective.id, period(), 70.0)
        .unwrap();

    let edit_err = service
        .edit_objective(objective.id, period(), draft("Malik", 80.0))
        .unwrap_err();
    assert!(matches!(edit_err, ObjectiveError::InvalidState { .. }));

    let delete_err = service.delete_objective(objective.id, period()).unwrap_err();
    assert!(matches!(delete_err, ObjectiveError::InvalidState { .. }));
}

#[test]
fn delete_removes_pending_and_reports_absence_as_false() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let objective = service.create_objective(period(), draft("Nadia", 100.0)).unwrap();
    assert!(service.delete_objective(objective.id, period()).unwrap());
    assert!(service.get_objectives(period()).unwrap().is_empty());

    // Deleting something already gone is not an error in this interface.
    assert!(!service.delete_objective(objective.id, period()).unwrap());
}

#[test]
fn evaluation_threshold_boundary_is_success() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let below = service.create_objective(period(), draft("Nadia", 100.0)).unwrap();
    let below = service.evaluate_objective(below.id, period(), 59.0).unwrap();
    assert_eq!(below.achievement_percent, Some(59));
    assert_eq!(below.outcome, Some(ValidationOutcome::Failure));

    let at = service.create_objective(period(), draft("Malik", 100.0)).unwrap();
    let at = service.evaluate_objective(at.id, period(), 60.0).unwrap();
    assert_eq!(at.achievement_percent, Some(60));
    assert_eq!(at.outcome, Some(ValidationOutcome::Success));
}

#[test]
fn evaluation_rounds_before_classifying() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let objective = service.create_objective(period(), draft("Nadia", 3.0)).unwrap();
    let evaluated = service
        .evaluate_objective(objective.id, period(), 2.0)
        .unwrap();
    assert_eq!(evaluated.achievement_percent, Some(67));
    assert_eq!(evaluated.outcome, Some(ValidationOutcome::Success));
}

#[test]
fn zero_evaluation_is_valid_and_fails() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let objective = service.create_objective(period(), draft("Nadia", 100.0)).unwrap();
    let evaluated = service
        .evaluate_objective(objective.id, period(), 0.0)
        .unwrap();
    assert_eq!(evaluated.achievement_percent, Some(0));
    assert_eq!(evaluated.outcome, Some(ValidationOutcome::Failure));
    assert_eq!(evaluated.status, ObjectiveStatus::Validated);
    assert!(evaluated.validated_at.is_some());
}

#[test]
fn overshoot_percentage_is_not_clamped() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let objective = service.create_objective(period(), draft("Nadia", 100.0)).unwrap();
    let evaluated = service
        .evaluate_objective(objective.id, period(), 150.0)
        .unwrap();
    assert_eq!(evaluated.achievement_percent, Some(150));
    assert_eq!(evaluated.outcome, Some(ValidationOutcome::Success));
}

#[test]
fn second_evaluation_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let objective = service.create_objective(period(), draft("Nadia", 100.0)).unwrap();
    service
        .evaluate_objective(objective.id, period(), 70.0)
        .unwrap();

    let err = service
        .evaluate_objective(objective.id, period(), 90.0)
        .unwrap_err();
    assert!(matches!(
        err,
        ObjectiveError::InvalidState {
            status: ObjectiveStatus::Validated,
            ..
        }
    ));

    // The first evaluation stays untouched.
    let stored = service.get_objectives(period()).unwrap();
    assert_eq!(stored[0].evaluated_value, Some(70.0));
}

#[test]
fn non_finite_evaluation_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let objective = service.create_objective(period(), draft("Nadia", 100.0)).unwrap();
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = service
            .evaluate_objective(objective.id, period(), value)
            .unwrap_err();
        assert!(matches!(err, ObjectiveError::Validation(_)));
    }
    assert_eq!(
        service.get_objectives(period()).unwrap()[0].status,
        ObjectiveStatus::Pending
    );
}

#[test]
fn active_period_defaults_to_current_and_persists() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let active = service.active_period().unwrap();
    assert!(active.is_current());

    let other: Period = "2025-03".parse().unwrap();
    service.set_active_period(other).unwrap();
    assert_eq!(service.active_period().unwrap(), other);

    let reset = service.reset_active_period().unwrap();
    assert!(reset.is_current());
    assert_eq!(service.active_period().unwrap(), reset);
}

#[test]
fn lifecycle_behaves_the_same_on_the_memory_store() {
    let store = MemoryObjectiveStore::new();
    let service = ObjectiveService::new(store.clone());

    let objective = service.create_objective(period(), draft("Nadia", 100.0)).unwrap();
    let evaluated = service
        .evaluate_objective(objective.id, period(), 59.0)
        .unwrap();
    assert_eq!(evaluated.outcome, Some(ValidationOutcome::Failure));

    // The cloned handle sees the same state.
    assert_eq!(store.load(period()).unwrap().len(), 1);
    let err = service
        .evaluate_objective(objective.id, period(), 60.0)
        .unwrap_err();
    assert!(matches!(err, ObjectiveError::InvalidState { .. }));
}

fn service(conn: &rusqlite::Connection) -> ObjectiveService<SqliteObjectiveStore<'_>> {
    ObjectiveService::new(SqliteObjectiveStore::try_new(conn).unwrap())
}

fn period() -> Period {
    "2026-08".parse().unwrap()
}

fn draft(owner: &str, target: f64) -> ObjectiveDraft {
    ObjectiveDraft {
        owner: owner.to_string(),
        description: "Close twelve support tickets".to_string(),
        category: Category::IndividualContributor,
        target_value: target,
        due_date: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
    }
}
