//! End-to-end registration lifecycle tests against an in-memory database:
//! seat holds, payment settlement, charter approval, and every release
//! path.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use sprout_common::Error;
use sprout_portal::models::{PaymentMethod, PaymentStatus};
use sprout_portal::registration::{RegisterForClass, RegistrationService};
use sprout_portal::settlement::Settlement;

use common::{
    actor_for, arc_email, seed_class, seed_parent, seed_student, storage, FailingCheckout,
    StubCheckout,
};

const BASE_URL: &str = "https://sprout.test";

fn card_payload(class_id: &str, student_id: &str) -> RegisterForClass {
    RegisterForClass {
        class_id: class_id.to_string(),
        student_id: student_id.to_string(),
        payment_method: PaymentMethod::Card,
        is_one_on_one: false,
        charter_school_name: None,
        charter_school_contact: None,
    }
}

fn charter_payload(class_id: &str, student_id: &str) -> RegisterForClass {
    RegisterForClass {
        class_id: class_id.to_string(),
        student_id: student_id.to_string(),
        payment_method: PaymentMethod::CharterSchool,
        is_one_on_one: false,
        charter_school_name: Some("Summit Charter".to_string()),
        charter_school_contact: Some("funds@summit.test".to_string()),
    }
}

#[tokio::test]
async fn card_registration_holds_seat_and_returns_checkout_url() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let checkout = Arc::new(StubCheckout::default());
    let service = RegistrationService::new(
        storage.clone(),
        checkout.clone(),
        arc_email(),
        BASE_URL,
    );

    let outcome = service
        .register(&actor_for(&parent), &card_payload(&class.id, &student.id))
        .await
        .unwrap();

    assert!(outcome.checkout_url.is_some());
    assert_eq!(checkout.calls(), 1);

    let stored = storage.get_registration(&outcome.registration_id).await.unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert_eq!(stored.amount_cents, 12000);
    assert!(stored.checkout_session_id.is_some());

    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 1);
}

#[tokio::test]
async fn full_class_is_rejected_before_any_checkout_call() {
    let storage = storage().await;
    let class = seed_class(&storage, 1).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let first = seed_student(&storage, &parent.id, "Ada").await;
    let second = seed_student(&storage, &parent.id, "Grace").await;

    let checkout = Arc::new(StubCheckout::default());
    let service =
        RegistrationService::new(storage.clone(), checkout.clone(), arc_email(), BASE_URL);
    let actor = actor_for(&parent);

    service
        .register(&actor, &card_payload(&class.id, &first.id))
        .await
        .unwrap();

    let err = service
        .register(&actor, &card_payload(&class.id, &second.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ClassFull));

    // The second attempt never reached the payment processor.
    assert_eq!(checkout.calls(), 1);
    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 1);
}

#[tokio::test]
async fn duplicate_registration_is_rejected_without_leaking_a_hold() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let actor = actor_for(&parent);

    service
        .register(&actor, &card_payload(&class.id, &student.id))
        .await
        .unwrap();
    let err = service
        .register(&actor, &card_payload(&class.id, &student.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyRegistered));

    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 1);
}

#[tokio::test]
async fn settlement_is_idempotent_across_repeated_deliveries() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let outcome = service
        .register(&actor_for(&parent), &card_payload(&class.id, &student.id))
        .await
        .unwrap();

    let email = arc_email();
    let settlement = Settlement::new(storage.clone(), email.clone());

    settlement
        .confirm_card_payment(&outcome.registration_id, Some("pi_123"))
        .await
        .unwrap();
    // Second delivery of the same event.
    settlement
        .confirm_card_payment(&outcome.registration_id, Some("pi_123"))
        .await
        .unwrap();

    let stored = storage.get_registration(&outcome.registration_id).await.unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.payment_intent_id.as_deref(), Some("pi_123"));

    // Payment-received and enrollment-confirmed, each exactly once.
    assert_eq!(email.sent().len(), 2);

    // Settlement never touches the seat counter.
    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 1);
}

#[tokio::test]
async fn settlement_for_unknown_registration_is_acknowledged_noop() {
    let storage = storage().await;
    let email = arc_email();
    let settlement = Settlement::new(storage.clone(), email.clone());

    settlement
        .confirm_card_payment("no-such-registration", Some("pi_123"))
        .await
        .unwrap();
    assert!(email.sent().is_empty());
}

#[tokio::test]
async fn cancel_releases_seat_and_reregistration_succeeds() {
    let storage = storage().await;
    let class = seed_class(&storage, 1).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let actor = actor_for(&parent);
    let outcome = service
        .register(&actor, &card_payload(&class.id, &student.id))
        .await
        .unwrap();

    let settlement = Settlement::new(storage.clone(), arc_email());
    assert!(settlement
        .cancel_checkout(&outcome.registration_id)
        .await
        .unwrap());

    let class_row = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class_row.spots_taken, 0);
    assert!(storage
        .find_registration(&outcome.registration_id)
        .await
        .unwrap()
        .is_none());

    // The freed spot is immediately usable again.
    service
        .register(&actor, &card_payload(&class.id, &student.id))
        .await
        .unwrap();
}

#[tokio::test]
async fn cancel_after_settlement_deletes_nothing() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let outcome = service
        .register(&actor_for(&parent), &card_payload(&class.id, &student.id))
        .await
        .unwrap();

    let settlement = Settlement::new(storage.clone(), arc_email());
    settlement
        .confirm_card_payment(&outcome.registration_id, None)
        .await
        .unwrap();

    assert!(!settlement
        .cancel_checkout(&outcome.registration_id)
        .await
        .unwrap());
    let stored = storage.get_registration(&outcome.registration_id).await.unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 1);
}

#[tokio::test]
async fn charter_registration_parks_for_approval_at_charter_price() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let checkout = Arc::new(StubCheckout::default());
    let email = arc_email();
    let service =
        RegistrationService::new(storage.clone(), checkout.clone(), email.clone(), BASE_URL);

    let outcome = service
        .register(&actor_for(&parent), &charter_payload(&class.id, &student.id))
        .await
        .unwrap();

    assert!(outcome.checkout_url.is_none());
    assert_eq!(checkout.calls(), 0);

    let stored = storage.get_registration(&outcome.registration_id).await.unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::CharterPending);
    assert_eq!(stored.amount_cents, 10000);

    // The hold is pessimistic: taken at creation, before approval.
    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 1);

    let subjects = email.subjects();
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].starts_with("Registration Pending"));
}

#[tokio::test]
async fn charter_approval_confirms_once_then_conflicts() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let outcome = service
        .register(&actor_for(&parent), &charter_payload(&class.id, &student.id))
        .await
        .unwrap();

    let email = arc_email();
    let settlement = Settlement::new(storage.clone(), email.clone());
    settlement.approve_charter(&outcome.registration_id).await.unwrap();

    let stored = storage.get_registration(&outcome.registration_id).await.unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::CharterApproved);
    assert_eq!(email.sent().len(), 2);

    let err = settlement
        .approve_charter(&outcome.registration_id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
    // No duplicate emails from the failed re-approval.
    assert_eq!(email.sent().len(), 2);
}

#[tokio::test]
async fn charter_rejection_releases_the_held_seat() {
    let storage = storage().await;
    let class = seed_class(&storage, 1).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let outcome = service
        .register(&actor_for(&parent), &charter_payload(&class.id, &student.id))
        .await
        .unwrap();

    let settlement = Settlement::new(storage.clone(), arc_email());
    settlement.reject_charter(&outcome.registration_id).await.unwrap();

    let stored = storage.get_registration(&outcome.registration_id).await.unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Refunded);

    // Release mirrors the reservation-time increment.
    let class_row = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class_row.spots_taken, 0);

    let err = settlement
        .reject_charter(&outcome.registration_id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test]
async fn failed_checkout_session_rolls_back_the_registration() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(FailingCheckout),
        arc_email(),
        BASE_URL,
    );

    let err = service
        .register(&actor_for(&parent), &card_payload(&class.id, &student.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Payment(_)));

    // Seat given back, row gone.
    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 0);
    assert!(storage.list_registrations().await.unwrap().is_empty());
}

#[tokio::test]
async fn one_on_one_uses_its_own_price() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let mut payload = card_payload(&class.id, &student.id);
    payload.is_one_on_one = true;

    let outcome = service
        .register(&actor_for(&parent), &payload)
        .await
        .unwrap();
    let stored = storage.get_registration(&outcome.registration_id).await.unwrap();
    assert_eq!(stored.amount_cents, 20000);
}

#[tokio::test]
async fn charter_payload_without_school_details_is_rejected() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let mut payload = charter_payload(&class.id, &student.id);
    payload.charter_school_name = Some("   ".to_string());
    payload.charter_school_contact = None;

    let err = service
        .register(&actor_for(&parent), &payload)
        .await
        .unwrap_err();
    let Error::Validation(fields) = err else {
        panic!("expected validation failure");
    };
    assert_eq!(fields.len(), 2);

    // Rejected before anything was written.
    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 0);
}

#[tokio::test]
async fn another_parents_student_reads_as_not_found() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let owner = seed_parent(&storage, "owner@example.com").await;
    let other = seed_parent(&storage, "other@example.com").await;
    let student = seed_student(&storage, &owner.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );

    let err = service
        .register(&actor_for(&other), &card_payload(&class.id, &student.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound("Student")));
}

#[tokio::test]
async fn stale_card_pending_rows_are_swept_but_charter_rows_are_not() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let card_student = seed_student(&storage, &parent.id, "Ada").await;
    let charter_student = seed_student(&storage, &parent.id, "Grace").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let actor = actor_for(&parent);
    service
        .register(&actor, &card_payload(&class.id, &card_student.id))
        .await
        .unwrap();
    service
        .register(&actor, &charter_payload(&class.id, &charter_student.id))
        .await
        .unwrap();

    // A cutoff ahead of now makes both rows "old enough"; only the card
    // one may be expired.
    let expired = storage
        .expire_stale_pending(Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(expired, 1);

    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 1);

    let remaining = storage.list_registrations().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].payment_status, PaymentStatus::CharterPending);
}

#[tokio::test]
async fn settled_rows_survive_the_sweep() {
    let storage = storage().await;
    let class = seed_class(&storage, 8).await;
    let parent = seed_parent(&storage, "dana@example.com").await;
    let student = seed_student(&storage, &parent.id, "Ada").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let outcome = service
        .register(&actor_for(&parent), &card_payload(&class.id, &student.id))
        .await
        .unwrap();

    let settlement = Settlement::new(storage.clone(), arc_email());
    settlement
        .confirm_card_payment(&outcome.registration_id, None)
        .await
        .unwrap();

    let expired = storage
        .expire_stale_pending(Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(expired, 0);
    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 1);
}

#[tokio::test]
async fn capacity_cannot_be_edited_below_current_enrollment() {
    let storage = storage().await;
    let class = seed_class(&storage, 2).await;
    let parent = seed_parent(&storage, "dana@example.com").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let actor = actor_for(&parent);
    for name in ["Ada", "Grace"] {
        let student = seed_student(&storage, &parent.id, name).await;
        service
            .register(&actor, &card_payload(&class.id, &student.id))
            .await
            .unwrap();
    }

    // Shrinking below the two held seats must be rejected outright.
    let mut shrunk = storage.get_class(&class.id).await.unwrap();
    shrunk.max_spots = 1;
    let err = storage.update_class(&shrunk).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let class_row = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class_row.max_spots, 2);
    assert!(class_row.spots_taken <= class_row.max_spots);

    // Shrinking down to exactly the current enrollment is fine.
    let mut exact = storage.get_class(&class.id).await.unwrap();
    exact.max_spots = 2;
    exact.name = "Intro to Python (small group)".to_string();
    storage.update_class(&exact).await.unwrap();
    let class_row = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class_row.name, "Intro to Python (small group)");
}

#[tokio::test]
async fn capacity_is_never_exceeded() {
    let storage = storage().await;
    let class = seed_class(&storage, 2).await;
    let parent = seed_parent(&storage, "dana@example.com").await;

    let service = RegistrationService::new(
        storage.clone(),
        Arc::new(StubCheckout::default()),
        arc_email(),
        BASE_URL,
    );
    let actor = actor_for(&parent);

    let mut outcomes = Vec::new();
    for name in ["Ada", "Grace", "Edsger"] {
        let student = seed_student(&storage, &parent.id, name).await;
        outcomes.push(
            service
                .register(&actor, &card_payload(&class.id, &student.id))
                .await,
        );
    }

    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].is_ok());
    assert!(matches!(outcomes[2], Err(Error::ClassFull)));

    let class = storage.get_class(&class.id).await.unwrap();
    assert_eq!(class.spots_taken, 2);
    assert_eq!(class.max_spots, 2);
}
