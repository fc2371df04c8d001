use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use patient_cell::*;
use shared_database::{MockRecordStore, ScopedStore, StoreError, TenantScope};
use shared_models::{AppError, EventOutbox, OutboxReceiver, Patient, PatientAction, User, UserType};
use shared_utils::test_utils::Fixture;

struct Ward {
    fixture: Fixture,
    doctor: User,
    colleague: User,
    service: PatientService,
    events: OutboxReceiver,
}

impl Ward {
    async fn new() -> Self {
        let fixture = Fixture::new();
        let doctor = fixture.doctor("Dr Grey", "Surgery").await;
        let colleague = fixture.doctor("Dr Yang", "Cardiology").await;
        let (outbox, events) = EventOutbox::channel();
        let service = PatientService::new(fixture.store.clone(), outbox);
        Self {
            fixture,
            doctor,
            colleague,
            service,
            events,
        }
    }

    async fn admit(&self, owner: &User, name: &str, address: &str) -> Patient {
        self.service
            .create_patient(&Fixture::principal(owner), CreatePatientRequest::new(name, address))
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_create_stamps_owner_and_emits_event() {
    let mut ward = Ward::new().await;

    let patient = ward.admit(&ward.doctor, "  Jane Roe ", "12 Elm Road").await;
    assert_eq!(patient.user_id, ward.doctor.id);
    assert_eq!(patient.squad_id, ward.fixture.squad_id);
    assert_eq!(patient.name, "Jane Roe");

    let event = ward.events.try_recv().unwrap();
    assert_eq!(event.action, PatientAction::Create);
    assert_eq!(event.patient.id, patient.id);
    assert_eq!(event.channel(), format!("squad.{}", ward.fixture.squad_id));
    assert_eq!(event.payload()["type"], "create");
}

#[tokio::test]
async fn test_invalid_input_is_rejected_without_event() {
    let mut ward = Ward::new().await;
    let principal = Fixture::principal(&ward.doctor);

    let short_name = ward
        .service
        .create_patient(&principal, CreatePatientRequest::new("Al", "12 Elm Road"))
        .await;
    assert_matches!(short_name, Err(AppError::ValidationError(_)));

    let long_address = ward
        .service
        .create_patient(&principal, CreatePatientRequest::new("Alan", &"x".repeat(501)))
        .await;
    assert_matches!(long_address, Err(AppError::ValidationError(_)));

    assert!(ward.events.try_recv().is_err());
}

#[tokio::test]
async fn test_only_creator_reads_and_writes_patient() {
    let ward = Ward::new().await;
    let patient = ward.admit(&ward.doctor, "Jane Roe", "12 Elm Road").await;
    let colleague = Fixture::principal(&ward.colleague);

    assert_matches!(
        ward.service.get_patient(&colleague, patient.id).await,
        Err(AppError::Unauthorized(_))
    );
    assert_matches!(
        ward.service
            .update_patient(
                &colleague,
                patient.id,
                UpdatePatientRequest {
                    name: Some("Hijacked".to_string()),
                    ..Default::default()
                },
            )
            .await,
        Err(AppError::Unauthorized(_))
    );
    assert_matches!(
        ward.service.delete_patient(&colleague, patient.id).await,
        Err(AppError::Unauthorized(_))
    );

    let admin = ward.fixture.user(UserType::Admin, "Chief").await;
    assert_matches!(
        ward.service.get_patient(&Fixture::principal(&admin), patient.id).await,
        Err(AppError::Unauthorized(_))
    );

    let owner = ward.service.get_patient(&Fixture::principal(&ward.doctor), patient.id).await.unwrap();
    assert_eq!(owner.id, patient.id);
}

#[tokio::test]
async fn test_other_squad_gets_not_found() {
    let ward = Ward::new().await;
    let patient = ward.admit(&ward.doctor, "Jane Roe", "12 Elm Road").await;

    // Same user id, different squad: the tenant filter hides the record entirely.
    let mut moved = Fixture::principal(&ward.doctor);
    moved.squad_id = Uuid::new_v4();

    assert_matches!(
        ward.service.get_patient(&moved, patient.id).await,
        Err(AppError::NotFound(_))
    );
    let listed = ward.service.list_patients(&moved, PatientListing::Squad).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_update_and_delete_emit_events() {
    let mut ward = Ward::new().await;
    let principal = Fixture::principal(&ward.doctor);
    let patient = ward.admit(&ward.doctor, "Jane Roe", "12 Elm Road").await;
    ward.events.try_recv().unwrap();

    let updated = ward
        .service
        .update_patient(
            &principal,
            patient.id,
            UpdatePatientRequest {
                blood_type: Some("B+".to_string()),
                allergies: Some(vec!["penicillin".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.blood_type.as_deref(), Some("B+"));

    let event = ward.events.try_recv().unwrap();
    assert_eq!(event.action, PatientAction::Update);
    assert_eq!(event.patient.allergies, vec!["penicillin"]);

    ward.service.delete_patient(&principal, patient.id).await.unwrap();

    let event = ward.events.try_recv().unwrap();
    assert_eq!(event.action, PatientAction::Delete);
    assert!(event.patient.deleted_at.is_some());

    assert_matches!(
        ward.service.get_patient(&principal, patient.id).await,
        Err(AppError::NotFound(_))
    );
}

#[tokio::test]
async fn test_delete_event_is_built_without_rereading_the_store() {
    let owner = User::new(Uuid::new_v4(), UserType::Doctor, "Dr Karev", "karev@example.com");
    let patient = Fixture::new_patient(&owner, "Jane Roe");
    let row = serde_json::to_value(&patient).unwrap();

    // Lookup before the delete and the scope's own re-resolve succeed; anything after fails.
    let reads = Arc::new(AtomicUsize::new(0));
    let counter = reads.clone();
    let mut store = MockRecordStore::new();
    store.expect_find().returning(move |_, _, _| {
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
            Ok(Some(row.clone()))
        } else {
            Err(StoreError::Unavailable("read replica down".to_string()))
        }
    });
    store.expect_soft_delete().times(1).returning(|_, _, _| Ok(()));

    let (outbox, mut events) = EventOutbox::channel();
    let service = PatientService::new(Arc::new(store), outbox);

    service
        .delete_patient(&Fixture::principal(&owner), patient.id)
        .await
        .unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 2);

    let event = events.try_recv().unwrap();
    assert_eq!(event.action, PatientAction::Delete);
    assert_eq!(event.patient.id, patient.id);
    assert!(event.patient.deleted_at.is_some());
}

#[tokio::test]
async fn test_mutation_survives_closed_outbox() {
    let fixture = Fixture::new();
    let doctor = fixture.doctor("Dr Bailey", "General").await;
    let (outbox, events) = EventOutbox::channel();
    drop(events);
    let service = PatientService::new(fixture.store.clone(), outbox);

    let patient = service
        .create_patient(&Fixture::principal(&doctor), CreatePatientRequest::new("Jane Roe", "12 Elm Road"))
        .await
        .unwrap();

    let stored: Patient = ScopedStore::with_scope(fixture.store.as_ref(), TenantScope::Unauthenticated)
        .find(patient.id)
        .await
        .unwrap();
    assert_eq!(stored.name, "Jane Roe");

    let disabled = PatientService::new(fixture.store.clone(), EventOutbox::disabled());
    assert!(disabled
        .create_patient(&Fixture::principal(&doctor), CreatePatientRequest::new("John Roe", "12 Elm Road"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_show_patient_lists_visible_appointments_only() {
    let ward = Ward::new().await;
    let patient = ward.admit(&ward.doctor, "Jane Roe", "12 Elm Road").await;
    let other_patient = ward.admit(&ward.doctor, "John Doe", "13 Elm Road").await;
    let at = |hour| Utc.with_ymd_and_hms(2024, 2, 1, hour, 0, 0).unwrap();

    let mut owned = Fixture::new_appointment(&ward.doctor, at(8));
    owned.patient_id = Some(patient.id);
    let owned = ward.fixture.save(&owned).await;

    let mut assigned = Fixture::new_appointment(&ward.colleague, at(9));
    assigned.patient_id = Some(patient.id);
    assigned.assigned_to = Some(ward.doctor.id);
    let assigned = ward.fixture.save(&assigned).await;

    let mut public = Fixture::new_appointment(&ward.colleague, at(10));
    public.patient_id = Some(patient.id);
    public.public = true;
    let public = ward.fixture.save(&public).await;

    let mut private = Fixture::new_appointment(&ward.colleague, at(11));
    private.patient_id = Some(patient.id);
    ward.fixture.save(&private).await;

    let mut elsewhere = Fixture::new_appointment(&ward.doctor, at(12));
    elsewhere.patient_id = Some(other_patient.id);
    ward.fixture.save(&elsewhere).await;

    let details = ward
        .service
        .show_patient(&Fixture::principal(&ward.doctor), patient.id)
        .await
        .unwrap();

    assert_eq!(details.patient.id, patient.id);
    assert_eq!(
        details.appointments.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![owned.id, assigned.id, public.id]
    );
}

#[tokio::test]
async fn test_listings() {
    let ward = Ward::new().await;
    let principal = Fixture::principal(&ward.doctor);
    let zed = ward.admit(&ward.doctor, "zed Alpha", "1 Road").await;
    let amy = ward.admit(&ward.doctor, "Amy Beta", "2 Road").await;
    let theirs = ward.admit(&ward.colleague, "Mia Gamma", "3 Road").await;

    ward.service
        .delete_patient(&Fixture::principal(&ward.colleague), theirs.id)
        .await
        .unwrap();

    match ward.service.list_patients(&principal, PatientListing::Mine).await.unwrap() {
        PatientList::Records(patients) => {
            assert_eq!(patients.iter().map(|p| p.id).collect::<Vec<_>>(), vec![amy.id, zed.id]);
        }
        other => panic!("unexpected listing {:?}", other),
    }

    match ward.service.list_patients(&principal, PatientListing::Squad).await.unwrap() {
        PatientList::Directory(summaries) => {
            assert_eq!(summaries.iter().map(|p| p.id).collect::<Vec<_>>(), vec![amy.id, zed.id]);
        }
        other => panic!("unexpected listing {:?}", other),
    }

    match ward
        .service
        .list_patients(&principal, PatientListing::SquadIncludingDeleted)
        .await
        .unwrap()
    {
        PatientList::Directory(summaries) => {
            assert_eq!(
                summaries.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
                vec!["Amy Beta", "Mia Gamma", "zed Alpha"]
            );
            assert!(summaries[1].deleted_at.is_some());
        }
        other => panic!("unexpected listing {:?}", other),
    }
}

#[tokio::test]
async fn test_search_matches_name_or_address_case_insensitively() {
    let ward = Ward::new().await;
    let principal = Fixture::principal(&ward.doctor);
    let by_name = ward.admit(&ward.doctor, "Harold Finch", "1 Library Way").await;
    let by_address = ward.admit(&ward.colleague, "John Reese", "22 Harold Street").await;
    ward.admit(&ward.doctor, "Sameen Shaw", "5 Park Lane").await;

    let found = ward.service.search_patients(&principal, "HAROLD").await.unwrap();
    let ids: Vec<Uuid> = found.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![by_name.id, by_address.id]);

    assert!(ward.service.search_patients(&principal, "nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_starred_patients_toggle_and_order() {
    let ward = Ward::new().await;
    let principal = Fixture::principal(&ward.doctor);
    let first = ward.admit(&ward.doctor, "First Patient", "1 Road").await;
    let second = ward.admit(&ward.doctor, "Second Patient", "2 Road").await;

    assert!(ward.service.toggle_starred_patient(&principal, first.id).await.unwrap());
    assert!(ward.service.toggle_starred_patient(&principal, second.id).await.unwrap());

    // Touch the first patient so it becomes the most recently updated.
    ward.service
        .update_patient(
            &principal,
            first.id,
            UpdatePatientRequest {
                gender: Some("female".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let top = ward.service.top_patients(&principal).await.unwrap();
    assert_eq!(top.iter().map(|p| p.id).collect::<Vec<_>>(), vec![first.id, second.id]);

    assert!(!ward.service.toggle_starred_patient(&principal, first.id).await.unwrap());
    let top = ward.service.top_patients(&principal).await.unwrap();
    assert_eq!(top.iter().map(|p| p.id).collect::<Vec<_>>(), vec![second.id]);
}

#[tokio::test]
async fn test_cannot_star_foreign_patient() {
    let ward = Ward::new().await;
    let outsider = ward
        .fixture
        .user_in(Uuid::new_v4(), UserType::Doctor, "Outsider")
        .await;
    let foreign = ward.fixture.patient(&outsider, "Far Away").await;

    let result = ward
        .service
        .toggle_starred_patient(&Fixture::principal(&ward.doctor), foreign.id)
        .await;
    assert_matches!(result, Err(AppError::NotFound(_)));
}
