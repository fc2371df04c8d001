use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use uuid::Uuid;

use shared_database::{EntityKind, MockRecordStore, ScopedStore, StoreError, TenantScope};
use shared_models::{AppError, Appointment, User, UserType};
use shared_utils::test_utils::Fixture;
use user_cell::*;

async fn load_all(fixture: &Fixture) -> Vec<Appointment> {
    ScopedStore::with_scope(fixture.store.as_ref(), TenantScope::Unauthenticated)
        .list_including_deleted(|_: &Appointment| true)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_deleting_doctor_soft_deletes_assigned_appointments() {
    let fixture = Fixture::new();
    let admin = fixture.user(UserType::Admin, "Admin").await;
    let doctor = fixture.doctor("Dr Who", "Time").await;
    let other = fixture.doctor("Dr Strange", "Magic").await;
    let start = Utc::now();

    let mut assigned_ids = Vec::new();
    for offset in 0..3 {
        let mut appointment = Fixture::new_appointment(&admin, start + Duration::hours(offset));
        appointment.assigned_to = Some(doctor.id);
        assigned_ids.push(fixture.save(&appointment).await.id);
    }
    let mut untouched = Fixture::new_appointment(&admin, start);
    untouched.assigned_to = Some(other.id);
    let untouched = fixture.save(&untouched).await;

    let service = UserService::new(fixture.store.clone());
    let report = service
        .delete_user(&Fixture::principal(&admin), doctor.id)
        .await
        .unwrap();
    assert_eq!(report.user_id, doctor.id);
    assert_eq!(report.appointments_deleted, 3);

    // Rows remain; only the deleted flag changed.
    let rows = load_all(&fixture).await;
    assert_eq!(rows.len(), 4);
    for row in &rows {
        if assigned_ids.contains(&row.id) {
            assert!(row.deleted_at.is_some());
        } else {
            assert_eq!(row.id, untouched.id);
            assert!(row.deleted_at.is_none());
        }
    }

    let principal = Fixture::principal(&admin);
    let live: Vec<Appointment> = ScopedStore::new(fixture.store.as_ref(), Some(&principal))
        .list(|appointment: &Appointment| appointment.assigned_to == Some(doctor.id))
        .await
        .unwrap();
    assert!(live.is_empty());

    let listed = service.list_users(&principal, false, false).await.unwrap();
    assert!(listed.iter().all(|user| user.id != doctor.id));
    let with_deleted = service.list_users(&principal, true, false).await.unwrap();
    assert!(with_deleted.iter().any(|user| user.id == doctor.id && user.deleted_at.is_some()));
}

#[tokio::test]
async fn test_deleting_patient_follows_profile_relation() {
    let fixture = Fixture::new();
    let doctor = fixture.doctor("Dr Quinn", "General").await;
    let (patient_user, profile) = fixture.patient_user("Laura", Some("A+")).await;
    let unrelated = fixture.patient(&doctor, "Someone Else").await;

    let mut theirs = Fixture::new_appointment(&doctor, Utc::now());
    theirs.patient_id = Some(profile.id);
    let theirs = fixture.save(&theirs).await;
    let mut kept = Fixture::new_appointment(&doctor, Utc::now());
    kept.patient_id = Some(unrelated.id);
    // Assigned to the patient user, but patients are reached through their profile.
    kept.assigned_to = Some(patient_user.id);
    let kept = fixture.save(&kept).await;

    let report = UserService::new(fixture.store.clone())
        .delete_user(&Fixture::principal(&patient_user), patient_user.id)
        .await
        .unwrap();
    assert_eq!(report.appointments_deleted, 1);

    let rows: HashMap<Uuid, Appointment> = load_all(&fixture)
        .await
        .into_iter()
        .map(|appointment| (appointment.id, appointment))
        .collect();
    assert!(rows[&theirs.id].deleted_at.is_some());
    assert!(rows[&kept.id].deleted_at.is_none());
}

#[tokio::test]
async fn test_only_admin_or_self_may_delete() {
    let fixture = Fixture::new();
    let doctor = fixture.doctor("Dr A", "General").await;
    let colleague = fixture.doctor("Dr B", "General").await;
    let service = UserService::new(fixture.store.clone());

    let result = service.delete_user(&Fixture::principal(&colleague), doctor.id).await;
    assert_matches!(result, Err(AppError::Unauthorized(_)));

    let result = service.delete_user(&Fixture::principal(&doctor), doctor.id).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_admin_cannot_delete_across_squads() {
    let fixture = Fixture::new();
    let admin = fixture.user(UserType::Admin, "Admin").await;
    let foreign = fixture.user_in(Uuid::new_v4(), UserType::Doctor, "Foreign").await;

    let result = UserService::new(fixture.store.clone())
        .delete_user(&Fixture::principal(&admin), foreign.id)
        .await;
    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_store_failure_mid_cascade_is_cascade_incomplete() {
    let squad_id = Uuid::new_v4();
    let admin = User::new(squad_id, UserType::Admin, "Admin", "admin@example.com");
    let doctor = User::new(squad_id, UserType::Doctor, "Doctor", "doctor@example.com");

    let mut rows: HashMap<Uuid, serde_json::Value> = HashMap::new();
    for hour in 0..2 {
        let mut appointment = Fixture::new_appointment(&admin, Utc::now() + Duration::hours(hour));
        appointment.assigned_to = Some(doctor.id);
        rows.insert(appointment.id, serde_json::to_value(&appointment).unwrap());
    }
    let appointment_rows: Vec<serde_json::Value> = rows.values().cloned().collect();
    let doctor_row = serde_json::to_value(&doctor).unwrap();
    let doctor_id = doctor.id;

    let mut store = MockRecordStore::new();
    store.expect_find().returning(move |kind, id, _| {
        Ok(match kind {
            EntityKind::User if id == doctor_id => Some(doctor_row.clone()),
            EntityKind::Appointment => rows.get(&id).cloned(),
            _ => None,
        })
    });
    store.expect_list().returning(move |kind, _| {
        Ok(match kind {
            EntityKind::Appointment => appointment_rows.clone(),
            _ => vec![],
        })
    });

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    store.expect_soft_delete().returning(move |_, _, _| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(())
        } else {
            Err(StoreError::Unavailable("write timeout".to_string()))
        }
    });

    let result = UserService::new(Arc::new(store))
        .delete_user(&Fixture::principal(&admin), doctor.id)
        .await;

    assert_matches!(result, Err(AppError::CascadeIncomplete(msg)) if msg.contains("1 of 2"));
    // The user itself was never touched.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
