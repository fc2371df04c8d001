use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use notification_cell::*;
use shared_models::{EventOutbox, NotificationEmitter, Patient, PatientAction, PatientEvent};

fn patient(squad_id: Uuid) -> Patient {
    let now = Utc::now();
    Patient {
        id: Uuid::new_v4(),
        squad_id,
        user_id: Uuid::new_v4(),
        name: "Grace Hopper".to_string(),
        address: "12 Harbour Road".to_string(),
        gender: Some("female".to_string()),
        birth_date: None,
        blood_type: Some("O+".to_string()),
        allergies: vec![],
        surgeries: vec![],
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

#[tokio::test]
async fn test_outbox_events_reach_squad_subscribers() {
    let broadcaster = Arc::new(SquadBroadcaster::new(16));
    let squad_id = Uuid::new_v4();
    let mut subscriber = broadcaster.subscribe(squad_id).await;

    let (outbox, receiver) = EventOutbox::channel();
    let emitter: Arc<dyn NotificationEmitter> = broadcaster.clone();
    let dispatcher = spawn_dispatcher(receiver, emitter);

    let patient = patient(squad_id);
    outbox.enqueue(PatientEvent::new(PatientAction::Update, patient.clone()));

    let raw = tokio::time::timeout(Duration::from_secs(2), subscriber.recv())
        .await
        .expect("event should be delivered")
        .expect("channel should be open");
    let message: BroadcastMessage = serde_json::from_str(&raw).unwrap();

    assert_eq!(message.event, "patient-event");
    assert_eq!(message.payload["type"], "update");
    assert_eq!(message.payload["patient"]["id"], patient.id.to_string());

    drop(outbox);
    tokio::time::timeout(Duration::from_secs(2), dispatcher)
        .await
        .expect("dispatcher should stop once the outbox is dropped")
        .unwrap();
}

#[tokio::test]
async fn test_dispatcher_survives_events_without_subscribers() {
    let broadcaster = Arc::new(SquadBroadcaster::new(4));
    let (outbox, receiver) = EventOutbox::channel();
    let dispatcher = spawn_dispatcher(receiver, broadcaster.clone());

    for _ in 0..3 {
        outbox.enqueue(PatientEvent::new(PatientAction::Delete, patient(Uuid::new_v4())));
    }

    drop(outbox);
    tokio::time::timeout(Duration::from_secs(2), dispatcher)
        .await
        .expect("dispatcher should drain and stop")
        .unwrap();
}
