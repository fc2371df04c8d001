use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{MemoryStore, Record, ScopedStore, TenantScope};
use shared_models::{
    Appointment, AppointmentStatus, Doctor, EventOutbox, OutboxReceiver, Patient, Principal, User,
    UserType,
};

use crate::state::AppState;

pub struct TestConfig {
    pub jwt_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub squad_id: Uuid,
    pub email: String,
    pub user_type: UserType,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", UserType::Patient)
    }
}

impl TestUser {
    pub fn new(email: &str, user_type: UserType) -> Self {
        Self {
            id: Uuid::new_v4(),
            squad_id: Uuid::new_v4(),
            email: email.to_string(),
            user_type,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, UserType::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, UserType::Patient)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, UserType::Admin)
    }

    pub fn in_squad(mut self, squad_id: Uuid) -> Self {
        self.squad_id = squad_id;
        self
    }

    pub fn to_principal(&self) -> Principal {
        Principal::new(self.id, self.squad_id, self.user_type)
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "squad_id": user.squad_id,
            "user_type": user.user_type,
            "email": user.email,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Seeds an in-memory store for one squad. Writes bypass the tenant filter so tests
/// can also plant records in foreign squads.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub squad_id: Uuid,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            squad_id: Uuid::new_v4(),
        }
    }

    pub fn state(&self) -> (AppState, OutboxReceiver) {
        let (outbox, receiver) = EventOutbox::channel();
        let state = AppState::new(TestConfig::default().to_app_config(), self.store.clone(), outbox);
        (state, receiver)
    }

    pub fn principal(user: &User) -> Principal {
        Principal::new(user.id, user.squad_id, user.user_type)
    }

    pub async fn save<R: Record>(&self, record: &R) -> R {
        ScopedStore::with_scope(self.store.as_ref(), TenantScope::Unauthenticated)
            .save(record)
            .await
            .expect("fixture save")
    }

    pub async fn user(&self, user_type: UserType, name: &str) -> User {
        self.user_in(self.squad_id, user_type, name).await
    }

    pub async fn user_in(&self, squad_id: Uuid, user_type: UserType, name: &str) -> User {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        self.save(&User::new(squad_id, user_type, name, &email)).await
    }

    pub async fn doctor(&self, name: &str, specialty: &str) -> User {
        let user = self.user(UserType::Doctor, name).await;
        let now = Utc::now();
        self.save(&Doctor {
            id: Uuid::new_v4(),
            user_id: user.id,
            specialty: specialty.to_string(),
            birth_date: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .await;
        user
    }

    /// A patient-type user together with the profile record it owns.
    pub async fn patient_user(&self, name: &str, blood_type: Option<&str>) -> (User, Patient) {
        let user = self.user(UserType::Patient, name).await;
        let mut profile = Self::new_patient(&user, name);
        profile.blood_type = blood_type.map(str::to_string);
        let profile = self.save(&profile).await;
        (user, profile)
    }

    pub async fn patient(&self, owner: &User, name: &str) -> Patient {
        self.save(&Self::new_patient(owner, name)).await
    }

    pub fn new_patient(owner: &User, name: &str) -> Patient {
        let now = Utc::now();
        Patient {
            id: Uuid::new_v4(),
            squad_id: owner.squad_id,
            user_id: owner.id,
            name: name.to_string(),
            address: "42 Test Street".to_string(),
            gender: None,
            birth_date: None,
            blood_type: None,
            allergies: vec![],
            surgeries: vec![],
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn new_appointment(owner: &User, start_date: DateTime<Utc>) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            squad_id: owner.squad_id,
            user_id: owner.id,
            patient_id: None,
            assigned_to: None,
            team: Default::default(),
            start_date,
            due_date: None,
            status: AppointmentStatus::NotStarted,
            public: false,
            progress: 0,
            category: "Uncategorized".to_string(),
            labels: vec![],
            cost: None,
            comments: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub async fn appointment(&self, owner: &User, start_date: DateTime<Utc>) -> Appointment {
        self.save(&Self::new_appointment(owner, start_date)).await
    }
}
