use assert_matches::assert_matches;
use axum::extract::{Extension, Query, State};
use chrono::Duration;
use uuid::Uuid;

use shared_models::{AppError, UserType};
use shared_utils::test_utils::Fixture;
use user_cell::handlers::{get_profile, list_users};
use user_cell::*;

#[tokio::test]
async fn test_directory_is_squad_scoped_and_ordered_by_name() {
    let fixture = Fixture::new();
    let me = fixture.user(UserType::Doctor, "mallory").await;
    fixture.user(UserType::Patient, "Alice").await;
    fixture.user(UserType::Admin, "bob").await;
    fixture.user_in(Uuid::new_v4(), UserType::Doctor, "Aaron Elsewhere").await;

    let service = UserService::new(fixture.store.clone());
    let principal = Fixture::principal(&me);

    let everyone = service.list_users(&principal, false, false).await.unwrap();
    assert_eq!(
        everyone.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
        vec!["Alice", "bob", "mallory"]
    );

    let others = service.list_users(&principal, false, true).await.unwrap();
    assert_eq!(
        others.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
        vec!["Alice", "bob"]
    );
}

#[tokio::test]
async fn test_starred_users_toggle_and_order() {
    let fixture = Fixture::new();
    let me = fixture.user(UserType::Doctor, "Me").await;
    let first = fixture.user(UserType::Doctor, "First").await;
    let mut second = fixture.user(UserType::Doctor, "Second").await;
    second.updated_at = first.updated_at + Duration::seconds(5);
    let second = fixture.save(&second).await;
    let service = UserService::new(fixture.store.clone());
    let principal = Fixture::principal(&me);

    assert!(service.toggle_starred_user(&principal, first.id).await.unwrap());
    assert!(service.toggle_starred_user(&principal, second.id).await.unwrap());

    let top = service.top_users(&principal).await.unwrap();
    assert_eq!(top.iter().map(|u| u.id).collect::<Vec<_>>(), vec![second.id, first.id]);

    assert!(!service.toggle_starred_user(&principal, second.id).await.unwrap());
    let top = service.top_users(&principal).await.unwrap();
    assert_eq!(top.iter().map(|u| u.id).collect::<Vec<_>>(), vec![first.id]);
}

#[tokio::test]
async fn test_cannot_star_user_in_other_squad() {
    let fixture = Fixture::new();
    let me = fixture.user(UserType::Doctor, "Me").await;
    let stranger = fixture.user_in(Uuid::new_v4(), UserType::Doctor, "Stranger").await;

    let result = UserService::new(fixture.store.clone())
        .toggle_starred_user(&Fixture::principal(&me), stranger.id)
        .await;
    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_profile_and_directory_handlers() {
    let fixture = Fixture::new();
    let me = fixture.user(UserType::Admin, "Root User").await;
    fixture.user(UserType::Doctor, "Doc").await;
    let (state, _events) = fixture.state();
    let principal = Fixture::principal(&me);

    let profile = get_profile(State(state.clone()), Extension(principal)).await.unwrap();
    assert_eq!(profile.0["user"]["email"], "root.user@example.com");
    assert_eq!(profile.0["user"]["type"], "admin");
    assert!(profile.0["user"].get("starred_patients").is_none());

    let listed = list_users(
        State(state),
        Extension(principal),
        Query(UserListQuery {
            include_deleted: false,
            exclude_self: true,
        }),
    )
    .await
    .unwrap();
    assert_eq!(listed.0["total"], 1);
    assert_eq!(listed.0["users"][0]["name"], "Doc");
}
