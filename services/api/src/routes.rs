//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{Datelike, Utc};
use domain::guard::{require, require_section};
use domain::models::{NewAlert, NewUser, Role, SanitaryCategory, UpdateUser};
use domain::permissions::{Action, PermissionSet, SectionAction, modules, sections};
use domain::sanitary::catalog;
use domain::{DomainError, DomainResult};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{CurrentUser, auth_middleware},
    models::{
        CatalogResponse, CountResponse, ListAlertsQuery, ListUsersQuery, SearchUsersQuery,
        UpdatedResponse, YearQuery,
    },
    state::{ApiStore, AppState},
};

/// Create the router for the API service
pub fn create_router<S: ApiStore>(state: AppState<S>) -> Router {
    let protected_routes = Router::new()
        .route("/users", get(list_users::<S>).post(create_user::<S>))
        .route("/users/me", get(current_user))
        .route("/users/search", get(search_users::<S>))
        .route("/users/by-role/:role", get(users_by_role::<S>))
        .route(
            "/users/:id",
            get(get_user::<S>)
                .put(update_user::<S>)
                .delete(delete_user::<S>),
        )
        .route("/users/:id/permissions", put(update_permissions::<S>))
        .route("/users/:id/permissions/reset", post(reset_permissions::<S>))
        .route("/horses/:id/sanitary-plan", get(sanitary_plan::<S>))
        .route("/horses/:id/sanitary-plan/stats", get(sanitary_stats::<S>))
        .route("/sanitary-catalog/:category", get(sanitary_catalog))
        .route("/alerts", get(list_alerts::<S>).post(create_alert::<S>))
        .route("/alerts/unread/count", get(count_unread_alerts::<S>))
        .route("/alerts/read-all", put(mark_all_alerts_read::<S>))
        .route("/alerts/:id", get(get_alert::<S>).delete(delete_alert::<S>))
        .route("/alerts/:id/read", put(mark_alert_read::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

// Users

pub async fn list_users<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<impl IntoResponse> {
    let users = state
        .users
        .list_users(&user, query.active_only(), query.page())
        .await?;
    Ok(Json(users))
}

pub async fn create_user<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    let created = state.users.create_user(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(user))
}

pub async fn search_users<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<SearchUsersQuery>,
) -> ApiResult<impl IntoResponse> {
    if query.q.trim().is_empty() {
        return Err(ApiError::BadRequest("search term is required".to_string()));
    }

    let users = state
        .users
        .search_users(&user, &query.q, query.page())
        .await?;
    Ok(Json(users))
}

pub async fn users_by_role<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(role): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let role: Role = role.parse()?;
    let users = state.users.list_by_role(&user, role).await?;
    Ok(Json(users))
}

pub async fn get_user<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let found = state.users.get_user(&user, id).await?;
    Ok(Json(found))
}

pub async fn update_user<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUser>,
) -> ApiResult<impl IntoResponse> {
    let updated = state.users.update_user(&user, id, payload).await?;
    Ok(Json(updated))
}

pub async fn delete_user<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.users.delete_user(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_permissions<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(permissions): Json<PermissionSet>,
) -> ApiResult<impl IntoResponse> {
    let updated = state
        .users
        .update_permissions(&user, id, permissions)
        .await?;
    Ok(Json(updated))
}

pub async fn reset_permissions<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let updated = state.users.reset_permissions(&user, id).await?;
    Ok(Json(updated))
}

// Sanitary plan

pub async fn sanitary_plan<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<YearQuery>,
) -> ApiResult<impl IntoResponse> {
    require(&user, modules::HORSES, Action::View)?;
    require_section(&user, sections::SANITARY_PLAN, SectionAction::View)?;

    let calendar = state.sanitary.calendar(id, query.year).await?;
    Ok(Json(calendar))
}

pub async fn sanitary_stats<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<YearQuery>,
) -> ApiResult<impl IntoResponse> {
    require(&user, modules::HORSES, Action::View)?;
    require_section(&user, sections::SANITARY_PLAN, SectionAction::View)?;

    let stats = state.sanitary.stats(id, query.year).await?;
    Ok(Json(stats))
}

pub async fn sanitary_catalog(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(category): Path<String>,
    Query(query): Query<YearQuery>,
) -> ApiResult<impl IntoResponse> {
    require(&user, modules::HORSES, Action::View)?;

    let category: SanitaryCategory = category.parse()?;
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    Ok(Json(catalog_entry(year, category)?))
}

fn catalog_entry(year: i32, category: SanitaryCategory) -> DomainResult<CatalogResponse> {
    let version = catalog::resolve(year);
    let plan = version
        .categories
        .get(&category)
        .ok_or_else(|| DomainError::not_found("sanitary plan", category))?;

    Ok(CatalogResponse {
        version_year: version.year,
        resolution: version.resolution.clone(),
        category,
        annual_cost: plan.annual_cost(),
        total_activities: plan.activity_count(),
        plan: plan.clone(),
    })
}

// Alerts

pub async fn list_alerts<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListAlertsQuery>,
) -> ApiResult<impl IntoResponse> {
    require(&user, modules::ALERTS, Action::View)?;
    let alerts = state
        .alerts
        .list_for_user(&user, query.unread_only, query.page())
        .await?;
    Ok(Json(alerts))
}

pub async fn count_unread_alerts<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    require(&user, modules::ALERTS, Action::View)?;
    let count = state.alerts.count_unread(&user).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn create_alert<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<NewAlert>,
) -> ApiResult<impl IntoResponse> {
    let alert = state.alerts.publish(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn mark_all_alerts_read<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    require(&user, modules::ALERTS, Action::View)?;
    let updated = state.alerts.mark_all_read(&user).await?;
    Ok(Json(UpdatedResponse { updated }))
}

pub async fn get_alert<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    require(&user, modules::ALERTS, Action::View)?;
    let alert = state.alerts.get(&user, id).await?;
    Ok(Json(alert))
}

pub async fn mark_alert_read<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    require(&user, modules::ALERTS, Action::View)?;
    let alert = state.alerts.mark_read(&user, id).await?;
    Ok(Json(alert))
}

pub async fn delete_alert<S: ApiStore>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    require(&user, modules::ALERTS, Action::Delete)?;
    state.alerts.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::JwtVerifier;
    use domain::memory::MemoryStore;
    use domain::models::{AlertPriority, AlertType, LifecycleStatus, User};
    use domain::permissions::SectionPermissions;
    use std::sync::Arc;

    const PUBLIC_KEY: &str = include_str!("testdata/test_public.pem");

    fn memory_state() -> (Arc<MemoryStore>, AppState<Arc<MemoryStore>>) {
        let store = Arc::new(MemoryStore::new());
        let jwt = JwtVerifier::from_pem(PUBLIC_KEY).unwrap();
        (store.clone(), AppState::new(store, jwt))
    }

    async fn plan_status(
        state: &AppState<Arc<MemoryStore>>,
        user: &User,
        horse: Uuid,
    ) -> StatusCode {
        let result = sanitary_plan(
            State(state.clone()),
            Extension(CurrentUser(user.clone())),
            Path(horse),
            Query(YearQuery { year: Some(2026) }),
        )
        .await;
        match result {
            Ok(response) => response.into_response().status(),
            Err(err) => err.status(),
        }
    }

    #[test]
    fn test_router_builds_on_memory_store() {
        let (_, state) = memory_state();
        let _router = create_router(state);
    }

    #[tokio::test]
    async fn test_sanitary_plan_requires_section_view() {
        let (store, state) = memory_state();
        let horse = store.add_horse("Relámpago", Some(SanitaryCategory::A));
        let mut groom = store.add_user("groom@haras.test", Role::Employee, LifecycleStatus::Active);

        assert_eq!(plan_status(&state, &groom, horse.id).await, StatusCode::OK);

        // Module access alone is not enough once the section is withheld.
        groom
            .permissions
            .as_mut()
            .unwrap()
            .set_section(sections::SANITARY_PLAN, SectionPermissions::default());
        assert!(require(&groom, modules::HORSES, Action::View).is_ok());
        assert_eq!(plan_status(&state, &groom, horse.id).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_sanitary_plan_for_missing_horse() {
        let (store, state) = memory_state();
        let root = store.add_user("root@haras.test", Role::SuperAdmin, LifecycleStatus::Active);

        assert_eq!(
            plan_status(&state, &root, Uuid::new_v4()).await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_mark_read_on_someone_elses_alert_is_forbidden() {
        let (store, state) = memory_state();
        let rider = store.add_user("rider@haras.test", Role::Client, LifecycleStatus::Active);
        let other = store.add_user("other@haras.test", Role::Client, LifecycleStatus::Active);
        let alert = state
            .alerts
            .create(
                NewAlert::new(
                    AlertType::Event,
                    AlertPriority::Medium,
                    "Reminder",
                    "Jumping clinic tomorrow",
                )
                .for_user(rider.id),
            )
            .await
            .unwrap();

        let result = mark_alert_read(
            State(state.clone()),
            Extension(CurrentUser(other)),
            Path(alert.id),
        )
        .await;
        assert_eq!(result.err().unwrap().status(), StatusCode::FORBIDDEN);

        let result =
            mark_alert_read(State(state), Extension(CurrentUser(rider)), Path(alert.id)).await;
        assert!(result.is_ok());
        assert!(store.all_alerts()[0].read);
    }

    #[test]
    fn test_catalog_entry_for_known_category() {
        let entry = catalog_entry(2026, SanitaryCategory::A).unwrap();
        assert_eq!(entry.version_year, 2026);
        assert_eq!(entry.category, SanitaryCategory::A);
        assert_eq!(entry.annual_cost, entry.plan.monthly_cost * 12);
        assert_eq!(entry.total_activities, 13);
    }

    #[test]
    fn test_catalog_entry_falls_back_to_oldest_version() {
        let entry = catalog_entry(2020, SanitaryCategory::B).unwrap();
        assert_eq!(entry.version_year, 2026);
        assert_eq!(entry.total_activities, 10);
    }

    #[test]
    fn test_unknown_category_is_bad_request() {
        let err = ApiError::from("C".parse::<SanitaryCategory>().unwrap_err());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
