use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{get, post};
use axum::{Router, extract::State, http::StatusCode};

use crate::error::AppError;
use crate::models::*;
use crate::services::{RemoteResetStats, SavedSchedule, SyncStats, WipeStats};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/types", get(course_types))
        .route("/courses/days", get(course_days))
        .route(
            "/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/courses/{id}/schedules", get(course_schedules))
        .route("/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/schedules/{id}",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        .route("/sync", post(sync_now))
        .route("/sync/ping", get(ping_remote))
        .route("/sync/reset-remote", post(reset_remote))
        .route("/reset", post(wipe_all))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_courses(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.catalog.list_courses(&filter).await?;
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<NewCourse>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = state.catalog.create_course(req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn course_types(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.catalog.course_types().await?))
}

async fn course_days(State(state): State<AppState>) -> Result<Json<Vec<DayOfWeek>>, AppError> {
    Ok(Json(state.catalog.course_days().await?))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(state.catalog.get_course(id).await?))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewCourse>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(state.catalog.update_course(id, req).await?))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.sync.delete_course(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn course_schedules(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    state.catalog.get_course(id).await?;
    let entries = state
        .catalog
        .list_schedules(&ScheduleFilter::for_course(id))
        .await?;
    Ok(Json(entries))
}

async fn list_schedules(
    State(state): State<AppState>,
    Query(filter): Query<ScheduleFilter>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    Ok(Json(state.catalog.list_schedules(&filter).await?))
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(req): Json<NewScheduleEntry>,
) -> Result<(StatusCode, Json<SavedSchedule>), AppError> {
    let saved = state.catalog.create_schedule(req).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ScheduleEntry>, AppError> {
    Ok(Json(state.catalog.get_schedule(id).await?))
}

async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewScheduleEntry>,
) -> Result<Json<SavedSchedule>, AppError> {
    Ok(Json(state.catalog.update_schedule(id, req).await?))
}

async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_schedule(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn sync_now(State(state): State<AppState>) -> Result<Json<SyncStats>, AppError> {
    let stats = state.sync.sync_all().await?;
    Ok(Json(stats))
}

async fn ping_remote(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.sync.ping().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reset_remote(State(state): State<AppState>) -> Result<Json<RemoteResetStats>, AppError> {
    Ok(Json(state.sync.reset_remote().await?))
}

async fn wipe_all(State(state): State<AppState>) -> Result<Json<WipeStats>, AppError> {
    Ok(Json(state.sync.wipe_all().await?))
}
