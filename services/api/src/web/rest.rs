//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;
use zenstudy_core::{
    check_in, daily_report, ordinal, register_student, top_n, AttendanceRecord, Batch,
    CheckInError, CheckInOutcome, LeaderboardEntry, PortError, RegisterError, Student,
    StudentStats,
};

/// The default leaderboard size.
const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;

/// The phrase the admin must echo back before the full reset runs.
const RESET_CONFIRM_PHRASE: &str = "DELETE EVERYTHING";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        register_handler,
        dashboard_handler,
        checkin_handler,
        leaderboard_handler,
        admin_report_handler,
        admin_reset_handler,
    ),
    components(
        schemas(
            RegisterRequest,
            StudentDto,
            StatsDto,
            AttendanceDto,
            DashboardResponse,
            CheckinResponse,
            LeaderboardEntryDto,
            ReportResponse,
            ResetRequest,
        )
    ),
    tags(
        (name = "ZenStudy API", description = "Attendance check-in, streaks, and the daily leaderboard.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    /// One of the fixed batch labels: S1, S2, S3.
    pub batch: String,
}

#[derive(Serialize, ToSchema)]
pub struct StudentDto {
    pub id: Uuid,
    pub name: String,
    pub batch: String,
    pub created_at: DateTime<Utc>,
}

impl From<Student> for StudentDto {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            name: s.name,
            batch: s.batch.to_string(),
            created_at: s.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StatsDto {
    pub total_points: i32,
    pub current_streak: i32,
    pub best_streak: i32,
    pub last_checkin_date: Option<NaiveDate>,
    pub medal_level: String,
}

impl From<StudentStats> for StatsDto {
    fn from(s: StudentStats) -> Self {
        Self {
            total_points: s.total_points,
            current_streak: s.current_streak,
            best_streak: s.best_streak,
            last_checkin_date: s.last_checkin_date,
            medal_level: s.medal_level.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceDto {
    pub id: Uuid,
    pub date: NaiveDate,
    pub checkin_time: DateTime<Utc>,
    pub points: Option<i32>,
    pub rank_today: Option<i32>,
    /// Display form of the rank ("3rd"), present once finalized.
    pub rank_display: Option<String>,
}

impl From<AttendanceRecord> for AttendanceDto {
    fn from(a: AttendanceRecord) -> Self {
        Self {
            id: a.id,
            date: a.date,
            checkin_time: a.checkin_time,
            points: a.points,
            rank_today: a.rank_today,
            rank_display: a.rank_today.map(ordinal),
        }
    }
}

/// Everything the student's home screen shows for one day.
#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub student: StudentDto,
    pub stats: Option<StatsDto>,
    pub today: Option<AttendanceDto>,
    /// How many students checked in earlier today (0 when not checked in).
    pub woke_before: i64,
}

#[derive(Serialize, ToSchema)]
pub struct CheckinResponse {
    pub attendance: AttendanceDto,
    /// True when this call found an existing record instead of creating one.
    pub already_checked_in: bool,
    pub stats: Option<StatsDto>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaderboardEntryDto {
    pub rank: i32,
    pub student_name: String,
    pub batch: String,
    pub checkin_time: DateTime<Utc>,
    pub points: i32,
}

impl From<LeaderboardEntry> for LeaderboardEntryDto {
    fn from(e: LeaderboardEntry) -> Self {
        Self {
            rank: e.rank,
            student_name: e.student_name,
            batch: e.batch.to_string(),
            checkin_time: e.checkin_time,
            points: e.points,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    pub date: NaiveDate,
    pub total_students: usize,
    pub present: usize,
    pub absent: usize,
    pub toppers: Vec<LeaderboardEntryDto>,
    pub late_comers: Vec<LeaderboardEntryDto>,
    pub absentees: Vec<StudentDto>,
    /// Roster rows matching the free-text query, when one was given.
    pub matches: Option<Vec<StudentDto>>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetRequest {
    /// Must be exactly "DELETE EVERYTHING".
    pub confirm: String,
}

#[derive(Deserialize)]
pub struct LeaderboardParams {
    pub date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct ReportParams {
    pub date: Option<NaiveDate>,
    pub query: Option<String>,
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

fn internal(context: &str, e: impl std::fmt::Debug) -> (StatusCode, String) {
    error!("{context}: {e:?}");
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

fn map_port_error(context: &str, e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        other => internal(context, other),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Register a new student and initialize their stats.
#[utoipa::path(
    post,
    path = "/students",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Student registered", body = StudentDto),
        (status = 400, description = "Empty name or unknown batch"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let batch: Batch = payload
        .batch
        .parse()
        .map_err(|e: zenstudy_core::UnknownBatch| (StatusCode::BAD_REQUEST, e.to_string()))?;

    match register_student(state.store.as_ref(), &payload.name, batch).await {
        Ok(student) => Ok((StatusCode::CREATED, Json(StudentDto::from(student)))),
        Err(RegisterError::EmptyName) => {
            Err((StatusCode::BAD_REQUEST, RegisterError::EmptyName.to_string()))
        }
        Err(RegisterError::Storage(e)) => Err(internal("Failed to register student", e)),
    }
}

/// Fetch a student's dashboard: profile, stats, and today's attendance.
#[utoipa::path(
    get,
    path = "/students/{id}",
    responses(
        (status = 200, description = "Dashboard data", body = DashboardResponse),
        (status = 404, description = "Unknown student"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The student's unique ID.")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = state.store.as_ref();
    let student = store
        .get_student(id)
        .await
        .map_err(|e| map_port_error("Failed to load student", e))?;

    let stats = store
        .get_stats(id)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;

    let today = store
        .get_attendance(id, state.today())
        .await
        .map_err(|e| internal("Failed to load attendance", e))?;

    // "Woke before N seekers": everyone with a strictly earlier check-in.
    let woke_before = match &today {
        Some(record) => store
            .count_attendance_before(record.date, record.checkin_time)
            .await
            .map_err(|e| internal("Failed to count earlier check-ins", e))?,
        None => 0,
    };

    Ok(Json(DashboardResponse {
        student: student.into(),
        stats: stats.map(Into::into),
        today: today.map(Into::into),
        woke_before,
    }))
}

/// Record today's check-in ("I am awake").
///
/// Idempotent: a second call on the same day returns the existing record
/// with `already_checked_in = true` and changes nothing.
#[utoipa::path(
    post,
    path = "/students/{id}/checkin",
    responses(
        (status = 200, description = "Checked in (or already checked in)", body = CheckinResponse),
        (status = 403, description = "Inside the blackout window"),
        (status = 404, description = "Unknown student"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The student's unique ID.")
    )
)]
pub async fn checkin_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = state.store.as_ref();
    // Resolve the student first so an unknown id is a 404, not a failed insert.
    store
        .get_student(id)
        .await
        .map_err(|e| map_port_error("Failed to load student", e))?;

    let outcome = check_in(store, &state.config.blackout, id, state.now_local())
        .await
        .map_err(|e| match e {
            CheckInError::OutsideWindow { .. } => (StatusCode::FORBIDDEN, e.to_string()),
            CheckInError::Storage(e) => internal("Check-in failed", e),
        })?;

    let (record, already) = match outcome {
        CheckInOutcome::CheckedIn(r) => (r, false),
        CheckInOutcome::AlreadyCheckedIn(r) => (r, true),
    };

    let stats = store
        .get_stats(id)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;

    Ok(Json(CheckinResponse {
        attendance: record.into(),
        already_checked_in: already,
        stats: stats.map(Into::into),
    }))
}

/// Today's leaderboard, rank ascending.
#[utoipa::path(
    get,
    path = "/leaderboard",
    responses(
        (status = 200, description = "Top check-ins for the day", body = [LeaderboardEntryDto]),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("date" = Option<NaiveDate>, Query, description = "Defaults to today."),
        ("limit" = Option<i64>, Query, description = "Defaults to 10.")
    )
)]
pub async fn leaderboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let date = params.date.unwrap_or_else(|| state.today());
    let limit = params.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT).max(0);

    let entries = top_n(state.store.as_ref(), date, limit)
        .await
        .map_err(|e| internal("Failed to load leaderboard", e))?;

    let body: Vec<LeaderboardEntryDto> = entries.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// The admin's daily review: counts, toppers, late comers, absentees.
#[utoipa::path(
    get,
    path = "/admin/report",
    responses(
        (status = 200, description = "Daily attendance report", body = ReportResponse),
        (status = 401, description = "Missing or wrong admin key"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("date" = Option<NaiveDate>, Query, description = "Defaults to today."),
        ("query" = Option<String>, Query, description = "Optional roster search."),
        ("x-admin-key" = String, Header, description = "The shared admin passphrase.")
    )
)]
pub async fn admin_report_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = state.store.as_ref();
    let date = params.date.unwrap_or_else(|| state.today());

    let roster = store
        .list_students()
        .await
        .map_err(|e| internal("Failed to load roster", e))?;
    let attendance = store
        .list_attendance_for_date(date, None)
        .await
        .map_err(|e| internal("Failed to load attendance", e))?;

    let report = daily_report(date, &roster, &attendance);
    let matches = params.query.as_deref().map(|q| {
        zenstudy_core::report::search(&roster, q)
            .into_iter()
            .map(|s| StudentDto::from(s.clone()))
            .collect::<Vec<_>>()
    });

    Ok(Json(ReportResponse {
        date: report.date,
        total_students: report.total_students,
        present: report.present,
        absent: report.absent,
        toppers: report.toppers.into_iter().map(Into::into).collect(),
        late_comers: report.late_comers.into_iter().map(Into::into).collect(),
        absentees: report.absentees.into_iter().map(Into::into).collect(),
        matches,
    }))
}

/// Delete all attendance, stats, and students. Irreversible.
#[utoipa::path(
    post,
    path = "/admin/reset",
    request_body = ResetRequest,
    responses(
        (status = 204, description = "Everything deleted"),
        (status = 400, description = "Confirmation phrase missing or wrong"),
        (status = 401, description = "Missing or wrong admin key"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-admin-key" = String, Header, description = "The shared admin passphrase.")
    )
)]
pub async fn admin_reset_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.confirm != RESET_CONFIRM_PHRASE {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Reset requires confirm = \"{RESET_CONFIRM_PHRASE}\""),
        ));
    }

    state
        .store
        .reset_all()
        .await
        .map_err(|e| internal("Reset failed", e))?;

    Ok(StatusCode::NO_CONTENT)
}
