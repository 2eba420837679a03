use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::logic::{PersonService, ServiceError};
use crate::model::{
    NewPerson, Page, PageRequest, ParentIds, PersonDto, PersonId, PersonUpdate, Sort,
};
use crate::store::PersonStore;

/// Shared state handed to every handler
pub struct AppContext<S> {
    pub service: PersonService<S>,
    /// Page size used when a list request does not specify one
    pub default_page_size: u32,
}

pub type AppState<S> = Arc<AppContext<S>>;

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Pagination query parameters: `?page=0&size=5&sort=name,desc`
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl PageQuery {
    fn into_request(self, default_page_size: u32) -> ApiResult<PageRequest> {
        let sort = match self.sort.as_deref() {
            Some(raw) => raw.parse::<Sort>().map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(&e.to_string())),
                )
            })?,
            None => Sort::unsorted(),
        };

        Ok(PageRequest::with_sort(
            self.page.unwrap_or(0),
            self.size.unwrap_or(default_page_size),
            sort,
        ))
    }
}

fn error_response(err: ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Store(e) => {
            log::error!("store failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(ErrorResponse::new(&err.to_string())))
}

/// GET /person
pub async fn list_persons<S: PersonStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<PersonDto>>> {
    let request = query.into_request(state.default_page_size)?;
    let page = state
        .service
        .get_all(request)
        .await
        .map_err(error_response)?;

    Ok(Json(page))
}

/// GET /person/{id}
pub async fn get_person<S: PersonStore>(
    Path(id): Path<i64>,
    State(state): State<AppState<S>>,
) -> ApiResult<Json<PersonDto>> {
    match state.service.get_by_id(PersonId(id)).await {
        Ok(Some(person)) => Ok(Json(person)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Person not found")),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /person
/// Create a person; the id is always assigned by the server
pub async fn create_person<S: PersonStore>(
    State(state): State<AppState<S>>,
    RequestJson(new_person): RequestJson<NewPerson>,
) -> ApiResult<impl IntoResponse> {
    let person = state
        .service
        .create(new_person)
        .await
        .map_err(error_response)?;

    let location = format!("/person/{}", person.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(person),
    ))
}

/// PATCH /person/{id}
/// Partial update; parentIds are added to the existing parents
pub async fn update_person<S: PersonStore>(
    Path(id): Path<i64>,
    State(state): State<AppState<S>>,
    RequestJson(update): RequestJson<PersonUpdate>,
) -> ApiResult<Json<PersonDto>> {
    let person = state
        .service
        .update(PersonId(id), update)
        .await
        .map_err(error_response)?;

    Ok(Json(person))
}

/// PUT /person/{id}/parents
/// Replace the parent set exactly
pub async fn replace_parents<S: PersonStore>(
    Path(id): Path<i64>,
    State(state): State<AppState<S>>,
    RequestJson(body): RequestJson<ParentIds>,
) -> ApiResult<Json<PersonDto>> {
    let person = state
        .service
        .replace_parents(PersonId(id), body.into_set())
        .await
        .map_err(error_response)?;

    Ok(Json(person))
}

/// POST /person/{id}/parents
/// Link additional parents
pub async fn add_parents<S: PersonStore>(
    Path(id): Path<i64>,
    State(state): State<AppState<S>>,
    RequestJson(body): RequestJson<ParentIds>,
) -> ApiResult<Json<PersonDto>> {
    let person = state
        .service
        .add_parents(PersonId(id), body.into_set())
        .await
        .map_err(error_response)?;

    Ok(Json(person))
}
