use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    assets::StorageError,
    directory::SortKey,
    registry::Registry,
    service::{Listing, ServiceError},
    types::{SchoolSubmission, UploadedAsset},
};

use super::{
    models::{ErrorResponse, HealthResponse, ListParams, RegisteredResponse, SchoolsResponse},
    AppState,
};

pub async fn health<R: Registry>(State(state): State<AppState<R>>) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime_secs,
        }),
    )
}

pub async fn register_school<R: Registry>(
    State(state): State<AppState<R>>,
    multipart: Multipart,
) -> Response {
    let submission = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(err) => {
            log::warn!("Malformed registration body: {}", err);
            return (err.status(), Json(ErrorResponse::new(err.body_text()))).into_response();
        }
    };

    match state.service.register(submission).await {
        Ok(school) => (
            StatusCode::OK,
            Json(RegisteredResponse {
                message: "School added successfully",
                school,
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn list_schools<R: Registry>(
    State(state): State<AppState<R>>,
    Query(params): Query<ListParams>,
) -> Response {
    let sort = match params.sort.as_deref().filter(|s| !s.trim().is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<SortKey>() {
            Ok(key) => Some(key),
            Err(err) => {
                return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(err.to_string())))
                    .into_response();
            }
        },
    };
    let query = params.q.unwrap_or_default();

    match state.service.browse(&query, sort).await {
        Ok(Listing::Empty) => Json(SchoolsResponse {
            schools: Vec::new(),
            count: 0,
            message: Some("No schools found"),
        })
        .into_response(),
        Ok(Listing::NoMatches) => Json(SchoolsResponse {
            schools: Vec::new(),
            count: 0,
            message: Some("No schools match the query"),
        })
        .into_response(),
        Ok(Listing::Schools(schools)) => Json(SchoolsResponse {
            count: schools.len(),
            schools,
            message: None,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn school_image<R: Registry>(
    State(state): State<AppState<R>>,
    Path(file): Path<String>,
) -> Response {
    match state.service.assets().read(&file).await {
        Ok(Some(bytes)) => {
            ([(header::CONTENT_TYPE, content_type_for(&file))], bytes).into_response()
        }
        Ok(None) | Err(StorageError::InvalidFileName(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("image not found")),
        )
            .into_response(),
        Err(err) => {
            log::error!("Failed to read image {}: {}", file, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("failed to read image")),
            )
                .into_response()
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("endpoint not found")),
    )
}

fn error_response(err: ServiceError) -> Response {
    let (status, body) = match err {
        ServiceError::Validation(v) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                message: "Missing required fields".to_string(),
                violations: v.violations().to_vec(),
            },
        ),
        ServiceError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Failed to store image"),
        ),
        ServiceError::Write(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Failed to add school"),
        ),
        ServiceError::Connection(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Database unavailable"),
        ),
        ServiceError::Read(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Failed to retrieve schools data"),
        ),
    };
    (status, Json(body)).into_response()
}

async fn read_submission(mut multipart: Multipart) -> Result<SchoolSubmission, MultipartError> {
    let mut submission = SchoolSubmission::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                let mut asset = UploadedAsset::new(filename, bytes.to_vec());
                asset.content_type = content_type;
                submission.image = Some(asset);
            }
            "name" => submission.name = Some(field.text().await?),
            "email" => submission.email = Some(field.text().await?),
            "address" => submission.address = Some(field.text().await?),
            "city" => submission.city = Some(field.text().await?),
            "state" => submission.state = Some(field.text().await?),
            "contact" => submission.contact = Some(field.text().await?),
            other => log::debug!("Ignoring unknown form field {:?}", other),
        }
    }
    Ok(submission)
}

fn content_type_for(file: &str) -> &'static str {
    let ext = file
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}
