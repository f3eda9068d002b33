//! HTTP API
//!
//! Both roles serve snapshot reads and health. The source adds create,
//! update and delete; the consumer adds the peer intake endpoints and a
//! manual snapshot pull. Every handler answers with a JSON body or an empty
//! 204, and errors carry `{ "error": "..." }`.

use crate::config::Role;
use csync_model::{ConditionId, DocumentId, PageId, ProjectConditionTree, ProjectId, ZoneId};
use csync_peer::{ConsumerService, DeletedIds, Deletion, IntakeError, Reconciliation, SourceService};
use csync_store::{SharedStore, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::fmt;
use tracing::warn;
use warp::filters::body::BodyDeserializeError;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

/// Largest accepted request body
pub const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

fn with_value<T>(value: T) -> impl Filter<Extract = (T,), Error = Infallible> + Clone
where
    T: Clone + Send + Sync + 'static,
{
    warp::any().map(move || value.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn json_reply<T: Serialize>(value: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(value), status).into_response()
}

fn error_reply(status: StatusCode, message: impl fmt::Display) -> Response {
    json_reply(&json!({ "error": message.to_string() }), status)
}

fn deleted(removed: bool, level: &str) -> Response {
    if removed {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_reply(StatusCode::NOT_FOUND, format!("{level} not found"))
    }
}

fn nil_project() -> Response {
    error_reply(StatusCode::BAD_REQUEST, "project id must not be empty")
}

fn store_error(error: &StoreError) -> Response {
    let status = if error.is_conflict() {
        StatusCode::CONFLICT
    } else {
        StatusCode::BAD_REQUEST
    };
    error_reply(status, error)
}

fn intake_error(error: &IntakeError) -> Response {
    let status = if error.is_not_found() {
        StatusCode::NOT_FOUND
    } else if error.is_bad_request() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    error_reply(status, error)
}

/// Snapshot reads served by both roles
pub fn reads(store: SharedStore) -> BoxedFilter<(Response,)> {
    let projects = warp::path!("api" / "projects")
        .and(warp::get())
        .and(with_value(store.clone()))
        .map(|store: SharedStore| json_reply(&store.project_ids(), StatusCode::OK));

    let conditions = warp::path!("api" / "projects" / ProjectId / "conditions")
        .and(warp::get())
        .and(with_value(store.clone()))
        .map(|project_id: ProjectId, store: SharedStore| {
            json_reply(&store.get_all(project_id), StatusCode::OK)
        });

    let condition = warp::path!("api" / "projects" / ProjectId / "conditions" / ConditionId)
        .and(warp::get())
        .and(with_value(store))
        .map(
            |project_id: ProjectId, condition_id: ConditionId, store: SharedStore| {
                match store.get(project_id, condition_id) {
                    Some(tree) => json_reply(&tree, StatusCode::OK),
                    None => error_reply(StatusCode::NOT_FOUND, "condition not found"),
                }
            },
        );

    projects
        .or(conditions)
        .unify()
        .or(condition)
        .unify()
        .boxed()
}

/// Liveness probe
pub fn health(role: Role) -> BoxedFilter<(Response,)> {
    warp::path!("api" / "health")
        .and(warp::get())
        .map(move || {
            json_reply(
                &json!({ "status": "ok", "role": role.to_string() }),
                StatusCode::OK,
            )
        })
        .boxed()
}

/// Full API of a source node
pub fn source_api(service: SourceService) -> BoxedFilter<(Response,)> {
    let create = warp::path!("api" / "conditions")
        .and(warp::post())
        .and(json_body::<ProjectConditionTree>())
        .and(with_value(service.clone()))
        .map(
            |tree: ProjectConditionTree, service: SourceService| match service.create(tree) {
                Ok(stored) => json_reply(&stored, StatusCode::CREATED),
                Err(error) => store_error(&error),
            },
        );

    let update = warp::path!("api" / "conditions" / ConditionId)
        .and(warp::put())
        .and(json_body::<ProjectConditionTree>())
        .and(with_value(service.clone()))
        .map(
            |condition_id: ConditionId, tree: ProjectConditionTree, service: SourceService| {
                match service.update(condition_id, tree) {
                    Ok(stored) => json_reply(&stored, StatusCode::OK),
                    Err(error) => store_error(&error),
                }
            },
        );

    let delete_condition = warp::path!("api" / "projects" / ProjectId / "conditions" / ConditionId)
        .and(warp::delete())
        .and(with_value(service.clone()))
        .map(|project_id: ProjectId, condition_id: ConditionId, service: SourceService| {
            if project_id.is_nil() {
                return nil_project();
            }
            deleted(service.delete_condition(project_id, condition_id), "condition")
        });

    let delete_document = warp::path!("api" / "projects" / ProjectId / "documents" / DocumentId)
        .and(warp::delete())
        .and(with_value(service.clone()))
        .map(|project_id: ProjectId, document_id: DocumentId, service: SourceService| {
            if project_id.is_nil() {
                return nil_project();
            }
            deleted(service.delete_document(project_id, document_id), "document")
        });

    let delete_page = warp::path!("api" / "projects" / ProjectId / "pages" / PageId)
        .and(warp::delete())
        .and(with_value(service.clone()))
        .map(|project_id: ProjectId, page_id: PageId, service: SourceService| {
            if project_id.is_nil() {
                return nil_project();
            }
            deleted(service.delete_page(project_id, page_id), "page")
        });

    let delete_zone = warp::path!("api" / "projects" / ProjectId / "zones" / ZoneId)
        .and(warp::delete())
        .and(with_value(service.clone()))
        .map(|project_id: ProjectId, zone_id: ZoneId, service: SourceService| {
            if project_id.is_nil() {
                return nil_project();
            }
            deleted(service.delete_zone(project_id, zone_id), "zone")
        });

    reads(service.store().clone())
        .or(create)
        .unify()
        .or(update)
        .unify()
        .or(delete_condition)
        .unify()
        .or(delete_document)
        .unify()
        .or(delete_page)
        .unify()
        .or(delete_zone)
        .unify()
        .or(health(Role::Source))
        .unify()
        .boxed()
}

fn deletion_intake<I>(
    segment: &'static str,
    wrap: fn(DeletedIds<I>) -> Deletion,
    service: ConsumerService,
) -> BoxedFilter<(Response,)>
where
    I: DeserializeOwned + Send + 'static,
{
    warp::path("api")
        .and(warp::path("interactions"))
        .and(warp::path(segment))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<DeletedIds<I>>())
        .and(with_value(service))
        .and_then(move |body: DeletedIds<I>, service: ConsumerService| async move {
            let deletion = wrap(body);
            let response = match service.apply_deletion(&deletion).await {
                Ok(Reconciliation::Refreshed { conditions }) => json_reply(
                    &json!({ "reconciled": true, "conditions": conditions }),
                    StatusCode::OK,
                ),
                Ok(Reconciliation::Stale) => {
                    json_reply(&json!({ "reconciled": false }), StatusCode::OK)
                }
                Err(error) => intake_error(&error),
            };
            Ok::<_, Rejection>(response)
        })
        .boxed()
}

/// Full API of a consumer node
pub fn consumer_api(service: ConsumerService) -> BoxedFilter<(Response,)> {
    let changed = warp::path!("api" / "interactions" / "conditions-changed")
        .and(warp::post())
        .and(json_body::<Vec<ProjectConditionTree>>())
        .and(with_value(service.clone()))
        .map(
            |trees: Vec<ProjectConditionTree>, service: ConsumerService| {
                match service.apply_changes(&trees) {
                    Ok(committed) => {
                        json_reply(&json!({ "applied": committed.len() }), StatusCode::OK)
                    }
                    Err(error) => intake_error(&error),
                }
            },
        );

    let pull = warp::path!("api" / "sync" / "pull")
        .and(warp::post())
        .and(with_value(service.clone()))
        .and_then(|service: ConsumerService| async move {
            let response = match service.pull_snapshot().await {
                Ok(stats) => json_reply(
                    &json!({ "projects": stats.projects, "conditions": stats.conditions }),
                    StatusCode::OK,
                ),
                Err(error) => intake_error(&error),
            };
            Ok::<_, Rejection>(response)
        });

    reads(service.store().clone())
        .or(changed)
        .unify()
        .or(deletion_intake("deleted-condition-ids", Deletion::Conditions, service.clone()))
        .unify()
        .or(deletion_intake("deleted-document-ids", Deletion::Documents, service.clone()))
        .unify()
        .or(deletion_intake("deleted-page-ids", Deletion::Pages, service.clone()))
        .unify()
        .or(deletion_intake("deleted-zone-ids", Deletion::Zones, service))
        .unify()
        .or(pull)
        .unify()
        .or(health(Role::Consumer))
        .unify()
        .boxed()
}

/// Turn unmatched requests and body errors into JSON responses
///
/// # Errors
/// Never fails; the error type is fixed by the recover filter
pub async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(error) = rejection.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, error.to_string())
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "request body too large".to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        warn!(?rejection, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };

    Ok(error_reply(status, message))
}

/// Attach rejection handling and request tracing
pub fn finish(
    api: BoxedFilter<(Response,)>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + Send + Sync + 'static {
    api.recover(handle_rejection)
        .with(warp::trace::request())
}
