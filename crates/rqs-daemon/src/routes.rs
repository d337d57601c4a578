//! Axum router and all HTTP handlers for rqs-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! tracing and CORS layers. Authentication is part of the router so tests
//! exercise the same policy as production.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use rqs_schemas::Order;
use rqs_service::{NewRequisition, RequisitionUpdate};
use tracing::warn;
use uuid::Uuid;

use crate::{
    api_types::{
        ApprovedSearchQuery, CommentRequest, HealthResponse, OrderSearchQuery, PrintQuery,
        RequisitionRef, RequisitionSearchQuery, SubmitRequest, VersionResponse,
    },
    auth::{self, Principal},
    error::ApiError,
    state::AppState,
};

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        // requisitions
        .route("/requisitions", get(list_requisitions).post(initiate))
        .route("/requisitions/initiate", post(initiate))
        .route("/requisitions/search", get(search_requisitions))
        .route("/requisitions/submitted", get(submitted))
        .route(
            "/requisitions/requisitions-for-approval",
            get(requisitions_for_approval),
        )
        .route("/requisitions/approved/search", get(approved_search))
        .route("/requisitions/creator/:id", get(by_creator))
        .route(
            "/requisitions/comments/:id",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route(
            "/requisitions/:id",
            get(get_requisition)
                .put(update_requisition)
                .delete(delete_requisition),
        )
        .route("/requisitions/:id/submit", put(submit))
        .route("/requisitions/:id/skip", put(skip))
        .route("/requisitions/:id/reject", put(reject))
        .route("/requisitions/:id/authorize", put(authorize))
        .route("/requisitions/:id/approve", put(approve))
        .route(
            "/requisitions/:id/comments",
            get(list_comments).post(add_comment),
        )
        // orders
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/search", get(search_orders))
        .route("/orders/requisitions", post(convert_to_order))
        .route(
            "/orders/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/orders/:id/finalize", put(finalize_order))
        .route("/orders/:id/print", get(print_order))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::authenticate,
        ))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /health, GET /version
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

pub(crate) async fn version(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(VersionResponse {
        service: st.build.service,
        version: st.build.version,
        build: st.build.build,
    })
}

// ---------------------------------------------------------------------------
// Requisition lifecycle (missing requisition → 400)
// ---------------------------------------------------------------------------

pub(crate) async fn initiate(
    State(st): State<Arc<AppState>>,
    principal: Option<Principal>,
    Json(body): Json<NewRequisition>,
) -> ApiResult<Response> {
    let r = st
        .service
        .initiate(body, principal.map(|p| p.user_id))
        .await
        .map_err(ApiError::missing_as_400)?;
    Ok((StatusCode::CREATED, Json(r)).into_response())
}

/// The body is optional; when present it may replace the stored lines.
pub(crate) async fn submit(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Response> {
    let req: SubmitRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SubmitRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid submit body: {e}")))?
    };

    let r = st
        .service
        .submit(id, req.requisition_lines)
        .await
        .map_err(ApiError::missing_as_400)?;
    Ok(Json(r).into_response())
}

pub(crate) async fn skip(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    if !st.service.skip(id).await.map_err(ApiError::missing_as_400)? {
        warn!(requisition = %id, "skip refused");
        return Err(ApiError::bad_request(format!(
            "requisition {id} cannot be skipped"
        )));
    }
    let r = st.service.get(id).await.map_err(ApiError::missing_as_400)?;
    Ok(Json(r).into_response())
}

pub(crate) async fn authorize(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let r = st
        .service
        .authorize(id)
        .await
        .map_err(ApiError::missing_as_400)?;
    Ok(Json(r).into_response())
}

pub(crate) async fn reject(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let r = st
        .service
        .reject(id)
        .await
        .map_err(ApiError::missing_as_400)?;
    Ok(Json(r).into_response())
}

pub(crate) async fn delete_requisition(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    if !st
        .service
        .delete(id)
        .await
        .map_err(ApiError::missing_as_400)?
    {
        warn!(requisition = %id, "delete refused");
        return Err(ApiError::bad_request(format!(
            "requisition {id} cannot be deleted"
        )));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ---------------------------------------------------------------------------
// Requisition reads and approval (missing → 404)
// ---------------------------------------------------------------------------

pub(crate) async fn approve(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let r = st.service.approve(id).await?;
    Ok(Json(r).into_response())
}

pub(crate) async fn list_requisitions(State(st): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(Json(st.service.list().await?).into_response())
}

pub(crate) async fn get_requisition(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(st.service.get(id).await?).into_response())
}

pub(crate) async fn update_requisition(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<RequisitionUpdate>,
) -> ApiResult<Response> {
    Ok(Json(st.service.update(id, body).await?).into_response())
}

pub(crate) async fn search_requisitions(
    State(st): State<Arc<AppState>>,
    Query(q): Query<RequisitionSearchQuery>,
) -> ApiResult<Response> {
    let params = q.into_params()?;
    Ok(Json(st.service.search(&params).await?).into_response())
}

pub(crate) async fn submitted(State(st): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(Json(st.service.submitted().await?).into_response())
}

pub(crate) async fn by_creator(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(st.service.search_by_creator(id).await?).into_response())
}

pub(crate) async fn requisitions_for_approval(
    State(st): State<Arc<AppState>>,
    principal: Principal,
) -> ApiResult<Response> {
    let list = st
        .service
        .requisitions_for_approval(principal.user_id)
        .await?;
    Ok(Json(list).into_response())
}

pub(crate) async fn approved_search(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ApprovedSearchQuery>,
) -> ApiResult<Response> {
    let search = q.into_search()?;
    Ok(Json(st.service.approved_search(&search).await?).into_response())
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

pub(crate) async fn list_comments(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(st.service.list_comments(id).await?).into_response())
}

pub(crate) async fn add_comment(
    State(st): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<Response> {
    let comments = st
        .service
        .add_comment(id, principal.user_id, body.comment_text)
        .await?;
    Ok(Json(comments).into_response())
}

pub(crate) async fn get_comment(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(st.service.get_comment(id).await?).into_response())
}

pub(crate) async fn update_comment(
    State(st): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<Response> {
    let view = st
        .service
        .update_comment(id, principal.user_id, body.comment_text)
        .await?;
    Ok(Json(view).into_response())
}

pub(crate) async fn delete_comment(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    st.service.delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

pub(crate) async fn list_orders(State(st): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(Json(st.service.list_orders().await?).into_response())
}

pub(crate) async fn create_order(
    State(st): State<Arc<AppState>>,
    Json(body): Json<Order>,
) -> ApiResult<Response> {
    let order = st
        .service
        .create_order(body)
        .await
        .map_err(ApiError::missing_as_400)?;
    Ok((StatusCode::CREATED, Json(order)).into_response())
}

pub(crate) async fn get_order(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(st.service.get_order(id).await?).into_response())
}

pub(crate) async fn update_order(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<Order>,
) -> ApiResult<Response> {
    Ok(Json(st.service.update_order(id, body).await?).into_response())
}

pub(crate) async fn delete_order(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    st.service.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn search_orders(
    State(st): State<Arc<AppState>>,
    Query(q): Query<OrderSearchQuery>,
) -> ApiResult<Response> {
    let params = q.into_params()?;
    Ok(Json(st.service.search_orders(&params).await?).into_response())
}

/// Release the referenced requisitions and create one order each.
pub(crate) async fn convert_to_order(
    State(st): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<Vec<RequisitionRef>>,
) -> ApiResult<Response> {
    let ids: Vec<Uuid> = body.iter().map(RequisitionRef::id).collect();
    let orders = st
        .service
        .convert_to_order(&ids, principal.user_id)
        .await
        .map_err(ApiError::missing_as_400)?;
    Ok((StatusCode::CREATED, Json(orders)).into_response())
}

pub(crate) async fn finalize_order(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(st.service.finalize_order(id).await?).into_response())
}

pub(crate) async fn print_order(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(q): Query<PrintQuery>,
) -> ApiResult<Response> {
    let format = q.format.unwrap_or_else(|| "csv".to_string());
    let csv = st.service.print_order(id, &format).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    )
        .into_response())
}
