use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::dtos::request::{
    CreateRequestBody, DecisionBody, RequestDetailResponse, ResubmitBody, SupplierResponseBody,
    SupplierResponseResponse,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::SupplyRequest;
use crate::state::AppState;
use crate::workflow::{RequestDraft, RequestItemDraft, RequestRevision};

pub async fn create_request(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<RequestDetailResponse>), AppError> {
    let draft = RequestDraft {
        title: body.title,
        description: body.description,
        priority: body.priority,
        required_date: body.required_date,
        notes: body.notes,
        items: body
            .items
            .into_iter()
            .map(|i| RequestItemDraft {
                item_id: i.item_id,
                quantity: i.quantity,
                specifications: i.specifications,
                notes: i.notes,
            })
            .collect(),
    };

    let (request, items) = engine.submit_request(&auth.actor, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(RequestDetailResponse { request, items }),
    ))
}

pub async fn list_requests(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<SupplyRequest>>, AppError> {
    Ok(Json(engine.list_requests(&auth.actor).await?))
}

pub async fn get_request(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<RequestDetailResponse>, AppError> {
    let (request, items) = engine.get_request(&auth.actor, id).await?;
    Ok(Json(RequestDetailResponse { request, items }))
}

pub async fn decide_request(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<DecisionBody>,
) -> Result<Json<SupplyRequest>, AppError> {
    let request = engine
        .decide_request(&auth.actor, id, body.action, body.reason.as_deref())
        .await?;
    Ok(Json(request))
}

pub async fn supplier_respond(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<SupplierResponseBody>,
) -> Result<Json<SupplierResponseResponse>, AppError> {
    let (request, order) = engine
        .supplier_respond(&auth.actor, id, body.action, body.notes.as_deref())
        .await?;
    Ok(Json(SupplierResponseResponse { request, order }))
}

pub async fn resubmit_request(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<ResubmitBody>,
) -> Result<Json<SupplyRequest>, AppError> {
    let revision = RequestRevision {
        title: body.title,
        description: body.description,
        priority: body.priority,
        required_date: body.required_date,
        items: body.items.map(|items| {
            items
                .into_iter()
                .map(|i| RequestItemDraft {
                    item_id: i.item_id,
                    quantity: i.quantity,
                    specifications: i.specifications,
                    notes: i.notes,
                })
                .collect()
        }),
    };

    let request = engine.resubmit_request(&auth.actor, id, revision).await?;
    Ok(Json(request))
}
