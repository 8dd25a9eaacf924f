//! Order endpoints, mounted under `/api/orders`.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CustomerId, FarmerId, OrderId};
use domain::{CreateOrderRequest, FarmerStats, Order};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use store::{CartStore, OrderStore, ProductCatalog};
use workflow::OrderService;

use crate::error::ApiError;
use crate::response::ApiResponse;

/// Shared application state accessible from all handlers.
pub struct AppState<O, P, C> {
    pub order_service: OrderService<O, P, C>,
}

impl<O, P, C> AppState<O, P, C> {
    pub fn new(order_service: OrderService<O, P, C>) -> Self {
        Self { order_service }
    }
}

type Shared<O, P, C> = State<Arc<AppState<O, P, C>>>;
type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// -- Request bodies --

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdateBody {
    pub status: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdateBody {
    pub payment_status: Option<String>,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {
    pub reason: Option<String>,
}

/// Parses a JSON body that may be absent altogether.
fn optional_body<T: DeserializeOwned + Default>(bytes: &Bytes) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::BadRequest(format!("Failed to parse the request body as JSON: {e}")))
}

// -- Handlers --

/// POST /api/orders/create
#[tracing::instrument(skip_all)]
pub async fn create<O, P, C>(
    State(state): Shared<O, P, C>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Order>>), ApiError>
where
    O: OrderStore + Clone + 'static,
    P: ProductCatalog + Clone + 'static,
    C: CartStore + 'static,
{
    let Json(request) = payload?;
    let order = state.order_service.create_order(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order created successfully", order)),
    ))
}

/// GET /api/orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<O, P, C>(State(state): Shared<O, P, C>, Path(id): Path<String>) -> ApiResult<Order>
where
    O: OrderStore + Clone + 'static,
    P: ProductCatalog + Clone + 'static,
    C: CartStore + 'static,
{
    let order_id: OrderId = id.parse()?;
    let order = state.order_service.get_order(order_id).await?;
    Ok(Json(ApiResponse::success("Success", order)))
}

/// GET /api/orders/customer/{customerId}
#[tracing::instrument(skip(state))]
pub async fn list_by_customer<O, P, C>(
    State(state): Shared<O, P, C>,
    Path(customer_id): Path<String>,
) -> ApiResult<Vec<Order>>
where
    O: OrderStore + Clone + 'static,
    P: ProductCatalog + Clone + 'static,
    C: CartStore + 'static,
{
    let customer_id: CustomerId = customer_id.parse()?;
    let orders = state.order_service.list_orders_by_customer(customer_id).await?;
    Ok(Json(ApiResponse::success("Success", orders)))
}

/// GET /api/orders/farmer/{farmerId}
#[tracing::instrument(skip(state))]
pub async fn list_by_farmer<O, P, C>(
    State(state): Shared<O, P, C>,
    Path(farmer_id): Path<String>,
) -> ApiResult<Vec<Order>>
where
    O: OrderStore + Clone + 'static,
    P: ProductCatalog + Clone + 'static,
    C: CartStore + 'static,
{
    let farmer_id: FarmerId = farmer_id.parse()?;
    let orders = state.order_service.list_orders_by_farmer(farmer_id).await?;
    Ok(Json(ApiResponse::success("Success", orders)))
}

/// GET /api/orders/farmer/{farmerId}/stats
#[tracing::instrument(skip(state))]
pub async fn farmer_stats<O, P, C>(
    State(state): Shared<O, P, C>,
    Path(farmer_id): Path<String>,
) -> ApiResult<FarmerStats>
where
    O: OrderStore + Clone + 'static,
    P: ProductCatalog + Clone + 'static,
    C: CartStore + 'static,
{
    let farmer_id: FarmerId = farmer_id.parse()?;
    let stats = state.order_service.get_farmer_stats(farmer_id).await?;
    Ok(Json(ApiResponse::success("Success", stats)))
}

/// PATCH /api/orders/{id}/status
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<O, P, C>(
    State(state): Shared<O, P, C>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdateBody>, JsonRejection>,
) -> ApiResult<Order>
where
    O: OrderStore + Clone + 'static,
    P: ProductCatalog + Clone + 'static,
    C: CartStore + 'static,
{
    let order_id: OrderId = id.parse()?;
    let Json(body) = payload?;

    let order = state
        .order_service
        .update_status(order_id, body.status.as_deref().unwrap_or_default(), body.note)
        .await?;
    Ok(Json(ApiResponse::success("Order status updated", order)))
}

/// PATCH /api/orders/{id}/payment
#[tracing::instrument(skip(state, payload))]
pub async fn update_payment<O, P, C>(
    State(state): Shared<O, P, C>,
    Path(id): Path<String>,
    payload: Result<Json<PaymentUpdateBody>, JsonRejection>,
) -> ApiResult<Order>
where
    O: OrderStore + Clone + 'static,
    P: ProductCatalog + Clone + 'static,
    C: CartStore + 'static,
{
    let order_id: OrderId = id.parse()?;
    let Json(body) = payload?;

    let order = state
        .order_service
        .update_payment(
            order_id,
            body.payment_status.as_deref().unwrap_or_default(),
            body.payment_reference,
        )
        .await?;
    Ok(Json(ApiResponse::success("Payment status updated", order)))
}

/// POST /api/orders/{id}/cancel
///
/// The body is optional; `{ "reason": "..." }` when present.
#[tracing::instrument(skip(state, body))]
pub async fn cancel<O, P, C>(
    State(state): Shared<O, P, C>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Order>
where
    O: OrderStore + Clone + 'static,
    P: ProductCatalog + Clone + 'static,
    C: CartStore + 'static,
{
    let order_id: OrderId = id.parse()?;
    let CancelBody { reason } = optional_body(&body)?;

    let order = state.order_service.cancel_order(order_id, reason).await?;
    Ok(Json(ApiResponse::success("Order cancelled", order)))
}
