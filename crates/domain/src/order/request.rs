//! Order creation payload and its structural validation.
//!
//! The payload is deliberately loose (every field optional, enums as
//! strings) so that validation can name the first offending field instead
//! of failing inside the deserializer.

use chrono::{DateTime, NaiveDate, Utc};
use common::{CustomerId, FarmerId};
use serde::{Deserialize, Serialize};

use super::{
    DeliveryAddress, DeliverySlot, GeoPoint, Money, OrderLineItem, PaymentMethod, PaymentStatus,
};

/// A payload field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Path of the offending field, e.g. `items[0].quantity`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    /// Creates an error for `field`; the message is `"<field>" <reason>`.
    pub fn new(field: impl Into<String>, reason: &str) -> Self {
        let field = field.into();
        Self {
            message: format!("\"{field}\" {reason}"),
            field,
        }
    }

    fn required(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

/// Client payload for `create_order`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    pub farmer_id: Option<String>,
    pub items: Option<Vec<LineItemRequest>>,
    pub total_amount: Option<i64>,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub delivery_address: Option<AddressRequest>,
    pub delivery_slot: Option<SlotRequest>,
    pub delivery_fee: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i64>,
    pub subtotal: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub location: Option<LocationRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub coordinates: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub date: Option<String>,
    pub time_slot: Option<String>,
}

/// A creation payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub farmer_id: FarmerId,
    pub items: Vec<OrderLineItem>,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery_address: DeliveryAddress,
    pub delivery_slot: Option<DeliverySlot>,
    pub delivery_fee: Money,
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    /// Validates the payload. See [`validate_create_order`].
    pub fn validate(self) -> Result<NewOrder, ValidationError> {
        validate_create_order(self)
    }
}

/// Checks a creation payload field by field, in declaration order, and
/// reports the first violation.
///
/// A delivery location that carries no coordinates is dropped rather than
/// rejected.
pub fn validate_create_order(request: CreateOrderRequest) -> Result<NewOrder, ValidationError> {
    let customer_id = parse_id("customerId", request.customer_id.as_deref())?;
    let farmer_id = parse_id("farmerId", request.farmer_id.as_deref())?;

    let raw_items = request
        .items
        .ok_or_else(|| ValidationError::required("items"))?;
    if raw_items.is_empty() {
        return Err(ValidationError::new(
            "items",
            "must contain at least 1 items",
        ));
    }
    let items = raw_items
        .into_iter()
        .enumerate()
        .map(|(index, item)| validate_line_item(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    let total_amount = non_negative("totalAmount", request.total_amount)?
        .ok_or_else(|| ValidationError::required("totalAmount"))?;

    let payment_method = request
        .payment_method
        .as_deref()
        .ok_or_else(|| ValidationError::required("paymentMethod"))?
        .parse::<PaymentMethod>()
        .map_err(|_| {
            ValidationError::new("paymentMethod", "must be one of [cod, online, paystack]")
        })?;

    let payment_status = match request.payment_status.as_deref() {
        None => PaymentStatus::default(),
        Some(label) => label.parse::<PaymentStatus>().map_err(|_| {
            ValidationError::new(
                "paymentStatus",
                "must be one of [pending, paid, failed, refunded]",
            )
        })?,
    };

    let delivery_address = validate_address(
        request
            .delivery_address
            .ok_or_else(|| ValidationError::required("deliveryAddress"))?,
    )?;

    let delivery_slot = request.delivery_slot.map(validate_slot).transpose()?;

    let delivery_fee = non_negative("deliveryFee", request.delivery_fee)?.unwrap_or_default();

    Ok(NewOrder {
        customer_id,
        farmer_id,
        items,
        total_amount,
        payment_method,
        payment_status,
        delivery_address,
        delivery_slot,
        delivery_fee,
        notes: request.notes,
    })
}

fn parse_id<T>(field: &str, value: Option<&str>) -> Result<T, ValidationError>
where
    T: std::str::FromStr,
{
    let value = value.ok_or_else(|| ValidationError::required(field))?;
    value
        .parse()
        .map_err(|_| ValidationError::new(field, "must be a valid id"))
}

fn non_empty(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        None => Err(ValidationError::required(field)),
        Some(s) if s.trim().is_empty() => Err(ValidationError::new(field, "is not allowed to be empty")),
        Some(s) => Ok(s),
    }
}

fn non_negative(field: &str, value: Option<i64>) -> Result<Option<Money>, ValidationError> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::new(
            field,
            "must be greater than or equal to 0",
        )),
        Some(v) if v > Money::MAX_INPUT => Err(ValidationError::new(
            field,
            &format!("must be less than or equal to {}", Money::MAX_INPUT),
        )),
        other => Ok(other.map(Money::from_minor)),
    }
}

fn validate_line_item(index: usize, item: LineItemRequest) -> Result<OrderLineItem, ValidationError> {
    let field = |name: &str| format!("items[{index}].{name}");

    let product_id = parse_id(&field("productId"), item.product_id.as_deref())?;
    let name = non_empty(&field("name"), item.name)?;
    let price = non_negative(&field("price"), item.price)?
        .ok_or_else(|| ValidationError::required(field("price")))?;

    let quantity = item
        .quantity
        .ok_or_else(|| ValidationError::required(field("quantity")))?;
    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| {
            ValidationError::new(field("quantity"), "must be greater than or equal to 1")
        })?;

    let subtotal = non_negative(&field("subtotal"), item.subtotal)?
        .ok_or_else(|| ValidationError::required(field("subtotal")))?;

    Ok(OrderLineItem {
        product_id,
        name,
        price,
        quantity,
        subtotal,
    })
}

fn validate_address(address: AddressRequest) -> Result<DeliveryAddress, ValidationError> {
    let street = non_empty("deliveryAddress.street", address.street)?;
    let city = non_empty("deliveryAddress.city", address.city)?;
    let state = non_empty("deliveryAddress.state", address.state)?;
    let phone = non_empty("deliveryAddress.phone", address.phone)?;

    let location = match address.location {
        Some(LocationRequest {
            coordinates: Some(coordinates),
            ..
        }) if !coordinates.is_empty() => match coordinates.as_slice() {
            [lng, lat] => Some(GeoPoint::new(*lng, *lat)),
            _ => {
                return Err(ValidationError::new(
                    "deliveryAddress.location.coordinates",
                    "must contain 2 items",
                ));
            }
        },
        _ => None,
    };

    Ok(DeliveryAddress {
        street,
        city,
        state,
        phone,
        location,
    })
}

fn validate_slot(slot: SlotRequest) -> Result<DeliverySlot, ValidationError> {
    let raw_date = slot
        .date
        .ok_or_else(|| ValidationError::required("deliverySlot.date"))?;
    let date = parse_date(&raw_date)
        .ok_or_else(|| ValidationError::new("deliverySlot.date", "must be a valid date"))?;
    let time_slot = non_empty("deliverySlot.timeSlot", slot.time_slot)?;

    Ok(DeliverySlot { date, time_slot })
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}
