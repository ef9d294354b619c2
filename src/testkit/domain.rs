//! Builders for domain primitives: orders, line items and their JSON rows.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::domain::{DeliveryMethod, Order, OrderId, OrderItem, OrderStatus, ProductId};

/// Fixed creation time used by the builders (2024-05-01 10:00 UTC).
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A line item with a fixed unit price of 2.50.
pub fn item(product_id: &str, name: &str, quantity: u32) -> OrderItem {
    OrderItem {
        product_id: ProductId::new(product_id),
        name: name.to_string(),
        quantity,
        price: Decimal::new(250, 2),
        image: None,
    }
}

/// A delivery order with one line, created at [`epoch`].
pub fn order(id: &str, status: OrderStatus) -> Order {
    order_at(id, status, epoch())
}

/// Like [`order`] but created at `created_at`.
pub fn order_at(id: &str, status: OrderStatus, created_at: DateTime<Utc>) -> Order {
    Order {
        id: OrderId::new(id),
        customer_phone: "+36 30 123 4567".into(),
        customer_residence: "Block A".into(),
        customer_apartment: "12".into(),
        items: vec![item("p-1", "Bread", 2)],
        total: Decimal::new(500, 2),
        delivery_method: DeliveryMethod::Delivery,
        status,
        created_at,
        updated_at: created_at,
    }
}

/// `order` created `minutes` after [`epoch`].
pub fn order_after(id: &str, status: OrderStatus, minutes: i64) -> Order {
    order_at(id, status, epoch() + Duration::minutes(minutes))
}

/// The JSON row a change feed would deliver for [`order`].
///
/// `status` is taken verbatim so tests can feed invalid values.
pub fn order_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "customer_phone": "+36 30 123 4567",
        "customer_residence": "Block A",
        "customer_apartment": "12",
        "items": [
            { "id": "p-1", "name": "Bread", "quantity": 2, "price": 2.5 }
        ],
        "total": 5.0,
        "delivery_method": "delivery",
        "status": status,
        "created_at": "2024-05-01 10:00:00.000+00",
        "updated_at": "2024-05-01T10:00:00+00:00"
    })
}
