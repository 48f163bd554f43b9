//! Order Model

use crate::error::ResponseStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Position along the fulfilment path. `None` for cancelled.
    pub const fn progress_rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Processing => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a status string outside the enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One cart line as submitted by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Book id
    pub id: i64,
    pub quantity: i64,
    /// Unit price the client saw
    pub price: Decimal,
}

/// Checkout payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub cart: Vec<CartLine>,
    pub notes: Option<String>,
    /// Locale used to snapshot item titles (defaults to "en")
    pub locale: Option<String>,
}

/// Summary returned by checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: i64,
    pub order_number: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
}

/// `201 Created` body of `POST /api/orders`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub order: PlacedOrder,
}

/// Order header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<i64>,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Purchased line; title, SKU and prices are snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub book_sku: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Status history entry (append-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderStatusEntry {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatus,
    pub comment: Option<String>,
    /// Acting user, when known
    pub changed_by: Option<i64>,
    pub created_at: i64,
}

/// Order with its items and history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub status_history: Vec<OrderStatusEntry>,
}

/// `PUT /api/orders/{id}/status` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
    pub comment: Option<String>,
}

/// `PUT /api/orders/{id}/payment` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUpdateRequest {
    pub payment_status: String,
    pub payment_method: Option<String>,
}

/// Order list query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
            assert_eq!(status.to_string(), status.as_str());
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert!("Pending".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");
    }

    #[test]
    fn test_progress_rank_orders_fulfilment() {
        let ranks: Vec<_> = OrderStatus::ALL[..5]
            .iter()
            .map(|s| s.progress_rank().unwrap())
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(OrderStatus::Cancelled.progress_rank(), None);
    }

    #[test]
    fn test_cart_line_accepts_float_price() {
        let line: CartLine =
            serde_json::from_str(r#"{"id":1,"quantity":2,"price":100.00}"#).unwrap();
        assert_eq!(line.price, Decimal::new(10000, 2));
    }

    #[test]
    fn test_money_serializes_as_number() {
        let placed = PlacedOrder {
            id: 1,
            order_number: "ORD-000001".into(),
            total_amount: Decimal::new(21000, 2),
            status: OrderStatus::Pending,
        };
        let json = serde_json::to_value(&placed).unwrap();
        assert!(json["total_amount"].is_number());
        assert_eq!(json["total_amount"], serde_json::json!(210.0));

        let line = serde_json::to_value(CartLine {
            id: 1,
            quantity: 1,
            price: Decimal::new(4550, 2),
        })
        .unwrap();
        assert_eq!(line["price"], serde_json::json!(45.5));
    }

    #[test]
    fn test_payment_status_parse() {
        assert_eq!("completed".parse::<PaymentStatus>(), Ok(PaymentStatus::Completed));
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }
}
