//! Product event envelope delivered by the catalog service.
//!
//! Every field is optional on the wire and decoded on its own: a field
//! with an unexpected type reads as absent without discarding the others.
//! The signature covers the raw bytes, not this view.

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Header carrying the base64 HMAC-SHA256 signature of the raw body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Header carrying the event type.
pub const EVENT_TYPE_HEADER: &str = "x-event-type";

/// Header carrying the event identifier.
pub const EVENT_ID_HEADER: &str = "x-event-id";

/// Event types the catalog service is known to emit.
pub const KNOWN_EVENT_TYPES: [&str; 5] = [
    "product.created",
    "product.updated",
    "product.deleted",
    "product.stock.low",
    "product.stock.out",
];

/// Whether `event_type` is one of [`KNOWN_EVENT_TYPES`].
pub fn is_known_event_type(event_type: &str) -> bool {
    KNOWN_EVENT_TYPES.contains(&event_type)
}

/// Decode a field, mapping a value of the wrong type to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Inbound event envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEvent {
    /// Type of event, e.g. `product.created`
    #[serde(default, deserialize_with = "lenient")]
    pub event_type: Option<String>,
    /// Producer-assigned event identifier
    #[serde(default, deserialize_with = "lenient")]
    pub event_id: Option<String>,
    /// When the event occurred, as sent by the producer
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
    /// The product that triggered the event
    #[serde(default, deserialize_with = "lenient")]
    pub product: Option<Product>,
    /// Free-form metadata attached by the producer
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<String>,
}

/// Product record nested in an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub stock_quantity: Option<i64>,
}

/// Renders a missing field as `-`.
struct Field<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Field<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => f.write_str("-"),
        }
    }
}

/// Human-readable, multi-line rendering for operator logs.
impl fmt::Display for ProductEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Event Type: {}", Field(&self.event_type))?;
        writeln!(f, "Event ID: {}", Field(&self.event_id))?;
        write!(f, "Timestamp: {}", Field(&self.timestamp))?;

        if let Some(product) = &self.product {
            writeln!(f)?;
            write!(f, "{}", product)?;
        }

        Ok(())
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Product:")?;
        writeln!(f, "  ID: {}", Field(&self.id))?;
        writeln!(f, "  Name: {}", Field(&self.name))?;
        match self.price {
            Some(price) => writeln!(f, "  Price: ${}", price)?,
            None => writeln!(f, "  Price: -")?,
        }
        writeln!(f, "  SKU: {}", Field(&self.sku))?;
        writeln!(f, "  Category: {}", Field(&self.category))?;
        write!(f, "  Stock: {}", Field(&self.stock_quantity))
    }
}
