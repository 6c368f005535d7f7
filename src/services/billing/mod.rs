pub mod stripe;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Upper bound on prices fetched per listing. No pagination beyond it.
pub const PRICE_LIST_LIMIT: u32 = 100;

#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn list_active_prices(&self, limit: u32) -> anyhow::Result<Vec<Price>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub id: String,
    pub unit_amount: Option<i64>,
    pub currency: String,
    pub recurring: Option<Recurring>,
    pub product: Option<ProductRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recurring {
    pub interval: String,
}

/// The product is an id unless the request expanded it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(String),
    Expanded { id: String, name: Option<String> },
}

impl ProductRef {
    pub fn id(&self) -> &str {
        match self {
            ProductRef::Id(id) => id,
            ProductRef::Expanded { id, .. } => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ProductRef::Id(_) => None,
            ProductRef::Expanded { name, .. } => name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceView {
    pub id: String,
    pub unit_amount: Option<i64>,
    pub currency: String,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
}

impl From<&Price> for PriceView {
    fn from(price: &Price) -> Self {
        Self {
            id: price.id.clone(),
            unit_amount: price.unit_amount,
            currency: price.currency.clone(),
            product_id: price.product.as_ref().map(|p| p.id().to_string()),
            product_name: price
                .product
                .as_ref()
                .and_then(|p| p.name())
                .map(|n| n.to_string()),
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct PriceListing {
    pub monthly: Vec<PriceView>,
    pub yearly: Vec<PriceView>,
}

/// Splits prices by recurring interval. One-off prices and other intervals
/// (day, week) land in neither list.
pub fn partition_prices(prices: &[Price]) -> PriceListing {
    let mut listing = PriceListing::default();
    for price in prices {
        match price.recurring.as_ref().map(|r| r.interval.as_str()) {
            Some("month") => listing.monthly.push(PriceView::from(price)),
            Some("year") => listing.yearly.push(PriceView::from(price)),
            _ => {}
        }
    }
    listing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices() -> Vec<Price> {
        serde_json::from_str(
            r#"[
                {"id":"price_m","unit_amount":1900,"currency":"usd","recurring":{"interval":"month"},
                 "product":{"id":"prod_basic","name":"Basic"}},
                {"id":"price_y","unit_amount":19000,"currency":"usd","recurring":{"interval":"year"},
                 "product":"prod_basic"},
                {"id":"price_w","unit_amount":500,"currency":"usd","recurring":{"interval":"week"},
                 "product":"prod_basic"},
                {"id":"price_once","unit_amount":9900,"currency":"usd","recurring":null,
                 "product":"prod_setup"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_partition_by_interval() {
        let listing = partition_prices(&prices());
        assert_eq!(listing.monthly.len(), 1);
        assert_eq!(listing.yearly.len(), 1);
        assert_eq!(listing.monthly[0].id, "price_m");
        assert_eq!(listing.yearly[0].id, "price_y");
    }

    #[test]
    fn test_reduced_view_keeps_product_fields() {
        let listing = partition_prices(&prices());
        let monthly = &listing.monthly[0];
        assert_eq!(monthly.unit_amount, Some(1900));
        assert_eq!(monthly.product_id.as_deref(), Some("prod_basic"));
        assert_eq!(monthly.product_name.as_deref(), Some("Basic"));

        let yearly = &listing.yearly[0];
        assert_eq!(yearly.product_id.as_deref(), Some("prod_basic"));
        assert_eq!(yearly.product_name, None);
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let listing = partition_prices(&prices());
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["monthly"][0]["unitAmount"], 1900);
        assert_eq!(json["monthly"][0]["productName"], "Basic");
    }
}
