use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Largest quantity a single cart line can hold.
pub const MAX_QUANTITY: i32 = 99;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub food_id: Uuid,
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCart {
    pub food_id: Uuid,
    pub quantity: i32,
}

/// A cart row joined with its food.
#[derive(Debug, Clone, FromRow)]
pub struct CartLine {
    pub food_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub price: f64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub food_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub price: f64,
    pub quantity: i32,
    pub line_total: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub total_items: i64,
    pub total_price: f64,
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl CartResponse {
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let items: Vec<CartItem> = lines
            .into_iter()
            .map(|l| CartItem {
                line_total: round_cents(l.price * f64::from(l.quantity)),
                food_id: l.food_id,
                name: l.name,
                image: l.image,
                price: l.price,
                quantity: l.quantity,
            })
            .collect();
        let total_items = items.iter().map(|i| i64::from(i.quantity)).sum();
        let total_price = round_cents(items.iter().map(|i| i.line_total).sum());
        Self {
            items,
            total_items,
            total_price,
        }
    }
}

/// `Err` carries the client-facing message.
pub fn validate_quantity(quantity: i32, allow_zero: bool) -> Result<(), String> {
    let min = if allow_zero { 0 } else { 1 };
    if quantity < min || quantity > MAX_QUANTITY {
        return Err(format!("quantity must be between {min} and {MAX_QUANTITY}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, price: f64, quantity: i32) -> CartLine {
        CartLine {
            food_id: Uuid::new_v4(),
            name: name.into(),
            image: None,
            price,
            quantity,
        }
    }

    #[test]
    fn totals_are_rounded_to_cents() {
        let cart = CartResponse::from_lines(vec![line("Cola", 0.1, 3), line("Pizza", 12.99, 2)]);
        assert_eq!(cart.items[0].line_total, 0.3);
        assert_eq!(cart.items[1].line_total, 25.98);
        assert_eq!(cart.total_items, 5);
        assert_eq!(cart.total_price, 26.28);
    }

    #[test]
    fn empty_cart() {
        let cart = CartResponse::from_lines(Vec::new());
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_items, 0);
        assert_eq!(cart.total_price, 0.0);
    }

    #[test]
    fn quantity_bounds() {
        assert!(validate_quantity(1, false).is_ok());
        assert!(validate_quantity(99, false).is_ok());
        assert!(validate_quantity(0, false).is_err());
        assert!(validate_quantity(0, true).is_ok());
        assert!(validate_quantity(100, true).is_err());
        assert!(validate_quantity(-1, true).is_err());
    }

    #[test]
    fn add_defaults_to_one() {
        let id = Uuid::new_v4();
        let body: AddToCart = serde_json::from_str(&format!(r#"{{"foodId":"{id}"}}"#)).unwrap();
        assert_eq!(body.food_id, id);
        assert_eq!(body.quantity, 1);
    }
}
