//! Shapes raw food objects (fixture entries or API payloads) into [`NewFood`].
//!
//! Nothing here fails: every problem is repaired with a default and reported
//! as a [`NormalizeWarning`] so callers decide whether to log or reject.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

use super::repo_types::{NewFood, Review};

lazy_static! {
    static ref LEADING_NUMBER: Regex =
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").unwrap();
}

pub const DEFAULT_PRICE: f64 = 9.99;
pub const DEFAULT_CATEGORY: &str = "Other";

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeWarning {
    NotAnObject { index: usize },
    MissingRequiredFields { index: usize, fields: Vec<&'static str> },
    InvalidPrice { index: usize, name: String, raw: String },
    InvalidNumber { index: usize, field: &'static str, raw: String },
    InvalidReview { index: usize, review: usize },
    InvalidReviewDate { index: usize, review: usize, raw: String },
}

impl NormalizeWarning {
    pub fn index(&self) -> usize {
        match self {
            Self::NotAnObject { index }
            | Self::MissingRequiredFields { index, .. }
            | Self::InvalidPrice { index, .. }
            | Self::InvalidNumber { index, .. }
            | Self::InvalidReview { index, .. }
            | Self::InvalidReviewDate { index, .. } => *index,
        }
    }

    /// Problems the HTTP API refuses to repair silently.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::NotAnObject { .. } | Self::MissingRequiredFields { .. } | Self::InvalidPrice { .. }
        )
    }
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject { index } => write!(f, "food item at index {index} is not an object"),
            Self::MissingRequiredFields { index, fields } => write!(
                f,
                "food item at index {index} missing required fields: {}",
                fields.join(", ")
            ),
            Self::InvalidPrice { name, raw, .. } => {
                write!(f, "invalid price for \"{name}\": {raw}, using {DEFAULT_PRICE}")
            }
            Self::InvalidNumber { index, field, raw } => {
                write!(f, "food item at index {index} has non-numeric {field}: {raw}")
            }
            Self::InvalidReview { index, review } => {
                write!(f, "food item at index {index}: review {review} is not an object, skipped")
            }
            Self::InvalidReviewDate { index, review, raw } => write!(
                f,
                "food item at index {index}: review {review} has invalid date {raw}, using import time"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub food: NewFood,
    pub warnings: Vec<NormalizeWarning>,
}

/// Normalize one raw food. `index` is its 0-based position in the source.
pub fn normalize_food(raw: &Value, index: usize, now: OffsetDateTime) -> Normalized {
    let empty = Map::new();
    let mut warnings = Vec::new();

    let obj = match raw.as_object() {
        Some(obj) => obj,
        None => {
            warnings.push(NormalizeWarning::NotAnObject { index });
            &empty
        }
    };

    let missing: Vec<&'static str> = ["name", "category", "price"]
        .into_iter()
        .filter(|field| !is_truthy(obj.get(*field)))
        .collect();
    if !missing.is_empty() {
        warnings.push(NormalizeWarning::MissingRequiredFields {
            index,
            fields: missing,
        });
    }

    let name = text(obj.get("name")).unwrap_or_else(|| format!("Food Item {}", index + 1));
    let category = text(obj.get("category")).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let price = match obj.get("price").and_then(coerce_number) {
        Some(price) if price > 0.0 => price,
        _ => {
            warnings.push(NormalizeWarning::InvalidPrice {
                index,
                name: name.clone(),
                raw: describe(obj.get("price")),
            });
            DEFAULT_PRICE
        }
    };

    let original_price = optional_number(obj, "originalPrice", index, &mut warnings)
        .filter(|p| *p > 0.0);
    let discount_percent = optional_number(obj, "discountPercent", index, &mut warnings);
    let rating = optional_number(obj, "rating", index, &mut warnings)
        .filter(|r| *r >= 0.0)
        .unwrap_or(0.0);

    let reviews = normalize_reviews(obj.get("reviews"), index, now, &mut warnings);
    let total_reviews = i32::try_from(reviews.len()).unwrap_or(i32::MAX);

    let food = NewFood {
        name,
        category,
        description: text(obj.get("description")),
        image: text(obj.get("image")),
        price,
        original_price,
        discount_percent,
        rating,
        total_reviews,
        available: flag(obj.get("available"), true),
        is_popular: flag(obj.get("isPopular"), false),
        is_special_offer: flag(obj.get("isSpecialOffer"), false),
        reviews,
        created_at: now,
        updated_at: now,
    };

    Normalized { food, warnings }
}

/// Normalize a whole fixture, preserving order.
pub fn normalize_all(raws: &[Value], now: OffsetDateTime) -> (Vec<NewFood>, Vec<NormalizeWarning>) {
    let mut foods = Vec::with_capacity(raws.len());
    let mut warnings = Vec::new();
    for (index, raw) in raws.iter().enumerate() {
        let normalized = normalize_food(raw, index, now);
        foods.push(normalized.food);
        warnings.extend(normalized.warnings);
    }
    (foods, warnings)
}

fn normalize_reviews(
    raw: Option<&Value>,
    index: usize,
    now: OffsetDateTime,
    warnings: &mut Vec<NormalizeWarning>,
) -> Vec<Review> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(review, item)| {
            let Some(obj) = item.as_object() else {
                warnings.push(NormalizeWarning::InvalidReview { index, review });
                return None;
            };

            let date = match obj.get("date").filter(|v| is_truthy(Some(*v))) {
                None => now,
                Some(v) => parse_date(v).unwrap_or_else(|| {
                    warnings.push(NormalizeWarning::InvalidReviewDate {
                        index,
                        review,
                        raw: v.to_string(),
                    });
                    now
                }),
            };

            Some(Review {
                user_id: None,
                user_name: text(obj.get("userName")).or_else(|| text(obj.get("name"))),
                rating: obj
                    .get("rating")
                    .and_then(coerce_number)
                    .filter(|r| *r >= 0.0)
                    .unwrap_or(0.0),
                comment: obj
                    .get("comment")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                date,
            })
        })
        .collect()
}

fn optional_number(
    obj: &Map<String, Value>,
    field: &'static str,
    index: usize,
    warnings: &mut Vec<NormalizeWarning>,
) -> Option<f64> {
    let value = obj.get(field).filter(|v| is_truthy(Some(*v)))?;
    let number = coerce_number(value);
    if number.is_none() {
        warnings.push(NormalizeWarning::InvalidNumber {
            index,
            field,
            raw: value.to_string(),
        });
    }
    number
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Strings yield their longest numeric prefix ("12.5abc" is 12.5), booleans
/// count as 1 and 0. Non-finite results are rejected.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn leading_number(s: &str) -> Option<f64> {
    LEADING_NUMBER.find(s.trim_start())?.as_str().parse::<f64>().ok()
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(value: Option<&Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(default, |n| n != 0.0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" | "" => false,
            _ => default,
        },
        _ => default,
    }
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "missing".to_string(), Value::to_string)
}

fn parse_date(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
                return Some(dt);
            }
            if let Ok(dt) = PrimitiveDateTime::parse(
                s,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            ) {
                return Some(dt.assume_utc());
            }
            Date::parse(s, format_description!("[year]-[month]-[day]"))
                .ok()
                .map(|d| d.midnight().assume_utc())
        }
        // Epoch milliseconds.
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()),
        _ => None,
    }
}
