use crate::foods::repo_types::Review;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
pub const MAX_COMMENT_LEN: usize = 1000;

/// Mean rating rounded to one decimal; `0.0` with no reviews.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: f64 = reviews.iter().map(|r| r.rating).sum();
    (sum / reviews.len() as f64 * 10.0).round() / 10.0
}

/// Returns the trimmed comment, or the client-facing reason it was refused.
pub fn validate_review(rating: i32, comment: Option<&str>) -> Result<String, String> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(format!("rating must be between {MIN_RATING} and {MAX_RATING}"));
    }
    let comment = comment.map(str::trim).unwrap_or_default();
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(format!("comment must be at most {MAX_COMMENT_LEN} characters"));
    }
    Ok(comment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn review(rating: f64) -> Review {
        Review {
            user_id: None,
            user_name: None,
            rating,
            comment: String::new(),
            date: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[review(5.0)]), 5.0);
        assert_eq!(average_rating(&[review(5.0), review(4.0), review(4.0)]), 4.3);
        assert_eq!(average_rating(&[review(1.0), review(2.0)]), 1.5);
    }

    #[test]
    fn rating_out_of_range_is_refused() {
        assert!(validate_review(0, None).is_err());
        assert!(validate_review(6, Some("great")).is_err());
        assert_eq!(validate_review(3, None).unwrap(), "");
    }

    #[test]
    fn comment_is_trimmed_and_bounded() {
        assert_eq!(validate_review(5, Some("  tasty \n")).unwrap(), "tasty");
        let long = "x".repeat(MAX_COMMENT_LEN + 1);
        assert!(validate_review(5, Some(&long)).is_err());
        let exact = "é".repeat(MAX_COMMENT_LEN);
        assert!(validate_review(5, Some(&exact)).is_ok());
    }
}
