//! The text a voter signs to authorize one rating.

use ratings_types::{Rating, ServiceId};

/// `"Rate service {id} with {rating} stars"`.
///
/// Binds the signature to this exact service and star value.
pub fn canonical_message(service_id: ServiceId, rating: Rating) -> String {
    format!("Rate service {service_id} with {rating} stars")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_format() {
        let msg = canonical_message(ServiceId::new(1), Rating::new(4).unwrap());
        assert_eq!(msg, "Rate service 1 with 4 stars");
    }
}
