//! Rental pricing rules.
//!
//! Pure functions over data read through the contract gateway. A linear
//! day-rate model: no proration, no partial days. Discount eligibility is
//! evaluated at the moment of submission, never cached from an earlier read.

use crate::error::Error;
use crate::types::{Amount, Movie, UserProfile};
use serde::{Deserialize, Serialize};

/// Owner share of rental revenue, percent. Informational only; the contract
/// enforces the real split.
pub const OWNER_SHARE_PERCENT: u128 = 90;
/// Flat discount applied for an active spotlight discount, percent off.
pub const DISCOUNT_PERCENT: u128 = 20;

/// Selectable rental duration bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationBucket {
    #[serde(rename = "48h")]
    H48,
    #[serde(rename = "72h")]
    H72,
    #[serde(rename = "1w")]
    OneWeek,
}

impl DurationBucket {
    /// Whole days charged for this bucket.
    pub fn days(self) -> u64 {
        match self {
            DurationBucket::H48 => 2,
            DurationBucket::H72 => 3,
            DurationBucket::OneWeek => 7,
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "48h" => Ok(DurationBucket::H48),
            "72h" => Ok(DurationBucket::H72),
            "1w" => Ok(DurationBucket::OneWeek),
            other => Err(Error::Validation(format!(
                "unknown duration bucket: {other}"
            ))),
        }
    }
}

/// Base rental cost: `pricePerDay * days`.
pub fn rental_cost(price_per_day: Amount, bucket: DurationBucket) -> Amount {
    Amount(price_per_day.0 * bucket.days() as u128)
}

/// Whether the profile's spotlight discount is active at `now`.
pub fn discount_active(profile: &UserProfile, now: u64) -> bool {
    profile.has_discount && now < profile.discount_expiry_timestamp
}

/// Apply the flat discount if active: `floor(cost * 80 / 100)`.
///
/// `profile` is `None` while the read is still in flight; absence means no
/// discount, same as presence without one.
pub fn final_cost(cost: Amount, profile: Option<&UserProfile>, now: u64) -> Amount {
    match profile {
        Some(p) if discount_active(p, now) => Amount(cost.0 * (100 - DISCOUNT_PERCENT) / 100),
        _ => cost,
    }
}

/// Case-insensitive address equality. The external representation is not
/// guaranteed to be canonicalized.
pub fn addr_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Hard guard: the movie owner may not rent their own movie.
pub fn check_self_rental(renter: &str, movie: &Movie) -> Result<(), Error> {
    if addr_eq(renter, &movie.owner) {
        return Err(Error::Validation("cannot rent your own movie".into()));
    }
    Ok(())
}

/// Per-day price derived from the user-entered 48-hour price.
pub fn price_per_day_from_48h(price_48h: Amount) -> Amount {
    Amount(price_48h.0 / 2)
}

/// Informational 72-hour projection: `1.5 * price48h` (3 days at the derived
/// per-day rate). Never submitted to the contract.
pub fn projected_72h(price_48h: Amount) -> Amount {
    Amount(price_48h.0 * 3 / 2)
}

/// Informational 1-week projection: `3.5 * price48h`.
pub fn projected_1w(price_48h: Amount) -> Amount {
    Amount(price_48h.0 * 7 / 2)
}

/// Informational 90/10 revenue split of a rental payment.
pub fn revenue_split(amount: Amount) -> (Amount, Amount) {
    let owner = Amount(amount.0 * OWNER_SHARE_PERCENT / 100);
    (owner, Amount(amount.0 - owner.0))
}

/// Approximate lifetime earnings for an owner's movie, 48h-price basis:
/// `rentalCount * pricePerDay * 2 * 90%`.
pub fn approx_earnings(movie: &Movie) -> Amount {
    Amount(movie.rental_count as u128 * movie.price_per_day.0 * 2 * OWNER_SHARE_PERCENT / 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_owned_by(owner: &str) -> Movie {
        Movie {
            id: 1,
            owner: owner.into(),
            title: "t".into(),
            genre: String::new(),
            description: String::new(),
            film_cid: String::new(),
            trailer_cid: String::new(),
            thumbnail_cid: String::new(),
            price_per_day: Amount(1000),
            rental_count: 0,
            listed: true,
        }
    }

    fn profile(has_discount: bool, expiry: u64) -> UserProfile {
        UserProfile {
            username: "alice".into(),
            exists: true,
            has_discount,
            discount_expiry_timestamp: expiry,
        }
    }

    #[test]
    fn test_cost_table() {
        assert_eq!(rental_cost(Amount(1000), DurationBucket::H48), Amount(2000));
        assert_eq!(rental_cost(Amount(1000), DurationBucket::H72), Amount(3000));
        assert_eq!(
            rental_cost(Amount(1000), DurationBucket::OneWeek),
            Amount(7000)
        );
        assert_eq!(rental_cost(Amount(0), DurationBucket::OneWeek), Amount(0));
    }

    #[test]
    fn test_one_week_discount_scenario() {
        // pricePerDay = 1000, 1w -> 7000; with active discount -> 5600.
        let cost = rental_cost(Amount(1000), DurationBucket::OneWeek);
        assert_eq!(cost, Amount(7000));
        let p = profile(true, 2000);
        assert_eq!(final_cost(cost, Some(&p), 1000), Amount(5600));
    }

    #[test]
    fn test_discount_floor() {
        let p = profile(true, u64::MAX);
        // 999 * 80 / 100 = 799.2 -> floor 799
        assert_eq!(final_cost(Amount(999), Some(&p), 0), Amount(799));
    }

    #[test]
    fn test_discount_expired_at_boundary() {
        let p = profile(true, 1000);
        assert_eq!(final_cost(Amount(100), Some(&p), 999), Amount(80));
        assert_eq!(final_cost(Amount(100), Some(&p), 1000), Amount(100));
    }

    #[test]
    fn test_no_discount_flag_means_full_price() {
        let p = profile(false, u64::MAX);
        assert_eq!(final_cost(Amount(100), Some(&p), 0), Amount(100));
        assert_eq!(final_cost(Amount(100), None, 0), Amount(100));
    }

    #[test]
    fn test_addr_eq_case_insensitive() {
        assert!(addr_eq("0xABCdef", "0xabcDEF"));
        assert!(!addr_eq("0xABC", "0xABD"));
    }

    #[test]
    fn test_self_rental_guard() {
        let movie = movie_owned_by("0xAbCd");
        assert!(check_self_rental("0xabcd", &movie).is_err());
        assert!(check_self_rental("0x1234", &movie).is_ok());
    }

    #[test]
    fn test_upload_price_derivation() {
        let p48 = Amount(1000);
        assert_eq!(price_per_day_from_48h(p48), Amount(500));
        assert_eq!(projected_72h(p48), Amount(1500));
        assert_eq!(projected_1w(p48), Amount(3500));
    }

    #[test]
    fn test_revenue_split_sums_to_total() {
        let (owner, platform) = revenue_split(Amount(1001));
        assert_eq!(owner, Amount(900));
        assert_eq!(platform, Amount(101));
        assert_eq!(owner.0 + platform.0, 1001);
    }

    #[test]
    fn test_duration_parse() {
        assert_eq!(DurationBucket::parse("1w").unwrap().days(), 7);
        assert!(DurationBucket::parse("24h").is_err());
    }
}
