//! Contract record types.
//!
//! The bridge returns the same structures sometimes as named-field JSON
//! objects and sometimes as positional arrays, depending on the accessor.
//! Everything is normalized to named-field records here; positional access
//! never propagates past this boundary.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A 128-bit amount in the chain's atomic currency unit.
///
/// Serialized as a decimal string; accepted from either a JSON string or a
/// plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(pub u128);

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a u128 as a decimal string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse::<u128>().map(Amount).map_err(de::Error::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount(v as u128))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
                Ok(Amount(v))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// A listed movie. `id == 0` is the contract's not-found sentinel.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Movie {
    pub id: u64,
    pub owner: String,
    pub title: String,
    pub genre: String,
    pub description: String,
    pub film_cid: String,
    pub trailer_cid: String,
    pub thumbnail_cid: String,
    pub price_per_day: Amount,
    pub rental_count: u64,
    pub listed: bool,
}

impl Movie {
    /// Whether the record refers to an existing movie.
    pub fn is_found(&self) -> bool {
        self.id != 0
    }
}

impl<'de> Deserialize<'de> for Movie {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Named {
                id: u64,
                owner: String,
                title: String,
                #[serde(default)]
                genre: String,
                #[serde(default)]
                description: String,
                #[serde(rename = "filmCID", default)]
                film_cid: String,
                #[serde(rename = "trailerCID", default)]
                trailer_cid: String,
                #[serde(rename = "thumbnailCID", default)]
                thumbnail_cid: String,
                #[serde(rename = "pricePerDay")]
                price_per_day: Amount,
                #[serde(rename = "rentalCount", default)]
                rental_count: u64,
                #[serde(default)]
                listed: bool,
            },
            Positional(
                u64,
                String,
                String,
                String,
                String,
                String,
                String,
                String,
                Amount,
                u64,
                bool,
            ),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Named {
                id,
                owner,
                title,
                genre,
                description,
                film_cid,
                trailer_cid,
                thumbnail_cid,
                price_per_day,
                rental_count,
                listed,
            } => Movie {
                id,
                owner,
                title,
                genre,
                description,
                film_cid,
                trailer_cid,
                thumbnail_cid,
                price_per_day,
                rental_count,
                listed,
            },
            Repr::Positional(
                id,
                owner,
                title,
                genre,
                description,
                film_cid,
                trailer_cid,
                thumbnail_cid,
                price_per_day,
                rental_count,
                listed,
            ) => Movie {
                id,
                owner,
                title,
                genre,
                description,
                film_cid,
                trailer_cid,
                thumbnail_cid,
                price_per_day,
                rental_count,
                listed,
            },
        })
    }
}

/// One page of the movie listing.
#[derive(Debug, Clone, Serialize)]
pub struct MoviePage {
    pub movies: Vec<Movie>,
    pub total: u64,
}

impl<'de> Deserialize<'de> for MoviePage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Named { movies: Vec<Movie>, total: u64 },
            Positional(Vec<Movie>, u64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Named { movies, total } => MoviePage { movies, total },
            Repr::Positional(movies, total) => MoviePage { movies, total },
        })
    }
}

/// A rental held by a user. Active iff `now < expiry_timestamp`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Rental {
    pub rental_id: u64,
    pub movie_id: u64,
    pub renter: String,
    pub rented_at: u64,
    pub expiry_timestamp: u64,
}

impl Rental {
    pub fn is_active(&self, now: u64) -> bool {
        now < self.expiry_timestamp
    }
}

impl<'de> Deserialize<'de> for Rental {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Named {
                #[serde(rename = "rentalId")]
                rental_id: u64,
                #[serde(rename = "movieId")]
                movie_id: u64,
                renter: String,
                #[serde(rename = "rentedAt")]
                rented_at: u64,
                #[serde(rename = "expiryTimestamp")]
                expiry_timestamp: u64,
            },
            Positional(u64, u64, String, u64, u64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Named {
                rental_id,
                movie_id,
                renter,
                rented_at,
                expiry_timestamp,
            } => Rental {
                rental_id,
                movie_id,
                renter,
                rented_at,
                expiry_timestamp,
            },
            Repr::Positional(rental_id, movie_id, renter, rented_at, expiry_timestamp) => Rental {
                rental_id,
                movie_id,
                renter,
                rented_at,
                expiry_timestamp,
            },
        })
    }
}

/// A user profile. A profile is a prerequisite for upload and mint actions.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct UserProfile {
    pub username: String,
    pub exists: bool,
    pub has_discount: bool,
    pub discount_expiry_timestamp: u64,
}

impl<'de> Deserialize<'de> for UserProfile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Named {
                #[serde(default)]
                username: String,
                exists: bool,
                #[serde(rename = "hasDiscount", default)]
                has_discount: bool,
                #[serde(rename = "discountExpiryTimestamp", default)]
                discount_expiry_timestamp: u64,
            },
            Positional(String, bool, bool, u64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Named {
                username,
                exists,
                has_discount,
                discount_expiry_timestamp,
            } => UserProfile {
                username,
                exists,
                has_discount,
                discount_expiry_timestamp,
            },
            Repr::Positional(username, exists, has_discount, discount_expiry_timestamp) => {
                UserProfile {
                    username,
                    exists,
                    has_discount,
                    discount_expiry_timestamp,
                }
            }
        })
    }
}

/// A minted meme. `id == 0` from the spotlight pointer means none selected.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Meme {
    pub id: u64,
    pub creator: String,
    pub title: String,
    pub image_cid: String,
    pub created_at: u64,
    pub is_spotlighted: bool,
}

impl<'de> Deserialize<'de> for Meme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Named {
                id: u64,
                creator: String,
                title: String,
                #[serde(rename = "imageCID", default)]
                image_cid: String,
                #[serde(rename = "createdAt", default)]
                created_at: u64,
                #[serde(rename = "isSpotlighted", default)]
                is_spotlighted: bool,
            },
            Positional(u64, String, String, String, u64, bool),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Named {
                id,
                creator,
                title,
                image_cid,
                created_at,
                is_spotlighted,
            } => Meme {
                id,
                creator,
                title,
                image_cid,
                created_at,
                is_spotlighted,
            },
            Repr::Positional(id, creator, title, image_cid, created_at, is_spotlighted) => Meme {
                id,
                creator,
                title,
                image_cid,
                created_at,
                is_spotlighted,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_named_decode() {
        let json = serde_json::json!({
            "id": 7,
            "owner": "0xAbC",
            "title": "Solaris",
            "genre": "Sci-Fi",
            "description": "",
            "filmCID": "bafyfilm",
            "trailerCID": "bafytrailer",
            "thumbnailCID": "bafythumb",
            "pricePerDay": "1000000000000000000",
            "rentalCount": 3,
            "listed": true
        });
        let movie: Movie = serde_json::from_value(json).unwrap();
        assert_eq!(movie.id, 7);
        assert_eq!(movie.price_per_day, Amount(1_000_000_000_000_000_000));
        assert_eq!(movie.film_cid, "bafyfilm");
        assert!(movie.is_found());
    }

    #[test]
    fn test_movie_positional_decode() {
        let json = serde_json::json!([
            7, "0xAbC", "Solaris", "Sci-Fi", "", "bafyfilm", "bafytrailer", "bafythumb",
            "1000", 3, true
        ]);
        let movie: Movie = serde_json::from_value(json).unwrap();
        assert_eq!(movie.title, "Solaris");
        assert_eq!(movie.price_per_day, Amount(1000));
        assert_eq!(movie.rental_count, 3);
    }

    #[test]
    fn test_movie_sentinel_not_found() {
        let json = serde_json::json!([0, "0x0", "", "", "", "", "", "", "0", 0, false]);
        let movie: Movie = serde_json::from_value(json).unwrap();
        assert!(!movie.is_found());
    }

    #[test]
    fn test_profile_positional_matches_named() {
        let positional: UserProfile =
            serde_json::from_value(serde_json::json!(["alice", true, true, 1_700_000_000u64]))
                .unwrap();
        let named: UserProfile = serde_json::from_value(serde_json::json!({
            "username": "alice",
            "exists": true,
            "hasDiscount": true,
            "discountExpiryTimestamp": 1_700_000_000u64
        }))
        .unwrap();
        assert_eq!(positional, named);
    }

    #[test]
    fn test_rental_activity_boundary() {
        let rental: Rental =
            serde_json::from_value(serde_json::json!([1, 7, "0xabc", 100, 200])).unwrap();
        assert!(rental.is_active(199));
        assert!(!rental.is_active(200));
        assert!(!rental.is_active(201));
    }

    #[test]
    fn test_amount_accepts_number_and_string() {
        let from_num: Amount = serde_json::from_value(serde_json::json!(42)).unwrap();
        let from_str: Amount = serde_json::from_value(serde_json::json!("42")).unwrap();
        assert_eq!(from_num, from_str);
        assert_eq!(serde_json::to_value(Amount(42)).unwrap(), serde_json::json!("42"));
    }

    #[test]
    fn test_movie_page_positional() {
        let json = serde_json::json!([
            [[1, "0xA", "T", "", "", "f", "t", "th", "10", 0, true]],
            1
        ]);
        let page: MoviePage = serde_json::from_value(json).unwrap();
        assert_eq!(page.movies.len(), 1);
        assert_eq!(page.total, 1);
    }
}
