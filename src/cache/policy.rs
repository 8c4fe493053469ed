//! Key/TTL Policy Module
//!
//! Maps logical data categories to key prefixes and default time-to-live values.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Separator between a key prefix and its identifier parts.
pub const KEY_SEPARATOR: &str = ":";

// == Cache Category ==
/// Semantic category of cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheCategory {
    User,
    Product,
    Order,
    Session,
    Api,
    Page,
    Query,
    Static,
}

impl CacheCategory {
    /// Every category, in declaration order.
    pub const ALL: [CacheCategory; 8] = [
        CacheCategory::User,
        CacheCategory::Product,
        CacheCategory::Order,
        CacheCategory::Session,
        CacheCategory::Api,
        CacheCategory::Page,
        CacheCategory::Query,
        CacheCategory::Static,
    ];

    /// Key namespace prefix for this category.
    pub fn prefix(self) -> &'static str {
        match self {
            CacheCategory::User => "user",
            CacheCategory::Product => "product",
            CacheCategory::Order => "order",
            CacheCategory::Session => "session",
            CacheCategory::Api => "api",
            CacheCategory::Page => "page",
            CacheCategory::Query => "query",
            CacheCategory::Static => "static",
        }
    }

    /// Default TTL in seconds for this category.
    pub fn ttl(self) -> u64 {
        match self {
            CacheCategory::User => 3_600,
            CacheCategory::Product => 7_200,
            CacheCategory::Order => 1_800,
            CacheCategory::Session => 86_400,
            CacheCategory::Api => 300,
            CacheCategory::Page => 3_600,
            CacheCategory::Query => 600,
            CacheCategory::Static => 604_800,
        }
    }

    /// Builds a key in this category's namespace. See [`build_key`].
    pub fn key<I>(self, parts: I) -> String
    where
        I: IntoIterator,
        I::Item: Display,
    {
        build_key(self, parts)
    }
}

impl Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for CacheCategory {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheCategory::ALL
            .into_iter()
            .find(|category| category.prefix() == s)
            .ok_or_else(|| CacheError::InvalidRequest(format!("Unknown cache category: {}", s)))
    }
}

// == Key Builder ==
/// Joins the category prefix with `parts`, in call order, using `:`.
///
/// Parts are not escaped or checked for collisions; callers must pass
/// disambiguating parts such as entity ids.
pub fn build_key<I>(category: CacheCategory, parts: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    let mut key = category.prefix().to_string();
    for part in parts {
        key.push_str(KEY_SEPARATOR);
        key.push_str(&part.to_string());
    }
    key
}

/// Default TTL in seconds for `category`.
pub fn ttl_for(category: CacheCategory) -> u64 {
    category.ttl()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_key_joins_parts_in_order() {
        assert_eq!(build_key(CacheCategory::Product, [42]), "product:42");
        assert_eq!(
            build_key(CacheCategory::Order, ["tenant-7", "2024"]),
            "order:tenant-7:2024"
        );
    }

    #[test]
    fn test_build_key_without_parts() {
        let parts: [&str; 0] = [];
        assert_eq!(build_key(CacheCategory::Static, parts), "static");
    }

    #[test]
    fn test_category_key_helper() {
        assert_eq!(CacheCategory::Session.key(["abc"]), "session:abc");
    }

    #[test]
    fn test_ttl_table() {
        assert_eq!(ttl_for(CacheCategory::User), 3600);
        assert_eq!(ttl_for(CacheCategory::Product), 7200);
        assert_eq!(ttl_for(CacheCategory::Order), 1800);
        assert_eq!(ttl_for(CacheCategory::Session), 86400);
        assert_eq!(ttl_for(CacheCategory::Api), 300);
        assert_eq!(ttl_for(CacheCategory::Page), 3600);
        assert_eq!(ttl_for(CacheCategory::Query), 600);
        assert_eq!(ttl_for(CacheCategory::Static), 604800);
    }

    #[test]
    fn test_from_str_round_trips_every_prefix() {
        for category in CacheCategory::ALL {
            assert_eq!(category.prefix().parse::<CacheCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown_category() {
        let result = "invoice".parse::<CacheCategory>();
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
