use anyhow::{Context, Result};

use crate::lookup::{Lookup, Payload};

pub const BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1/";

pub const SEARCH: &str = "search.php";
pub const LOOKUP: &str = "lookup.php";
pub const RANDOM: &str = "random.php";
pub const CATEGORIES: &str = "categories.php";
pub const FILTER: &str = "filter.php";
pub const LIST: &str = "list.php";

/// Decode a response body into the envelope `lookup` is answered with.
pub fn decode(lookup: &Lookup, body: &str) -> Result<Payload> {
    let payload = match lookup {
        Lookup::Name(_) | Lookup::Id(_) | Lookup::Random => Payload::Meals(
            serde_json::from_str(body).context("Failed to parse meal response")?,
        ),
        Lookup::Category(_) | Lookup::Area(_) | Lookup::Ingredient(_) => Payload::Summaries(
            serde_json::from_str(body).context("Failed to parse filter response")?,
        ),
        Lookup::Categories => Payload::Categories(
            serde_json::from_str(body).context("Failed to parse category response")?,
        ),
        Lookup::Areas => Payload::Areas(
            serde_json::from_str(body).context("Failed to parse area list")?,
        ),
        Lookup::Ingredients => Payload::Ingredients(
            serde_json::from_str(body).context("Failed to parse ingredient list")?,
        ),
    };
    Ok(payload)
}
