use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// TheMealDB exposes exactly this many `strIngredientN` / `strMeasureN` pairs per meal.
pub const INGREDIENT_SLOTS: usize = 20;

const INGREDIENT_IMAGE_BASE: &str = "https://www.themealdb.com/images/ingredients";

/// Thumbnail URL TheMealDB serves for an ingredient name.
#[must_use]
pub fn ingredient_thumbnail(name: &str) -> String {
    format!("{INGREDIENT_IMAGE_BASE}/{name}.png")
}

// --- Lenient field decoding ---
//
// Upstream ids arrive as strings ("52772"); our own store and some callers
// produce numbers. Everything else may be missing or null.

fn lenient_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(lenient_string)
        .unwrap_or_default())
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(lenient_string))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Meals ---

/// One ingredient slot of a meal. An empty ingredient name marks an unused slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngredientLine {
    pub ingredient: String,
    pub measure: String,
}

impl IngredientLine {
    pub fn new(ingredient: impl Into<String>, measure: impl Into<String>) -> Self {
        Self {
            ingredient: ingredient.into(),
            measure: measure.into(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ingredient.trim().is_empty()
    }
}

/// A fully detailed meal in TheMealDB's JSON shape.
///
/// The twenty `strIngredientN` / `strMeasureN` fields are held as a fixed,
/// ordered slot array. Upstream fields the store does not track (`strTags`,
/// `dateModified`, ...) are kept in `extra` so live responses round-trip intact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meal {
    pub id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub area: Option<String>,
    pub instructions: Option<String>,
    pub thumbnail: Option<String>,
    pub youtube: Option<String>,
    pub source: Option<String>,
    pub ingredients: [IngredientLine; INGREDIENT_SLOTS],
    pub extra: Map<String, Value>,
}

impl Meal {
    /// The numeric store key, if `idMeal` holds one.
    #[must_use]
    pub fn numeric_id(&self) -> Option<i64> {
        self.id.trim().parse().ok()
    }

    /// Non-empty slots with their 0-based position.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &IngredientLine)> {
        self.ingredients
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
    }

    /// Pack `lines` into the slots in order, clearing whatever is left over.
    /// Lines past the twentieth are dropped.
    pub fn set_lines(&mut self, lines: impl IntoIterator<Item = IngredientLine>) {
        self.ingredients = Default::default();
        for (slot, line) in self.ingredients.iter_mut().zip(lines) {
            *slot = line;
        }
    }

    #[must_use]
    pub fn summary(&self) -> MealSummary {
        MealSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            thumbnail: self.thumbnail.clone(),
        }
    }
}

impl Serialize for Meal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(8 + INGREDIENT_SLOTS * 2 + self.extra.len()))?;
        map.serialize_entry("idMeal", &self.id)?;
        map.serialize_entry("strMeal", &self.name)?;
        map.serialize_entry("strCategory", &self.category)?;
        map.serialize_entry("strArea", &self.area)?;
        map.serialize_entry("strInstructions", &self.instructions)?;
        map.serialize_entry("strMealThumb", &self.thumbnail)?;
        map.serialize_entry("strYoutube", &self.youtube)?;
        map.serialize_entry("strSource", &self.source)?;
        for (i, line) in self.ingredients.iter().enumerate() {
            map.serialize_entry(&format!("strIngredient{}", i + 1), &line.ingredient)?;
        }
        for (i, line) in self.ingredients.iter().enumerate() {
            map.serialize_entry(&format!("strMeasure{}", i + 1), &line.measure)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Meal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let mut take = |key: &str| fields.remove(key).and_then(lenient_string);

        let id = take("idMeal").unwrap_or_default();
        let name = take("strMeal");
        let category = take("strCategory");
        let area = take("strArea");
        let instructions = take("strInstructions");
        let thumbnail = take("strMealThumb");
        let youtube = take("strYoutube");
        let source = take("strSource");

        let mut ingredients: [IngredientLine; INGREDIENT_SLOTS] = Default::default();
        for (i, slot) in ingredients.iter_mut().enumerate() {
            slot.ingredient = take(format!("strIngredient{}", i + 1).as_str()).unwrap_or_default();
            slot.measure = take(format!("strMeasure{}", i + 1).as_str()).unwrap_or_default();
        }

        Ok(Meal {
            id,
            name,
            category,
            area,
            instructions,
            thumbnail,
            youtube,
            source,
            ingredients,
            extra: fields,
        })
    }
}

/// The id/name/thumbnail triple `filter.php` returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSummary {
    #[serde(rename = "idMeal", default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "strMeal", default)]
    pub name: Option<String>,
    #[serde(rename = "strMealThumb", default)]
    pub thumbnail: Option<String>,
}

impl MealSummary {
    #[must_use]
    pub fn numeric_id(&self) -> Option<i64> {
        self.id.trim().parse().ok()
    }
}

// --- Reference data ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(
        rename = "idCategory",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub name: Option<String>,
    #[serde(rename = "strCategoryThumb", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "strCategoryDescription", default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    #[serde(rename = "strArea", default)]
    pub name: Option<String>,
}

/// An entry of `list.php?i=list`. The store does not track `idIngredient` or
/// `strType`; rows read back from it carry `"0"` and `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientInfo {
    #[serde(
        rename = "idIngredient",
        default,
        deserialize_with = "opt_string_or_number"
    )]
    pub id: Option<String>,
    #[serde(rename = "strIngredient", default)]
    pub name: Option<String>,
    #[serde(rename = "strDescription", default)]
    pub description: Option<String>,
    #[serde(rename = "strType", default)]
    pub kind: Option<String>,
}

// --- Envelopes ---

/// `{"meals": [...]}`. Upstream sends `{"meals": null}` for no results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct MealList<T> {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub meals: Vec<T>,
}

impl<T> MealList<T> {
    #[must_use]
    pub fn new(meals: Vec<T>) -> Self {
        Self { meals }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.meals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryList {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<Category>,
}

impl CategoryList {
    #[must_use]
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }
}

// --- Bookkeeping ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Remote,
    CacheHit,
}

impl RequestKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "API",
            Self::CacheHit => "DB_FETCH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiRequestLog {
    pub id: i64,
    pub endpoint: String,
    pub request_type: String,
    pub parameters: String,
    pub status_code: i64,
    pub requested_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCount {
    pub keyword: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularSearch {
    pub keyword: String,
    pub count: i64,
    pub search_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upstream_meal() -> Value {
        let mut meal = json!({
            "idMeal": "52772",
            "strMeal": "Teriyaki Chicken Casserole",
            "strDrinkAlternate": null,
            "strCategory": "Chicken",
            "strArea": "Japanese",
            "strInstructions": "Preheat oven to 350F.",
            "strMealThumb": "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
            "strTags": "Meat,Casserole",
            "strYoutube": "https://www.youtube.com/watch?v=4aZr5hZXP_s",
            "strSource": null,
        });
        let fields = meal.as_object_mut().unwrap();
        for i in 1..=20 {
            let (ingredient, measure) = match i {
                1 => (json!("soy sauce"), json!("3/4 cup")),
                2 => (json!("water"), json!("1/2 cup")),
                3..=15 => (json!(""), json!(" ")),
                _ => (Value::Null, Value::Null),
            };
            fields.insert(format!("strIngredient{i}"), ingredient);
            fields.insert(format!("strMeasure{i}"), measure);
        }
        meal
    }

    #[test]
    fn test_meal_from_upstream_json() {
        let meal: Meal = serde_json::from_value(upstream_meal()).unwrap();
        assert_eq!(meal.id, "52772");
        assert_eq!(meal.numeric_id(), Some(52772));
        assert_eq!(meal.name.as_deref(), Some("Teriyaki Chicken Casserole"));
        assert_eq!(meal.category.as_deref(), Some("Chicken"));
        assert!(meal.source.is_none());
        assert_eq!(meal.ingredients[0], IngredientLine::new("soy sauce", "3/4 cup"));
        assert_eq!(meal.ingredients[1], IngredientLine::new("water", "1/2 cup"));
        // Null slots decode as empty
        assert_eq!(meal.ingredients[19], IngredientLine::default());
        assert_eq!(meal.lines().count(), 2);
    }

    #[test]
    fn test_meal_keeps_untracked_fields() {
        let meal: Meal = serde_json::from_value(upstream_meal()).unwrap();
        assert_eq!(meal.extra.get("strTags"), Some(&json!("Meat,Casserole")));
        assert!(meal.extra.contains_key("strDrinkAlternate"));
        assert!(!meal.extra.contains_key("strIngredient1"));

        let value = serde_json::to_value(&meal).unwrap();
        assert_eq!(value["strTags"], "Meat,Casserole");
    }

    #[test]
    fn test_meal_serializes_all_twenty_slots() {
        let mut meal = Meal {
            id: "1".to_string(),
            ..Meal::default()
        };
        meal.set_lines([IngredientLine::new("Eggs", "2")]);

        let value = serde_json::to_value(&meal).unwrap();
        assert_eq!(value["strIngredient1"], "Eggs");
        assert_eq!(value["strMeasure1"], "2");
        assert_eq!(value["strIngredient20"], "");
        assert_eq!(value["strMeasure20"], "");
        assert!(value.get("strIngredient21").is_none());
        assert!(value["strMeal"].is_null());
    }

    #[test]
    fn test_meal_tolerates_missing_keys() {
        let meal: Meal = serde_json::from_value(json!({ "idMeal": 123 })).unwrap();
        assert_eq!(meal.id, "123");
        assert!(meal.name.is_none());
        assert_eq!(meal.lines().count(), 0);

        let no_id: Meal = serde_json::from_value(json!({ "strMeal": "Orphan" })).unwrap();
        assert!(no_id.numeric_id().is_none());
    }

    #[test]
    fn test_set_lines_packs_and_truncates() {
        let mut meal = Meal::default();
        meal.ingredients[5] = IngredientLine::new("stale", "x");
        meal.set_lines((0..25).map(|i| IngredientLine::new(format!("item{i}"), "")));
        assert_eq!(meal.ingredients[0].ingredient, "item0");
        assert_eq!(meal.ingredients[19].ingredient, "item19");

        meal.set_lines([IngredientLine::new("only", "1")]);
        assert_eq!(meal.lines().count(), 1);
        assert!(meal.ingredients[5].is_empty());
    }

    #[test]
    fn test_whitespace_ingredient_is_empty() {
        assert!(IngredientLine::new("  ", "1 cup").is_empty());
        assert!(!IngredientLine::new("Salt", "").is_empty());
    }

    #[test]
    fn test_null_meals_decode_as_empty() {
        let list: MealList<MealSummary> = serde_json::from_str(r#"{"meals":null}"#).unwrap();
        assert!(list.is_empty());

        let missing: MealList<Area> = serde_json::from_str("{}").unwrap();
        assert!(missing.is_empty());

        let categories: CategoryList = serde_json::from_str(r#"{"categories":null}"#).unwrap();
        assert!(categories.categories.is_empty());
    }

    #[test]
    fn test_summary_accepts_numeric_id() {
        let summary: MealSummary =
            serde_json::from_value(json!({ "idMeal": 52772, "strMeal": "Teriyaki" })).unwrap();
        assert_eq!(summary.id, "52772");
        assert_eq!(summary.numeric_id(), Some(52772));
        assert!(summary.thumbnail.is_none());
    }

    #[test]
    fn test_category_omits_absent_id() {
        let category = Category {
            id: None,
            name: Some("Beef".to_string()),
            thumbnail: None,
            description: None,
        };
        let value = serde_json::to_value(&category).unwrap();
        assert!(value.get("idCategory").is_none());
        assert_eq!(value["strCategory"], "Beef");
        assert!(value["strCategoryThumb"].is_null());
    }

    #[test]
    fn test_ingredient_info_serializes_null_type() {
        let info = IngredientInfo {
            id: Some("0".to_string()),
            name: Some("Chicken".to_string()),
            description: None,
            kind: None,
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["idIngredient"], "0");
        assert!(value["strType"].is_null());
    }

    #[test]
    fn test_ingredient_thumbnail() {
        assert_eq!(
            ingredient_thumbnail("Lime"),
            "https://www.themealdb.com/images/ingredients/Lime.png"
        );
    }

    #[test]
    fn test_request_kind_labels() {
        assert_eq!(RequestKind::Remote.as_str(), "API");
        assert_eq!(RequestKind::CacheHit.as_str(), "DB_FETCH");
    }
}
