use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{Area, CategoryList, IngredientInfo, Meal, MealList, MealSummary};
use crate::store::MealStore;
use crate::themealdb;

/// One kind of lookup the orchestrator knows how to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Name(String),
    Id(i64),
    Category(String),
    Area(String),
    Ingredient(String),
    Random,
    Categories,
    Areas,
    Ingredients,
}

impl Lookup {
    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Name(_) => themealdb::SEARCH,
            Self::Id(_) => themealdb::LOOKUP,
            Self::Random => themealdb::RANDOM,
            Self::Category(_) | Self::Area(_) | Self::Ingredient(_) => themealdb::FILTER,
            Self::Categories => themealdb::CATEGORIES,
            Self::Areas | Self::Ingredients => themealdb::LIST,
        }
    }

    /// Query string pairs for the remote endpoint.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Name(name) => vec![("s", name.clone())],
            Self::Id(id) => vec![("i", id.to_string())],
            Self::Category(category) => vec![("c", category.clone())],
            Self::Area(area) => vec![("a", area.clone())],
            Self::Ingredient(ingredient) => vec![("i", ingredient.clone())],
            Self::Areas => vec![("a", "list".to_string())],
            Self::Ingredients => vec![("i", "list".to_string())],
            Self::Random | Self::Categories => Vec::new(),
        }
    }

    /// Search-kind label written to the search history.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Id(_) => "id",
            Self::Category(_) => "category",
            Self::Area(_) => "area",
            Self::Ingredient(_) => "ingredient",
            Self::Random => "random",
            Self::Categories => "categories",
            Self::Areas => "areas",
            Self::Ingredients => "ingredients",
        }
    }

    #[must_use]
    pub fn keyword(&self) -> String {
        match self {
            Self::Name(s) | Self::Category(s) | Self::Area(s) | Self::Ingredient(s) => s.clone(),
            Self::Id(id) => id.to_string(),
            Self::Random => "random".to_string(),
            Self::Categories | Self::Areas | Self::Ingredients => "all".to_string(),
        }
    }

    /// The query parameters as a JSON object, as recorded in the request log.
    #[must_use]
    pub fn parameters_json(&self) -> String {
        let map: Map<String, Value> = self
            .params()
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::String(value)))
            .collect();
        Value::Object(map).to_string()
    }
}

/// A lookup result in exactly the shape TheMealDB returns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Meals(MealList<Meal>),
    Summaries(MealList<MealSummary>),
    Categories(CategoryList),
    Areas(MealList<Area>),
    Ingredients(MealList<IngredientInfo>),
}

impl Payload {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Meals(list) => list.len(),
            Self::Summaries(list) => list.len(),
            Self::Categories(list) => list.categories.len(),
            Self::Areas(list) => list.len(),
            Self::Ingredients(list) => list.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serve `lookup` from the store. `Ok(None)` means nothing is cached for it.
pub fn read_from_store(store: &dyn MealStore, lookup: &Lookup) -> Result<Option<Payload>> {
    let payload = match lookup {
        Lookup::Name(name) => {
            let mut meals = Vec::new();
            for id in store.meal_ids_by_name(name)? {
                if let Some(meal) = store.meal_by_id(id)? {
                    meals.push(meal);
                }
            }
            Payload::Meals(MealList::new(meals))
        }
        Lookup::Id(id) => Payload::Meals(MealList::new(
            store.meal_by_id(*id)?.into_iter().collect(),
        )),
        Lookup::Category(category) => {
            Payload::Summaries(MealList::new(store.meals_by_category(category)?))
        }
        Lookup::Area(area) => Payload::Summaries(MealList::new(store.meals_by_area(area)?)),
        Lookup::Ingredient(ingredient) => {
            Payload::Summaries(MealList::new(store.meals_by_ingredient(ingredient)?))
        }
        Lookup::Categories => Payload::Categories(CategoryList::new(store.categories()?)),
        Lookup::Areas => Payload::Areas(MealList::new(store.areas()?)),
        Lookup::Ingredients => Payload::Ingredients(MealList::new(store.ingredients()?)),
        Lookup::Random => return Ok(None),
    };

    if payload.is_empty() {
        Ok(None)
    } else {
        Ok(Some(payload))
    }
}
