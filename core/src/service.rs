use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, error, warn};

use crate::db::Database;
use crate::lookup::{self, Lookup, Payload};
use crate::models::{
    ApiRequestLog, Area, CategoryList, IngredientInfo, Meal, MealList, MealSummary,
    PopularSearch, RequestKind, SearchCount,
};
use crate::store::MealStore;
use crate::themealdb;

pub const SIMILAR_SEARCH_LIMIT: usize = 5;
pub const DEFAULT_POPULAR_LIMIT: usize = 10;
/// Upper bound on random draws when the store has no meals to show as "latest".
const LATEST_RANDOM_FALLBACK: usize = 10;

/// Remote TheMealDB access.
///
/// `fetch` performs one GET of `endpoint` with `params` and returns the body,
/// or an error for transport failures and non-success statuses. Called
/// synchronously; async callers should drive `MealApi` from a blocking task.
pub trait MealDbProvider: Send + Sync {
    fn fetch(&self, endpoint: &str, params: &[(&'static str, String)]) -> Result<String>;
}

/// Cache-aside front end: serve from the store when it can, otherwise fetch
/// from TheMealDB and populate the store from the response.
pub struct MealApi {
    store: Box<dyn MealStore>,
    provider: Box<dyn MealDbProvider>,
}

impl MealApi {
    pub fn new(store: Box<dyn MealStore>, provider: Box<dyn MealDbProvider>) -> Self {
        Self { store, provider }
    }

    pub fn open(db_path: &Path, provider: Box<dyn MealDbProvider>) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self::new(Box::new(db), provider))
    }

    #[must_use]
    pub fn store(&self) -> &dyn MealStore {
        self.store.as_ref()
    }

    // --- Lookups ---

    pub fn search_meal(&self, name: &str) -> Option<MealList<Meal>> {
        self.meals(&Lookup::Name(name.to_string()))
    }

    pub fn meal_by_id(&self, id: i64) -> Option<MealList<Meal>> {
        self.meals(&Lookup::Id(id))
    }

    /// Always asks the remote; the store has no notion of "random".
    pub fn random_meal(&self) -> Option<MealList<Meal>> {
        self.meals(&Lookup::Random)
    }

    pub fn categories(&self) -> Option<CategoryList> {
        match self.fetch(&Lookup::Categories)? {
            Payload::Categories(list) => Some(list),
            _ => None,
        }
    }

    pub fn areas(&self) -> Option<MealList<Area>> {
        match self.fetch(&Lookup::Areas)? {
            Payload::Areas(list) => Some(list),
            _ => None,
        }
    }

    pub fn ingredients(&self) -> Option<MealList<IngredientInfo>> {
        match self.fetch(&Lookup::Ingredients)? {
            Payload::Ingredients(list) => Some(list),
            _ => None,
        }
    }

    pub fn meals_by_category(&self, category: &str) -> Option<MealList<MealSummary>> {
        self.summaries(&Lookup::Category(category.to_string()))
    }

    pub fn meals_by_area(&self, area: &str) -> Option<MealList<MealSummary>> {
        self.summaries(&Lookup::Area(area.to_string()))
    }

    pub fn meals_by_ingredient(&self, ingredient: &str) -> Option<MealList<MealSummary>> {
        self.summaries(&Lookup::Ingredient(ingredient.to_string()))
    }

    /// Most recently cached meals. An empty store falls back to a handful of
    /// random meals, which populates it as a side effect.
    pub fn latest_meals(&self, limit: usize) -> Vec<MealSummary> {
        match self.store.latest_meals(limit) {
            Ok(meals) if !meals.is_empty() => return meals,
            Ok(_) => debug!("no cached meals, falling back to random"),
            Err(e) => error!("failed to read latest meals: {e:#}"),
        }

        let mut seen = HashSet::new();
        let mut meals = Vec::new();
        for _ in 0..limit.min(LATEST_RANDOM_FALLBACK) {
            let Some(list) = self.random_meal() else {
                continue;
            };
            for meal in list.meals {
                if seen.insert(meal.id.clone()) {
                    meals.push(meal.summary());
                }
            }
        }
        meals
    }

    // --- Analytics ---

    pub fn similar_searches(&self, keyword: &str) -> Vec<SearchCount> {
        self.store
            .similar_searches(keyword, SIMILAR_SEARCH_LIMIT)
            .unwrap_or_else(|e| {
                error!("failed to read similar searches: {e:#}");
                Vec::new()
            })
    }

    pub fn popular_searches(&self, limit: usize) -> Vec<PopularSearch> {
        self.store.popular_searches(limit).unwrap_or_else(|e| {
            error!("failed to read popular searches: {e:#}");
            Vec::new()
        })
    }

    pub fn recent_api_requests(&self, limit: usize) -> Vec<ApiRequestLog> {
        self.store.recent_api_requests(limit).unwrap_or_else(|e| {
            error!("failed to read request log: {e:#}");
            Vec::new()
        })
    }

    // --- Orchestration ---

    /// Resolve `lookup` from the store, or from the remote on a miss.
    /// Writes exactly one request-log row.
    pub fn fetch(&self, lookup: &Lookup) -> Option<Payload> {
        match lookup::read_from_store(self.store.as_ref(), lookup) {
            Ok(Some(payload)) => {
                debug!(kind = lookup.kind(), keyword = %lookup.keyword(), "cache hit");
                self.log_request(lookup, RequestKind::CacheHit, 200);
                return Some(payload);
            }
            Ok(None) => debug!(kind = lookup.kind(), keyword = %lookup.keyword(), "cache miss"),
            Err(e) => error!("store read failed for {}: {e:#}", lookup.kind()),
        }

        self.fetch_remote(lookup)
    }

    fn fetch_remote(&self, lookup: &Lookup) -> Option<Payload> {
        let body = match self.provider.fetch(lookup.endpoint(), &lookup.params()) {
            Ok(body) => body,
            Err(e) => {
                warn!("request to {} failed: {e:#}", lookup.endpoint());
                self.log_request(lookup, RequestKind::Remote, 500);
                return None;
            }
        };

        let payload = match themealdb::decode(lookup, &body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("bad response from {}: {e:#}", lookup.endpoint());
                self.log_request(lookup, RequestKind::Remote, 500);
                return None;
            }
        };

        self.log_request(lookup, RequestKind::Remote, 200);
        if payload.is_empty() {
            return None;
        }

        self.populate(lookup, &payload);
        Some(payload)
    }

    fn populate(&self, lookup: &Lookup, payload: &Payload) {
        match payload {
            Payload::Meals(list) => {
                for meal in &list.meals {
                    match self.store.save_meal(meal) {
                        Ok(true) => {}
                        Ok(false) => debug!("skipping meal without a numeric id: {:?}", meal.id),
                        Err(e) => error!("failed to save meal {}: {e:#}", meal.id),
                    }
                }
                self.record_search(lookup, list.len());
            }
            Payload::Summaries(list) => {
                // Detail fetches keep the store holding full meals only
                for summary in &list.meals {
                    match summary.numeric_id() {
                        Some(id) => {
                            self.meal_by_id(id);
                        }
                        None => debug!("skipping summary without a numeric id: {:?}", summary.id),
                    }
                }
                self.record_search(lookup, list.len());
            }
            Payload::Categories(list) => {
                for category in &list.categories {
                    if category.name.as_deref().is_none_or(str::is_empty) {
                        continue;
                    }
                    if let Err(e) = self.store.save_category(category) {
                        error!("failed to save category: {e:#}");
                    }
                }
            }
            Payload::Areas(list) => {
                for name in list.meals.iter().filter_map(|a| a.name.as_deref()) {
                    if name.is_empty() {
                        continue;
                    }
                    if let Err(e) = self.store.save_area(name) {
                        error!("failed to save area {name}: {e:#}");
                    }
                }
            }
            Payload::Ingredients(list) => {
                for info in &list.meals {
                    let Some(name) = info.name.as_deref().filter(|n| !n.is_empty()) else {
                        continue;
                    };
                    if let Err(e) = self.store.save_ingredient(name, info.description.as_deref()) {
                        error!("failed to save ingredient {name}: {e:#}");
                    }
                }
            }
        }
    }

    fn record_search(&self, lookup: &Lookup, results: usize) {
        if let Err(e) = self
            .store
            .record_search(&lookup.keyword(), lookup.kind(), results)
        {
            error!("failed to record search: {e:#}");
        }
    }

    fn log_request(&self, lookup: &Lookup, kind: RequestKind, status: u16) {
        if let Err(e) = self.store.log_api_request(
            lookup.endpoint(),
            kind,
            &lookup.parameters_json(),
            status,
        ) {
            error!("failed to log request: {e:#}");
        }
    }

    fn meals(&self, lookup: &Lookup) -> Option<MealList<Meal>> {
        match self.fetch(lookup)? {
            Payload::Meals(list) => Some(list),
            _ => None,
        }
    }

    fn summaries(&self, lookup: &Lookup) -> Option<MealList<MealSummary>> {
        match self.fetch(lookup)? {
            Payload::Summaries(list) => Some(list),
            _ => None,
        }
    }
}
