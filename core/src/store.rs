use anyhow::Result;

use crate::models::{
    ApiRequestLog, Area, Category, IngredientInfo, Meal, MealSummary, PopularSearch, RequestKind,
    SearchCount,
};

/// Persistence seam for the orchestrator.
///
/// Reads return rows already converted to TheMealDB's shape; an empty `Vec`
/// or `None` means "not cached". `Database` is the SQLite implementation and,
/// opened in memory, doubles as the test store.
pub trait MealStore: Send {
    // --- Reads ---

    /// Full meal with its ingredient slots. Refreshes the meal's `last_accessed`.
    fn meal_by_id(&self, id: i64) -> Result<Option<Meal>>;
    /// Ids of meals whose name contains `name`, case-insensitively.
    fn meal_ids_by_name(&self, name: &str) -> Result<Vec<i64>>;
    fn meals_by_category(&self, category: &str) -> Result<Vec<MealSummary>>;
    fn meals_by_area(&self, area: &str) -> Result<Vec<MealSummary>>;
    /// Meals with an ingredient line containing `ingredient`.
    fn meals_by_ingredient(&self, ingredient: &str) -> Result<Vec<MealSummary>>;
    fn categories(&self) -> Result<Vec<Category>>;
    fn areas(&self) -> Result<Vec<Area>>;
    fn ingredients(&self) -> Result<Vec<IngredientInfo>>;
    /// Most recently cached meals first.
    fn latest_meals(&self, limit: usize) -> Result<Vec<MealSummary>>;

    // --- Writes ---

    /// Upsert a meal, replace its ingredient lines, and register the
    /// ingredients, category and area it references, as one unit.
    /// Returns `false` when the meal has no numeric id and was skipped.
    fn save_meal(&self, meal: &Meal) -> Result<bool>;
    fn save_category(&self, category: &Category) -> Result<()>;
    fn save_area(&self, name: &str) -> Result<()>;
    fn save_ingredient(&self, name: &str, description: Option<&str>) -> Result<()>;
    fn record_search(&self, keyword: &str, search_type: &str, results_count: usize) -> Result<()>;
    fn log_api_request(
        &self,
        endpoint: &str,
        kind: RequestKind,
        parameters: &str,
        status_code: u16,
    ) -> Result<()>;

    // --- Analytics ---

    fn similar_searches(&self, keyword: &str, limit: usize) -> Result<Vec<SearchCount>>;
    fn popular_searches(&self, limit: usize) -> Result<Vec<PopularSearch>>;
    fn recent_api_requests(&self, limit: usize) -> Result<Vec<ApiRequestLog>>;
}
