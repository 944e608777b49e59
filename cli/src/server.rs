use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use mealcache_core::lookup::{Lookup, Payload};
use mealcache_core::models::{
    ApiRequestLog, Area, CategoryList, IngredientInfo, Meal, MealList, MealSummary, PopularSearch,
};
use mealcache_core::service::{DEFAULT_POPULAR_LIMIT, MealApi};

const PAGE_SIZE: usize = 12;
const DEFAULT_LATEST_LIMIT: usize = 20;
const DEFAULT_REQUEST_LIMIT: usize = 50;

#[derive(Clone)]
struct AppState {
    api: Arc<Mutex<MealApi>>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct NameQuery {
    #[serde(default)]
    s: String,
}

#[derive(Deserialize)]
struct FilterQuery {
    c: Option<String>,
    a: Option<String>,
    i: Option<String>,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct KeywordQuery {
    #[serde(default)]
    keyword: String,
}

#[derive(Deserialize)]
struct PagedSearchQuery {
    #[serde(default)]
    keyword: String,
    #[serde(rename = "type", default = "default_search_type")]
    search_type: String,
    page: Option<usize>,
}

fn default_search_type() -> String {
    "name".to_string()
}

/// One card of a paged search result.
#[derive(Debug, Serialize)]
struct SearchResult {
    id: String,
    name: Option<String>,
    thumbnail: Option<String>,
    category: Option<String>,
    area: Option<String>,
}

impl From<&Meal> for SearchResult {
    fn from(meal: &Meal) -> Self {
        Self {
            id: meal.id.clone(),
            name: meal.name.clone(),
            thumbnail: meal.thumbnail.clone(),
            category: meal.category.clone(),
            area: meal.area.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchPage {
    results: Vec<SearchResult>,
    page: usize,
    total: usize,
    #[serde(rename = "hasMore")]
    has_more: bool,
}

#[derive(Serialize)]
struct Suggestions {
    suggestions: Vec<String>,
}

#[derive(Serialize)]
struct PopularSearches {
    searches: Vec<PopularSearch>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                tracing::error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

/// Run `f` against the orchestrator on the blocking pool.
async fn with_api<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&MealApi) -> T + Send + 'static,
    T: Send + 'static,
{
    let api = Arc::clone(&state.api);
    let result = tokio::task::spawn_blocking(move || {
        let api = api.lock().unwrap_or_else(PoisonError::into_inner);
        f(&api)
    })
    .await
    .context("orchestrator task failed")?;
    Ok(result)
}

fn found<T>(value: Option<T>, what: impl FnOnce() -> String) -> Result<Json<T>, ApiError> {
    value.map(Json).ok_or_else(|| ApiError::NotFound(what()))
}

fn require(value: &str, name: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("Missing '{name}' parameter")));
    }
    Ok(value.to_string())
}

async fn search_meals(
    State(state): State<AppState>,
    Query(params): Query<NameQuery>,
) -> Result<Json<MealList<Meal>>, ApiError> {
    let name = require(&params.s, "s")?;
    let query = name.clone();
    let meals = with_api(&state, move |api| api.search_meal(&query)).await?;
    found(meals, || format!("No meals found for '{name}'"))
}

async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MealList<Meal>>, ApiError> {
    let meals = with_api(&state, move |api| api.meal_by_id(id)).await?;
    found(meals, || format!("No meal with id {id}"))
}

async fn random_meal(State(state): State<AppState>) -> Result<Json<MealList<Meal>>, ApiError> {
    let meals = with_api(&state, MealApi::random_meal).await?;
    found(meals, || "Could not fetch a random meal".to_string())
}

async fn latest_meals(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<MealList<MealSummary>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LATEST_LIMIT);
    let meals = with_api(&state, move |api| api.latest_meals(limit)).await?;
    if meals.is_empty() {
        return Err(ApiError::NotFound("No meals available".to_string()));
    }
    Ok(Json(MealList::new(meals)))
}

async fn filter_meals(
    State(state): State<AppState>,
    Query(params): Query<FilterQuery>,
) -> Result<Json<MealList<MealSummary>>, ApiError> {
    let lookup = match (params.c, params.a, params.i) {
        (Some(c), None, None) => Lookup::Category(require(&c, "c")?),
        (None, Some(a), None) => Lookup::Area(require(&a, "a")?),
        (None, None, Some(i)) => Lookup::Ingredient(require(&i, "i")?),
        _ => {
            return Err(ApiError::BadRequest(
                "Exactly one of 'c', 'a' or 'i' is required".to_string(),
            ));
        }
    };
    let keyword = lookup.keyword();
    let meals = with_api(&state, move |api| match lookup {
        Lookup::Category(c) => api.meals_by_category(&c),
        Lookup::Area(a) => api.meals_by_area(&a),
        Lookup::Ingredient(i) => api.meals_by_ingredient(&i),
        _ => None,
    })
    .await?;
    found(meals, || format!("No meals found for '{keyword}'"))
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<CategoryList>, ApiError> {
    let categories = with_api(&state, MealApi::categories).await?;
    found(categories, || "No categories available".to_string())
}

async fn list_areas(State(state): State<AppState>) -> Result<Json<MealList<Area>>, ApiError> {
    let areas = with_api(&state, MealApi::areas).await?;
    found(areas, || "No areas available".to_string())
}

async fn list_ingredients(
    State(state): State<AppState>,
) -> Result<Json<MealList<IngredientInfo>>, ApiError> {
    let ingredients = with_api(&state, MealApi::ingredients).await?;
    found(ingredients, || "No ingredients available".to_string())
}

fn search_lookup(search_type: &str, keyword: String) -> Result<Lookup, ApiError> {
    match search_type {
        "name" => Ok(Lookup::Name(keyword)),
        "category" => Ok(Lookup::Category(keyword)),
        "area" => Ok(Lookup::Area(keyword)),
        "ingredient" => Ok(Lookup::Ingredient(keyword)),
        other => Err(ApiError::BadRequest(format!("Unknown search type '{other}'"))),
    }
}

/// Cards for one page of a lookup's results. Filter results are expanded
/// with category and area from the store when it has the meal.
fn search_page(api: &MealApi, lookup: &Lookup, page: usize) -> SearchPage {
    let offset = (page - 1).saturating_mul(PAGE_SIZE);
    let (total, results) = match api.fetch(lookup) {
        Some(Payload::Meals(list)) => (
            list.len(),
            list.meals
                .iter()
                .skip(offset)
                .take(PAGE_SIZE)
                .map(SearchResult::from)
                .collect(),
        ),
        Some(Payload::Summaries(list)) => (
            list.len(),
            list.meals
                .iter()
                .skip(offset)
                .take(PAGE_SIZE)
                .map(|summary| {
                    let detail = summary
                        .numeric_id()
                        .and_then(|id| api.store().meal_by_id(id).ok().flatten());
                    match detail {
                        Some(meal) => SearchResult::from(&meal),
                        None => SearchResult {
                            id: summary.id.clone(),
                            name: summary.name.clone(),
                            thumbnail: summary.thumbnail.clone(),
                            category: None,
                            area: None,
                        },
                    }
                })
                .collect(),
        ),
        _ => (0, Vec::new()),
    };

    SearchPage {
        results,
        page,
        total,
        has_more: total > page.saturating_mul(PAGE_SIZE),
    }
}

async fn paged_search(
    State(state): State<AppState>,
    Query(params): Query<PagedSearchQuery>,
) -> Result<Json<SearchPage>, ApiError> {
    let keyword = require(&params.keyword, "keyword")?;
    let lookup = search_lookup(&params.search_type, keyword)?;
    let page = params.page.unwrap_or(1).max(1);
    let page = with_api(&state, move |api| search_page(api, &lookup, page)).await?;
    Ok(Json(page))
}

async fn search_suggestions(
    State(state): State<AppState>,
    Query(params): Query<KeywordQuery>,
) -> Result<Json<Suggestions>, ApiError> {
    let keyword = params.keyword.trim().to_string();
    if keyword.is_empty() {
        return Ok(Json(Suggestions {
            suggestions: Vec::new(),
        }));
    }
    let similar = with_api(&state, move |api| api.similar_searches(&keyword)).await?;
    Ok(Json(Suggestions {
        suggestions: similar.into_iter().map(|s| s.keyword).collect(),
    }))
}

async fn popular_searches(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<PopularSearches>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_POPULAR_LIMIT);
    let searches = with_api(&state, move |api| api.popular_searches(limit)).await?;
    Ok(Json(PopularSearches { searches }))
}

async fn recent_requests(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<ApiRequestLog>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_REQUEST_LIMIT);
    let requests = with_api(&state, move |api| api.recent_api_requests(limit)).await?;
    Ok(Json(requests))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/meals/search", get(search_meals))
        .route("/api/meals/random", get(random_meal))
        .route("/api/meals/latest", get(latest_meals))
        .route("/api/meals/{id}", get(get_meal))
        .route("/api/filter", get(filter_meals))
        .route("/api/categories", get(list_categories))
        .route("/api/areas", get(list_areas))
        .route("/api/ingredients", get(list_ingredients))
        .route("/api/search", get(paged_search))
        .route("/api/search/suggestions", get(search_suggestions))
        .route("/api/search/popular", get(popular_searches))
        .route("/api/requests", get(recent_requests))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(api: MealApi, port: u16, bind: &str) -> anyhow::Result<()> {
    let state = AppState {
        api: Arc::new(Mutex::new(api)),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("Failed to bind {bind}:{port}"))?;
    eprintln!("Listening on http://{bind}:{port}");
    tracing::info!(%bind, port, "server started");
    axum::serve(listener, app).await?;

    Ok(())
}
