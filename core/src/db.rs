use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{
    ApiRequestLog, Area, Category, IngredientInfo, IngredientLine, Meal, MealSummary,
    PopularSearch, RequestKind, SearchCount, ingredient_thumbnail,
};
use crate::store::MealStore;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS meals (
                    id INTEGER PRIMARY KEY,
                    name TEXT,
                    category TEXT,
                    area TEXT,
                    instructions TEXT,
                    thumbnail TEXT,
                    youtube_link TEXT,
                    source_link TEXT,
                    created_at TEXT NOT NULL,
                    last_accessed TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meal_ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
                    position INTEGER NOT NULL,
                    ingredient TEXT NOT NULL,
                    measure TEXT NOT NULL DEFAULT ''
                );

                CREATE TABLE IF NOT EXISTS ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    description TEXT,
                    thumbnail TEXT
                );

                CREATE TABLE IF NOT EXISTS categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    thumbnail TEXT,
                    description TEXT
                );

                CREATE TABLE IF NOT EXISTS areas (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE COLLATE NOCASE
                );

                CREATE TABLE IF NOT EXISTS search_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    keyword TEXT NOT NULL,
                    search_type TEXT NOT NULL,
                    results_count INTEGER NOT NULL,
                    searched_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS api_requests (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    endpoint TEXT NOT NULL,
                    request_type TEXT NOT NULL,
                    parameters TEXT NOT NULL,
                    status_code INTEGER NOT NULL,
                    requested_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_meal_ingredients_meal ON meal_ingredients(meal_id);
                CREATE INDEX IF NOT EXISTS idx_meals_category ON meals(category);
                CREATE INDEX IF NOT EXISTS idx_meals_area ON meals(area);
                CREATE INDEX IF NOT EXISTS idx_search_history_keyword ON search_history(keyword);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    // Expects columns:
    // 0: id, 1: name, 2: category, 3: area, 4: instructions,
    // 5: thumbnail, 6: youtube_link, 7: source_link
    fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Meal> {
        let id: i64 = row.get(0)?;
        Ok(Meal {
            id: id.to_string(),
            name: row.get(1)?,
            category: row.get(2)?,
            area: row.get(3)?,
            instructions: row.get(4)?,
            thumbnail: row.get(5)?,
            youtube: row.get(6)?,
            source: row.get(7)?,
            ..Meal::default()
        })
    }

    // Expects columns: 0: id, 1: name, 2: thumbnail
    fn summary_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealSummary> {
        let id: i64 = row.get(0)?;
        Ok(MealSummary {
            id: id.to_string(),
            name: row.get(1)?,
            thumbnail: row.get(2)?,
        })
    }

    fn summaries(&self, sql: &str, param: &str) -> Result<Vec<MealSummary>> {
        let mut stmt = self.conn.prepare(sql)?;
        let meals = stmt
            .query_map(params![param], Self::summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    fn ingredient_lines(&self, meal_id: i64) -> Result<Vec<IngredientLine>> {
        let mut stmt = self.conn.prepare(
            "SELECT ingredient, measure FROM meal_ingredients
             WHERE meal_id = ?1 ORDER BY position, id",
        )?;
        let lines = stmt
            .query_map(params![meal_id], |row| {
                Ok(IngredientLine {
                    ingredient: row.get(0)?,
                    measure: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }
}

/// `%term%` with LIKE wildcards in `term` escaped (pair with `ESCAPE '\'`).
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Like [`contains_pattern`], but `_` stays a wildcard: upstream ingredient
/// keys join words with underscores (`chicken_breast` for `Chicken Breast`).
fn ingredient_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%");
    format!("%{escaped}%")
}

impl MealStore for Database {
    // --- Reads ---

    fn meal_by_id(&self, id: i64) -> Result<Option<Meal>> {
        let meal = self
            .conn
            .query_row(
                "SELECT id, name, category, area, instructions, thumbnail, youtube_link, source_link
                 FROM meals WHERE id = ?1",
                params![id],
                Self::meal_from_row,
            )
            .optional()?;
        let Some(mut meal) = meal else {
            return Ok(None);
        };
        meal.set_lines(self.ingredient_lines(id)?);

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE meals SET last_accessed = ?1 WHERE id = ?2",
            params![now, id],
        )?;

        Ok(Some(meal))
    }

    fn meal_ids_by_name(&self, name: &str) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM meals WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name, id")?;
        let ids = stmt
            .query_map(params![contains_pattern(name)], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    fn meals_by_category(&self, category: &str) -> Result<Vec<MealSummary>> {
        self.summaries(
            "SELECT id, name, thumbnail FROM meals
             WHERE category = ?1 COLLATE NOCASE ORDER BY name, id",
            category,
        )
    }

    fn meals_by_area(&self, area: &str) -> Result<Vec<MealSummary>> {
        self.summaries(
            "SELECT id, name, thumbnail FROM meals
             WHERE area = ?1 COLLATE NOCASE ORDER BY name, id",
            area,
        )
    }

    fn meals_by_ingredient(&self, ingredient: &str) -> Result<Vec<MealSummary>> {
        self.summaries(
            "SELECT DISTINCT m.id, m.name, m.thumbnail
             FROM meals m
             JOIN meal_ingredients mi ON m.id = mi.meal_id
             WHERE mi.ingredient LIKE ?1 ESCAPE '\\'
             ORDER BY m.name, m.id",
            &ingredient_pattern(ingredient),
        )
    }

    fn categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, thumbnail, description FROM categories ORDER BY name")?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: None,
                    name: Some(row.get(0)?),
                    thumbnail: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn areas(&self) -> Result<Vec<Area>> {
        let mut stmt = self.conn.prepare("SELECT name FROM areas ORDER BY name")?;
        let areas = stmt
            .query_map([], |row| {
                Ok(Area {
                    name: Some(row.get(0)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(areas)
    }

    fn ingredients(&self) -> Result<Vec<IngredientInfo>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, description FROM ingredients ORDER BY name")?;
        let ingredients = stmt
            .query_map([], |row| {
                Ok(IngredientInfo {
                    id: Some("0".to_string()),
                    name: Some(row.get(0)?),
                    description: row.get(1)?,
                    kind: None,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    fn latest_meals(&self, limit: usize) -> Result<Vec<MealSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, thumbnail FROM meals
             ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let meals = stmt
            .query_map(params![limit], Self::summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    // --- Writes ---

    fn save_meal(&self, meal: &Meal) -> Result<bool> {
        let Some(id) = meal.numeric_id() else {
            return Ok(false);
        };
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO meals (id, name, category, area, instructions, thumbnail, youtube_link, source_link, created_at, last_accessed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                area = excluded.area,
                instructions = excluded.instructions,
                thumbnail = excluded.thumbnail,
                youtube_link = excluded.youtube_link,
                source_link = excluded.source_link",
            params![
                id,
                meal.name,
                meal.category,
                meal.area,
                meal.instructions,
                meal.thumbnail,
                meal.youtube,
                meal.source,
                now,
            ],
        )?;
        tx.execute(
            "DELETE FROM meal_ingredients WHERE meal_id = ?1",
            params![id],
        )?;

        for (position, line) in meal.lines() {
            tx.execute(
                "INSERT INTO meal_ingredients (meal_id, position, ingredient, measure)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, position, line.ingredient, line.measure],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO ingredients (name, thumbnail) VALUES (?1, ?2)",
                params![line.ingredient, ingredient_thumbnail(&line.ingredient)],
            )?;
        }

        if let Some(category) = meal.category.as_deref().filter(|c| !c.is_empty()) {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
                params![category],
            )?;
        }
        if let Some(area) = meal.area.as_deref().filter(|a| !a.is_empty()) {
            tx.execute(
                "INSERT OR IGNORE INTO areas (name) VALUES (?1)",
                params![area],
            )?;
        }

        tx.commit()
            .with_context(|| format!("Failed to commit meal {id}"))?;
        Ok(true)
    }

    fn save_category(&self, category: &Category) -> Result<()> {
        let name = category
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .context("Category has no name")?;
        self.conn.execute(
            "INSERT INTO categories (name, thumbnail, description)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET thumbnail = excluded.thumbnail, description = excluded.description",
            params![name, category.thumbnail, category.description],
        )?;
        Ok(())
    }

    fn save_area(&self, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO areas (name) VALUES (?1)",
            params![name],
        )?;
        Ok(())
    }

    fn save_ingredient(&self, name: &str, description: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO ingredients (name, description, thumbnail)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                description = COALESCE(excluded.description, ingredients.description),
                thumbnail = excluded.thumbnail",
            params![name, description, ingredient_thumbnail(name)],
        )?;
        Ok(())
    }

    fn record_search(&self, keyword: &str, search_type: &str, results_count: usize) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO search_history (keyword, search_type, results_count, searched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![keyword, search_type, results_count, now],
        )?;
        Ok(())
    }

    fn log_api_request(
        &self,
        endpoint: &str,
        kind: RequestKind,
        parameters: &str,
        status_code: u16,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO api_requests (endpoint, request_type, parameters, status_code, requested_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![endpoint, kind.as_str(), parameters, status_code, now],
        )?;
        Ok(())
    }

    // --- Analytics ---

    fn similar_searches(&self, keyword: &str, limit: usize) -> Result<Vec<SearchCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT keyword, COUNT(*) AS count
             FROM search_history
             WHERE keyword LIKE ?1 ESCAPE '\\'
             GROUP BY keyword
             ORDER BY count DESC, keyword
             LIMIT ?2",
        )?;
        let searches = stmt
            .query_map(params![contains_pattern(keyword), limit], |row| {
                Ok(SearchCount {
                    keyword: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(searches)
    }

    fn popular_searches(&self, limit: usize) -> Result<Vec<PopularSearch>> {
        let mut stmt = self.conn.prepare(
            "SELECT keyword, COUNT(*) AS count, MAX(search_type)
             FROM search_history
             GROUP BY keyword
             ORDER BY count DESC, keyword
             LIMIT ?1",
        )?;
        let searches = stmt
            .query_map(params![limit], |row| {
                Ok(PopularSearch {
                    keyword: row.get(0)?,
                    count: row.get(1)?,
                    search_type: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(searches)
    }

    fn recent_api_requests(&self, limit: usize) -> Result<Vec<ApiRequestLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, endpoint, request_type, parameters, status_code, requested_at
             FROM api_requests ORDER BY id DESC LIMIT ?1",
        )?;
        let requests = stmt
            .query_map(params![limit], |row| {
                Ok(ApiRequestLog {
                    id: row.get(0)?,
                    endpoint: row.get(1)?,
                    request_type: row.get(2)?,
                    parameters: row.get(3)?,
                    status_code: row.get(4)?,
                    requested_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meal() -> Meal {
        let mut meal = Meal {
            id: "52772".to_string(),
            name: Some("Teriyaki Chicken Casserole".to_string()),
            category: Some("Chicken".to_string()),
            area: Some("Japanese".to_string()),
            instructions: Some("Preheat oven to 350F.".to_string()),
            thumbnail: Some("https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg".to_string()),
            youtube: Some("https://www.youtube.com/watch?v=4aZr5hZXP_s".to_string()),
            source: None,
            ..Meal::default()
        };
        meal.set_lines([
            IngredientLine::new("soy sauce", "3/4 cup"),
            IngredientLine::new("water", "1/2 cup"),
            IngredientLine::new("brown sugar", "1/4 cup"),
        ]);
        meal
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_save_and_read_meal() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.save_meal(&sample_meal()).unwrap());

        let meal = db.meal_by_id(52772).unwrap().unwrap();
        assert_eq!(meal.id, "52772");
        assert_eq!(meal.name.as_deref(), Some("Teriyaki Chicken Casserole"));
        assert_eq!(meal.category.as_deref(), Some("Chicken"));
        assert_eq!(meal.area.as_deref(), Some("Japanese"));
        assert!(meal.source.is_none());
        assert_eq!(meal.ingredients[0], IngredientLine::new("soy sauce", "3/4 cup"));
        assert_eq!(meal.ingredients[2], IngredientLine::new("brown sugar", "1/4 cup"));
        assert!(meal.ingredients[3..].iter().all(IngredientLine::is_empty));
    }

    #[test]
    fn test_meal_by_id_missing() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.meal_by_id(1).unwrap().is_none());
    }

    #[test]
    fn test_meal_by_id_refreshes_last_accessed() {
        let db = Database::open_in_memory().unwrap();
        db.save_meal(&sample_meal()).unwrap();
        db.conn
            .execute(
                "UPDATE meals SET last_accessed = '2000-01-01T00:00:00+00:00'",
                [],
            )
            .unwrap();

        db.meal_by_id(52772).unwrap();

        let last: String = db
            .conn
            .query_row("SELECT last_accessed FROM meals WHERE id = 52772", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(last.as_str() > "2000-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_save_meal_replaces_ingredient_lines() {
        let db = Database::open_in_memory().unwrap();
        let mut meal = sample_meal();
        db.save_meal(&meal).unwrap();
        db.save_meal(&meal).unwrap();
        assert_eq!(count(&db, "meals"), 1);
        assert_eq!(count(&db, "meal_ingredients"), 3);

        meal.name = Some("Teriyaki Bake".to_string());
        meal.set_lines([IngredientLine::new("chicken thighs", "2 lb")]);
        db.save_meal(&meal).unwrap();

        assert_eq!(count(&db, "meals"), 1);
        assert_eq!(count(&db, "meal_ingredients"), 1);
        let stored = db.meal_by_id(52772).unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Teriyaki Bake"));
        assert_eq!(stored.ingredients[0].ingredient, "chicken thighs");
        assert!(stored.ingredients[1].is_empty());
    }

    #[test]
    fn test_save_meal_registers_reference_rows() {
        let db = Database::open_in_memory().unwrap();
        db.save_meal(&sample_meal()).unwrap();

        let categories = db.categories().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name.as_deref(), Some("Chicken"));
        assert!(categories[0].description.is_none());

        let areas = db.areas().unwrap();
        assert_eq!(areas[0].name.as_deref(), Some("Japanese"));

        let ingredients = db.ingredients().unwrap();
        assert_eq!(ingredients.len(), 3);
        assert!(ingredients.iter().all(|i| i.id.as_deref() == Some("0")));
        assert!(ingredients.iter().all(|i| i.kind.is_none()));

        let thumb: String = db
            .conn
            .query_row(
                "SELECT thumbnail FROM ingredients WHERE name = 'water'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(thumb, "https://www.themealdb.com/images/ingredients/water.png");
    }

    #[test]
    fn test_save_meal_skips_non_numeric_id() {
        let db = Database::open_in_memory().unwrap();
        let mut meal = sample_meal();
        meal.id = String::new();
        assert!(!db.save_meal(&meal).unwrap());
        assert_eq!(count(&db, "meals"), 0);
        assert_eq!(count(&db, "ingredients"), 0);
    }

    #[test]
    fn test_save_meal_keeps_slot_order_with_gaps() {
        let db = Database::open_in_memory().unwrap();
        let mut meal = sample_meal();
        meal.ingredients = Default::default();
        meal.ingredients[0] = IngredientLine::new("first", "1");
        meal.ingredients[4] = IngredientLine::new("second", "2");
        meal.ingredients[9] = IngredientLine::new("third", "3");
        db.save_meal(&meal).unwrap();

        let stored = db.meal_by_id(52772).unwrap().unwrap();
        let names: Vec<&str> = stored.lines().map(|(_, l)| l.ingredient.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_meal_ids_by_name() {
        let db = Database::open_in_memory().unwrap();
        db.save_meal(&sample_meal()).unwrap();

        assert_eq!(db.meal_ids_by_name("teriyaki").unwrap(), vec![52772]);
        assert_eq!(db.meal_ids_by_name("CASSEROLE").unwrap(), vec![52772]);
        assert!(db.meal_ids_by_name("lasagne").unwrap().is_empty());
        // Wildcards are literal
        assert!(db.meal_ids_by_name("%").unwrap().is_empty());
    }

    #[test]
    fn test_meals_by_category_and_area() {
        let db = Database::open_in_memory().unwrap();
        db.save_meal(&sample_meal()).unwrap();

        let by_category = db.meals_by_category("chicken").unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].id, "52772");
        assert_eq!(
            by_category[0].name.as_deref(),
            Some("Teriyaki Chicken Casserole")
        );

        assert_eq!(db.meals_by_area("Japanese").unwrap().len(), 1);
        assert!(db.meals_by_area("Jap").unwrap().is_empty());
    }

    #[test]
    fn test_meals_by_ingredient_is_distinct() {
        let db = Database::open_in_memory().unwrap();
        let mut meal = sample_meal();
        meal.set_lines([
            IngredientLine::new("soy sauce", "1 tbsp"),
            IngredientLine::new("dark soy sauce", "1 tsp"),
        ]);
        db.save_meal(&meal).unwrap();

        let found = db.meals_by_ingredient("soy").unwrap();
        assert_eq!(found.len(), 1);
        assert!(db.meals_by_ingredient("garlic").unwrap().is_empty());
    }

    #[test]
    fn test_save_category_upserts() {
        let db = Database::open_in_memory().unwrap();
        let mut beef = Category {
            id: Some("1".to_string()),
            name: Some("Beef".to_string()),
            thumbnail: Some("https://www.themealdb.com/images/category/beef.png".to_string()),
            description: Some("Beef is the culinary name for meat from cattle.".to_string()),
        };
        db.save_category(&beef).unwrap();
        beef.description = Some("Updated".to_string());
        db.save_category(&beef).unwrap();

        let categories = db.categories().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].description.as_deref(), Some("Updated"));
        assert!(categories[0].id.is_none());
    }

    #[test]
    fn test_save_category_fills_implicit_row() {
        let db = Database::open_in_memory().unwrap();
        db.save_meal(&sample_meal()).unwrap();
        db.save_category(&Category {
            id: None,
            name: Some("Chicken".to_string()),
            thumbnail: Some("thumb".to_string()),
            description: Some("desc".to_string()),
        })
        .unwrap();

        let categories = db.categories().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].thumbnail.as_deref(), Some("thumb"));
    }

    #[test]
    fn test_save_category_requires_name() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.save_category(&Category::default()).is_err());
    }

    #[test]
    fn test_save_area_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.save_area("Italian").unwrap();
        db.save_area("Italian").unwrap();
        assert_eq!(count(&db, "areas"), 1);
    }

    #[test]
    fn test_save_ingredient_upserts_description() {
        let db = Database::open_in_memory().unwrap();
        db.save_ingredient("Chicken", None).unwrap();
        db.save_ingredient("Chicken", Some("A domesticated bird."))
            .unwrap();

        let ingredients = db.ingredients().unwrap();
        assert_eq!(ingredients.len(), 1);
        assert_eq!(
            ingredients[0].description.as_deref(),
            Some("A domesticated bird.")
        );
    }

    #[test]
    fn test_latest_meals_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let mut first = sample_meal();
        first.id = "100".to_string();
        let mut second = sample_meal();
        second.id = "200".to_string();
        db.save_meal(&first).unwrap();
        db.save_meal(&second).unwrap();

        let latest = db.latest_meals(10).unwrap();
        let ids: Vec<&str> = latest.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["200", "100"]);
        assert_eq!(db.latest_meals(1).unwrap().len(), 1);
    }

    #[test]
    fn test_similar_and_popular_searches() {
        let db = Database::open_in_memory().unwrap();
        db.record_search("chicken", "name", 4).unwrap();
        db.record_search("chicken", "name", 4).unwrap();
        db.record_search("chicken curry", "name", 1).unwrap();
        db.record_search("Chicken", "category", 12).unwrap();
        db.record_search("beef", "name", 3).unwrap();

        let similar = db.similar_searches("chick", 5).unwrap();
        assert_eq!(similar[0].keyword, "chicken");
        assert_eq!(similar[0].count, 2);
        assert!(similar.iter().all(|s| s.keyword.to_lowercase().contains("chick")));
        assert!(similar.iter().all(|s| s.keyword != "beef"));

        let popular = db.popular_searches(2).unwrap();
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0].keyword, "chicken");
        assert_eq!(popular[0].count, 2);
        assert_eq!(popular[0].search_type, "name");
    }

    #[test]
    fn test_log_api_request() {
        let db = Database::open_in_memory().unwrap();
        db.log_api_request("lookup.php", RequestKind::Remote, r#"{"i":"52772"}"#, 200)
            .unwrap();
        db.log_api_request("lookup.php", RequestKind::CacheHit, r#"{"i":"52772"}"#, 200)
            .unwrap();

        let log = db.recent_api_requests(10).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].request_type, "DB_FETCH");
        assert_eq!(log[1].request_type, "API");
        assert_eq!(log[1].parameters, r#"{"i":"52772"}"#);
        assert_eq!(log[1].status_code, 200);
    }

    #[test]
    fn test_meals_by_ingredient_accepts_underscore_keys() {
        let db = Database::open_in_memory().unwrap();
        let mut meal = sample_meal();
        meal.set_lines([IngredientLine::new("Chicken Breast", "2")]);
        db.save_meal(&meal).unwrap();

        let found = db.meals_by_ingredient("chicken_breast").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "52772");
        assert!(db.meals_by_ingredient("chicken%thigh").unwrap().is_empty());
    }

    #[test]
    fn test_save_meal_rolls_back_on_failure() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute_batch(
                "CREATE TRIGGER reject_line BEFORE INSERT ON meal_ingredients
                 WHEN NEW.ingredient = 'boom'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let mut meal = sample_meal();
        meal.set_lines([
            IngredientLine::new("soy sauce", "3/4 cup"),
            IngredientLine::new("boom", "1"),
        ]);
        assert!(db.save_meal(&meal).is_err());

        for table in ["meals", "meal_ingredients", "ingredients", "categories", "areas"] {
            assert_eq!(count(&db, table), 0, "{table} should be empty");
        }
        assert!(db.meal_by_id(52772).unwrap().is_none());
    }

    #[test]
    fn test_save_ingredient_keeps_description_on_null_refresh() {
        let db = Database::open_in_memory().unwrap();
        db.save_ingredient("Chicken", Some("A domesticated bird."))
            .unwrap();
        db.save_ingredient("Chicken", None).unwrap();

        let ingredients = db.ingredients().unwrap();
        assert_eq!(
            ingredients[0].description.as_deref(),
            Some("A domesticated bird.")
        );
    }

    #[test]
    fn test_reference_names_are_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        db.save_area("Italian").unwrap();
        db.save_area("italian").unwrap();
        db.save_ingredient("Chicken", None).unwrap();
        db.save_ingredient("chicken", Some("A domesticated bird."))
            .unwrap();
        db.save_category(&Category {
            name: Some("Beef".to_string()),
            ..Category::default()
        })
        .unwrap();
        db.save_category(&Category {
            name: Some("BEEF".to_string()),
            ..Category::default()
        })
        .unwrap();

        assert_eq!(count(&db, "areas"), 1);
        assert_eq!(count(&db, "ingredients"), 1);
        assert_eq!(count(&db, "categories"), 1);
        assert_eq!(
            db.ingredients().unwrap()[0].description.as_deref(),
            Some("A domesticated bird.")
        );
    }

    #[test]
    fn test_open_on_disk_and_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.db");

        {
            let db = Database::open(&path).unwrap();
            db.save_meal(&sample_meal()).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert!(db.meal_by_id(52772).unwrap().is_some());

        let version: i64 = db
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }
}
