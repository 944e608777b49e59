use anyhow::Result;

use mealcache_core::models::{MealList, MealSummary};
use mealcache_core::service::MealApi;

use super::helpers::{
    JSON_NO_MEALS, exit_no_results, print_json, print_meal_detail, print_meal_table,
    print_summary_table,
};

pub(crate) fn cmd_search(api: &MealApi, name: &str, json: bool) -> Result<()> {
    let Some(list) = api.search_meal(name) else {
        exit_no_results(json, JSON_NO_MEALS, &format!("No meals found for '{name}'"));
    };

    if json {
        return print_json(&list);
    }
    print_meal_table(&list.meals);
    Ok(())
}

pub(crate) fn cmd_show(api: &MealApi, id: i64, json: bool) -> Result<()> {
    let Some(list) = api.meal_by_id(id) else {
        exit_no_results(json, JSON_NO_MEALS, &format!("No meal with id {id}"));
    };

    if json {
        return print_json(&list);
    }
    for meal in &list.meals {
        print_meal_detail(meal);
    }
    Ok(())
}

pub(crate) fn cmd_random(api: &MealApi, json: bool) -> Result<()> {
    let Some(list) = api.random_meal() else {
        exit_no_results(json, JSON_NO_MEALS, "Could not fetch a random meal");
    };

    if json {
        return print_json(&list);
    }
    for meal in &list.meals {
        print_meal_detail(meal);
    }
    Ok(())
}

pub(crate) fn cmd_latest(api: &MealApi, limit: usize, json: bool) -> Result<()> {
    let meals = api.latest_meals(limit);
    if meals.is_empty() {
        exit_no_results(json, JSON_NO_MEALS, "No meals cached yet");
    }

    if json {
        return print_json(&MealList::new(meals));
    }
    print_summary_table(&meals);
    Ok(())
}

/// Which `filter.php` dimension to list meals by.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Filter {
    Category,
    Area,
    Ingredient,
}

pub(crate) fn cmd_filter(api: &MealApi, filter: Filter, value: &str, json: bool) -> Result<()> {
    let found: Option<MealList<MealSummary>> = match filter {
        Filter::Category => api.meals_by_category(value),
        Filter::Area => api.meals_by_area(value),
        Filter::Ingredient => api.meals_by_ingredient(value),
    };
    let Some(list) = found else {
        let what = match filter {
            Filter::Category => "category",
            Filter::Area => "area",
            Filter::Ingredient => "ingredient",
        };
        exit_no_results(json, JSON_NO_MEALS, &format!("No meals found for {what} '{value}'"));
    };

    if json {
        return print_json(&list);
    }
    print_summary_table(&list.meals);
    Ok(())
}
