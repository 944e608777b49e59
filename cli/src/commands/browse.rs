use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use mealcache_core::service::MealApi;

use super::helpers::{JSON_NO_MEALS, exit_no_results, print_json, truncate};

pub(crate) fn cmd_categories(api: &MealApi, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "Category")]
        name: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    let Some(list) = api.categories() else {
        exit_no_results(json, r#"{"categories":null}"#, "No categories available");
    };

    if json {
        return print_json(&list);
    }

    let rows: Vec<CategoryRow> = list
        .categories
        .iter()
        .map(|c| CategoryRow {
            name: c.name.clone().unwrap_or_default(),
            description: c
                .description
                .as_deref()
                .map(|d| truncate(d.trim(), 60))
                .unwrap_or_default(),
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}

pub(crate) fn cmd_areas(api: &MealApi, json: bool) -> Result<()> {
    let Some(list) = api.areas() else {
        exit_no_results(json, JSON_NO_MEALS, "No areas available");
    };

    if json {
        return print_json(&list);
    }
    for name in list.meals.iter().filter_map(|a| a.name.as_deref()) {
        println!("{name}");
    }
    Ok(())
}

pub(crate) fn cmd_ingredients(api: &MealApi, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct IngredientRow {
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Type")]
        kind: String,
    }

    let Some(list) = api.ingredients() else {
        exit_no_results(json, JSON_NO_MEALS, "No ingredients available");
    };

    if json {
        return print_json(&list);
    }

    let rows: Vec<IngredientRow> = list
        .meals
        .iter()
        .map(|i| IngredientRow {
            name: i.name.clone().unwrap_or_default(),
            kind: i.kind.clone().unwrap_or_default(),
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}
