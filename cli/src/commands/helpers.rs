use anyhow::Result;
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealcache_core::models::{Meal, MealSummary};

/// What `--json` prints when a lookup has nothing: the upstream "no results" shape.
pub(crate) const JSON_NO_MEALS: &str = r#"{"meals":null}"#;

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report an empty result and exit with status 2.
pub(crate) fn exit_no_results(json: bool, json_body: &str, message: &str) -> ! {
    if json {
        println!("{json_body}");
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

pub(crate) fn print_meal_table(meals: &[Meal]) {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Area")]
        area: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .map(|m| MealRow {
            id: m.id.clone(),
            name: truncate(m.name.as_deref().unwrap_or("?"), 40),
            category: or_dash(m.category.as_deref()),
            area: or_dash(m.area.as_deref()),
            ingredients: m.lines().count(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_summary_table(meals: &[MealSummary]) {
    #[derive(Tabled)]
    struct SummaryRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
    }

    let rows: Vec<SummaryRow> = meals
        .iter()
        .enumerate()
        .map(|(i, m)| SummaryRow {
            idx: i + 1,
            id: m.id.clone(),
            name: truncate(m.name.as_deref().unwrap_or("?"), 50),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

pub(crate) fn print_meal_detail(meal: &Meal) {
    #[derive(Tabled)]
    struct LineRow {
        #[tabled(rename = "#")]
        slot: usize,
        #[tabled(rename = "Ingredient")]
        ingredient: String,
        #[tabled(rename = "Measure")]
        measure: String,
    }

    let name = meal.name.as_deref().unwrap_or("?");
    let id = &meal.id;
    println!("=== {name} (id: {id}) ===\n");

    let category = or_dash(meal.category.as_deref());
    let area = or_dash(meal.area.as_deref());
    println!("  Category: {category}");
    println!("  Area:     {area}");
    if let Some(youtube) = meal.youtube.as_deref().filter(|y| !y.is_empty()) {
        println!("  Video:    {youtube}");
    }
    if let Some(source) = meal.source.as_deref().filter(|s| !s.is_empty()) {
        println!("  Source:   {source}");
    }
    println!();

    let rows: Vec<LineRow> = meal
        .lines()
        .map(|(slot, line)| LineRow {
            slot: slot + 1,
            ingredient: line.ingredient.clone(),
            measure: line.measure.trim().to_string(),
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", Table::new(&rows).with(Style::rounded()));
        println!();
    }

    if let Some(instructions) = meal.instructions.as_deref().filter(|i| !i.is_empty()) {
        println!("{}", instructions.trim());
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
