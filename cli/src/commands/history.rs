use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealcache_core::service::MealApi;

use super::helpers::{exit_no_results, print_json, truncate};

pub(crate) fn cmd_popular(api: &MealApi, limit: usize, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct PopularRow {
        #[tabled(rename = "Keyword")]
        keyword: String,
        #[tabled(rename = "Type")]
        search_type: String,
        #[tabled(rename = "Searches")]
        count: i64,
    }

    let searches = api.popular_searches(limit);
    if searches.is_empty() {
        exit_no_results(json, "[]", "No searches recorded yet");
    }

    if json {
        return print_json(&searches);
    }

    let rows: Vec<PopularRow> = searches
        .into_iter()
        .map(|s| PopularRow {
            keyword: truncate(&s.keyword, 40),
            search_type: s.search_type,
            count: s.count,
        })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_similar(api: &MealApi, keyword: &str, json: bool) -> Result<()> {
    let searches = api.similar_searches(keyword);
    if searches.is_empty() {
        exit_no_results(json, "[]", &format!("No past searches like '{keyword}'"));
    }

    if json {
        return print_json(&searches);
    }
    for s in &searches {
        let keyword = &s.keyword;
        let count = s.count;
        println!("{keyword} ({count})");
    }
    Ok(())
}

pub(crate) fn cmd_requests(api: &MealApi, limit: usize, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct RequestRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "When")]
        requested_at: String,
        #[tabled(rename = "Endpoint")]
        endpoint: String,
        #[tabled(rename = "Source")]
        request_type: String,
        #[tabled(rename = "Params")]
        parameters: String,
        #[tabled(rename = "Status")]
        status_code: i64,
    }

    let requests = api.recent_api_requests(limit);
    if requests.is_empty() {
        exit_no_results(json, "[]", "No requests logged yet");
    }

    if json {
        return print_json(&requests);
    }

    let rows: Vec<RequestRow> = requests
        .into_iter()
        .map(|r| RequestRow {
            id: r.id,
            requested_at: r.requested_at,
            endpoint: r.endpoint,
            request_type: r.request_type,
            parameters: truncate(&r.parameters, 30),
            status_code: r.status_code,
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}
