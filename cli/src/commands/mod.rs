mod browse;
mod helpers;
mod history;
mod meals;

pub(crate) use browse::{cmd_areas, cmd_categories, cmd_ingredients};
pub(crate) use history::{cmd_popular, cmd_requests, cmd_similar};
pub(crate) use meals::{Filter, cmd_filter, cmd_latest, cmd_random, cmd_search, cmd_show};
