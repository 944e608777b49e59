pub mod db;
pub mod lookup;
pub mod models;
pub mod service;
pub mod store;
pub mod themealdb;
