pub mod api_connection;
pub mod cli;
pub mod config;
pub mod food_catalog;
pub mod nutrition_aggregator;
pub mod recipe_session;
pub mod request_cache;
