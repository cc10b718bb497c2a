use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api_connection::endpoints::{
    NutrientsRequest, NutrientsResponse, ParserResponse, CARB_CODE, FAT_CODE, NUTRIENTS_PATH,
    NUTRITION_TYPE, PARSER_PATH, PROTEIN_CODE,
};
use crate::api_connection::{Connection, FoodDataError, MeasureUnit};
use crate::config::FoodDataConfig;
use crate::request_cache::RequestCache;

/// How the upstream matched a candidate: an exact parse of the query, or a
/// looser hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Parsed,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCandidate {
    pub food_id: String,
    pub label: String,
    pub source: CandidateSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nutrient {
    Carb,
    Fat,
    Protein,
}

/// Per-unit nutrition for one food in one measure, before scaling by quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NutrientSnapshot {
    pub ingredient_label: String,
    pub calories_per_unit: f64,
    pub carb_per_unit: f64,
    pub fat_per_unit: f64,
    pub protein_per_unit: f64,
}

impl NutrientSnapshot {
    pub fn nutrient_per_unit(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Carb => self.carb_per_unit,
            Nutrient::Fat => self.fat_per_unit,
            Nutrient::Protein => self.protein_per_unit,
        }
    }

    /// Normalizes a nutrients response fetched for `quantity` units.
    /// Absent nutrient codes count as 0; an absent ingredient label is an error.
    pub fn from_response(
        response: &NutrientsResponse,
        quantity: f64,
    ) -> Result<Self, FoodDataError> {
        let ingredient_label = response.ingredient_label().ok_or_else(|| {
            FoodDataError::MalformedResponse(
                "missing ingredients[0].parsed[0].food label".to_string(),
            )
        })?;

        let per_unit = |value: Option<f64>| value.unwrap_or(0.0) / quantity;
        Ok(Self {
            ingredient_label: ingredient_label.to_string(),
            calories_per_unit: per_unit(response.calories),
            carb_per_unit: per_unit(response.nutrient(CARB_CODE)),
            fat_per_unit: per_unit(response.nutrient(FAT_CODE)),
            protein_per_unit: per_unit(response.nutrient(PROTEIN_CODE)),
        })
    }
}

/// Orders `parsed` matches before `hints`, keeping each list's order, and
/// keeps at most `max_results`.
pub fn candidates_from_response(response: ParserResponse, max_results: usize) -> Vec<FoodCandidate> {
    let parsed = response.parsed.into_iter().map(|m| (m, CandidateSource::Parsed));
    let hints = response.hints.into_iter().map(|m| (m, CandidateSource::Hint));
    parsed
        .chain(hints)
        .take(max_results)
        .map(|(m, source)| FoodCandidate {
            food_id: m.food.food_id,
            label: m.food.label,
            source,
        })
        .collect()
}

/// Single point of contact with the food-data service.
#[derive(Debug, Clone)]
pub struct FoodCatalogClient {
    connection: Connection,
    max_results: usize,
}

impl FoodCatalogClient {
    pub fn new(config: &FoodDataConfig) -> Self {
        let cache = Arc::new(RequestCache::from_capacity(config.cache_capacity));
        Self::with_cache(config, cache)
    }

    /// Uses an existing cache, so several clients can share responses.
    pub fn with_cache(config: &FoodDataConfig, cache: Arc<RequestCache>) -> Self {
        Self {
            connection: Connection::new(config, cache),
            max_results: config.max_results,
        }
    }

    pub fn cache(&self) -> &Arc<RequestCache> {
        self.connection.cache()
    }

    pub async fn search(&self, food_name: &str) -> Result<Vec<FoodCandidate>, FoodDataError> {
        self.search_limited(food_name, self.max_results).await
    }

    pub async fn search_limited(
        &self,
        food_name: &str,
        max_results: usize,
    ) -> Result<Vec<FoodCandidate>, FoodDataError> {
        let food_name = food_name.trim();
        if food_name.is_empty() {
            debug!("empty search term, skipping lookup");
            return Ok(Vec::new());
        }

        let body = self
            .connection
            .get_cached(
                PARSER_PATH,
                &[("ingr", food_name), ("nutrition-type", NUTRITION_TYPE)],
            )
            .await?;
        let response: ParserResponse = serde_json::from_str(&body)?;
        let candidates = candidates_from_response(response, max_results);
        info!(query = %food_name, found = candidates.len(), "food search complete");
        Ok(candidates)
    }

    pub async fn fetch_nutrients(
        &self,
        food_id: &str,
        quantity: f64,
        measure: MeasureUnit,
    ) -> Result<NutrientSnapshot, FoodDataError> {
        if food_id.trim().is_empty() {
            return Err(FoodDataError::InvalidRequest("food id is empty".to_string()));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(FoodDataError::InvalidRequest(format!(
                "fetch quantity must be positive, got {}",
                quantity
            )));
        }

        let request = NutrientsRequest::single(food_id, quantity, measure);
        let body = self.connection.post_cached(NUTRIENTS_PATH, &request).await?;
        let response: NutrientsResponse = serde_json::from_str(&body)?;
        let snapshot = NutrientSnapshot::from_response(&response, quantity)?;
        debug!(%food_id, %measure, label = %snapshot.ingredient_label, "nutrients fetched");
        Ok(snapshot)
    }

    /// Like [`fetch_nutrients`](Self::fetch_nutrients) with the measure given
    /// by its user-facing key; an unknown key fails before any request.
    pub async fn fetch_nutrients_named(
        &self,
        food_id: &str,
        quantity: f64,
        measure: &str,
    ) -> Result<NutrientSnapshot, FoodDataError> {
        let measure: MeasureUnit = measure.parse()?;
        self.fetch_nutrients(food_id, quantity, measure).await
    }
}
