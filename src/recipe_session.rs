use tracing::info;

use crate::api_connection::{FoodDataError, MeasureUnit};
use crate::food_catalog::{FoodCandidate, FoodCatalogClient};
use crate::nutrition_aggregator::{NutritionAggregator, NutritionTable, SelectedIngredient};

pub const SEARCH_PLACEHOLDER: &str = "Search for an ingredient";
pub const NOT_FOUND_PLACEHOLDER: &str = "Ingredient not found";

/// One user's search → select → add flow. The client (and its cache) may be
/// shared; the working list belongs to this session only.
#[derive(Debug)]
pub struct RecipeSession<'a> {
    client: &'a FoodCatalogClient,
    aggregator: NutritionAggregator,
    candidates: Vec<FoodCandidate>,
}

impl<'a> RecipeSession<'a> {
    pub fn new(client: &'a FoodCatalogClient, allow_duplicates: bool) -> Self {
        Self {
            client,
            aggregator: NutritionAggregator::new(allow_duplicates),
            candidates: Vec::new(),
        }
    }

    /// Runs a search and remembers its candidates for the next `add_ingredient`.
    /// On failure the previous candidates are kept.
    pub async fn search(&mut self, food_name: &str) -> Result<&[FoodCandidate], FoodDataError> {
        let candidates = self.client.search(food_name).await?;
        self.candidates = candidates;
        Ok(&self.candidates)
    }

    pub fn candidates(&self) -> &[FoodCandidate] {
        &self.candidates
    }

    /// Label to pre-fill the selection control with.
    pub fn candidate_placeholder(&self) -> &str {
        self.candidates
            .first()
            .map(|c| c.label.as_str())
            .unwrap_or(NOT_FOUND_PLACEHOLDER)
    }

    /// Adds a food picked from the last search. The snapshot is fetched for
    /// one unit of `measure`; nothing is added if the fetch fails.
    pub async fn add_ingredient(
        &mut self,
        food_id: &str,
        quantity: Option<f64>,
        measure: &str,
    ) -> Result<NutritionTable, FoodDataError> {
        let measure: MeasureUnit = measure.parse()?;
        if !self.candidates.iter().any(|c| c.food_id == food_id) {
            return Err(FoodDataError::InvalidRequest(format!(
                "food id '{}' was not offered by the last search",
                food_id
            )));
        }

        let snapshot = self.client.fetch_nutrients(food_id, 1.0, measure).await?;
        info!(%food_id, label = %snapshot.ingredient_label, "ingredient added");
        self.aggregator
            .add_ingredient(food_id, snapshot, measure, quantity);
        Ok(self.aggregator.table())
    }

    pub fn set_quantity(&mut self, index: usize, quantity: Option<f64>) -> Option<NutritionTable> {
        self.aggregator
            .set_quantity(index, quantity)
            .then(|| self.aggregator.table())
    }

    pub fn remove_ingredient(&mut self, index: usize) -> Option<SelectedIngredient> {
        self.aggregator.remove_ingredient(index)
    }

    pub fn ingredients(&self) -> &[SelectedIngredient] {
        self.aggregator.ingredients()
    }

    pub fn table(&self) -> NutritionTable {
        self.aggregator.table()
    }

    /// Text to show instead of the table while nothing has been added.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.aggregator.is_empty().then_some(SEARCH_PLACEHOLDER)
    }
}
