use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::api_connection::MeasureUnit;
use crate::food_catalog::{Nutrient, NutrientSnapshot};

pub const TOTAL_LABEL: &str = "-- Total";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedIngredient {
    pub food_id: String,
    pub measure: MeasureUnit,
    pub snapshot: NutrientSnapshot,
    pub quantity: f64,
}

impl SelectedIngredient {
    pub fn row(&self) -> NutritionRow {
        let q = self.quantity;
        NutritionRow {
            ingredient_label: self.snapshot.ingredient_label.clone(),
            measure: Some(self.measure),
            kcal: self.snapshot.calories_per_unit * q,
            carb: self.snapshot.nutrient_per_unit(Nutrient::Carb) * q,
            fat: self.snapshot.nutrient_per_unit(Nutrient::Fat) * q,
            protein: self.snapshot.nutrient_per_unit(Nutrient::Protein) * q,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRow {
    pub ingredient_label: String,
    /// `None` on the total row.
    pub measure: Option<MeasureUnit>,
    pub kcal: f64,
    pub carb: f64,
    pub fat: f64,
    pub protein: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl NutritionRow {
    fn zero(label: &str) -> Self {
        Self {
            ingredient_label: label.to_string(),
            measure: None,
            kcal: 0.0,
            carb: 0.0,
            fat: 0.0,
            protein: 0.0,
        }
    }

    /// Display form, rounded to 2 decimals. Never feed this back into sums.
    pub fn rounded(&self) -> Self {
        Self {
            ingredient_label: self.ingredient_label.clone(),
            measure: self.measure,
            kcal: round2(self.kcal),
            carb: round2(self.carb),
            fat: round2(self.fat),
            protein: round2(self.protein),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionTable {
    pub rows: Vec<NutritionRow>,
    pub total: NutritionRow,
}

impl NutritionTable {
    /// No ingredients; the caller picks the placeholder text.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for NutritionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingredient\tMeasure\tKCal\tCarb\tFat\tProtein")?;
        for row in self.rows.iter().chain(std::iter::once(&self.total)) {
            let r = row.rounded();
            let measure = r.measure.map_or("-", MeasureUnit::key);
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}\t{}",
                r.ingredient_label, measure, r.kcal, r.carb, r.fat, r.protein
            )?;
        }
        Ok(())
    }
}

/// Scales each ingredient by its quantity and sums the unrounded values.
pub fn compute_rows(ingredients: &[SelectedIngredient]) -> NutritionTable {
    let rows: Vec<NutritionRow> = ingredients.iter().map(SelectedIngredient::row).collect();
    let total = rows.iter().fold(NutritionRow::zero(TOTAL_LABEL), |mut acc, row| {
        acc.kcal += row.kcal;
        acc.carb += row.carb;
        acc.fat += row.fat;
        acc.protein += row.protein;
        acc
    });
    NutritionTable { rows, total }
}

/// Missing quantities count as 0; negative or non-finite ones are clamped to 0.
fn sanitize_quantity(quantity: Option<f64>) -> f64 {
    match quantity {
        Some(q) if q.is_finite() && q >= 0.0 => q,
        Some(q) => {
            warn!(quantity = q, "invalid ingredient quantity, using 0");
            0.0
        }
        None => 0.0,
    }
}

/// A session's ordered working list of ingredients.
#[derive(Debug, Clone)]
pub struct NutritionAggregator {
    ingredients: Vec<SelectedIngredient>,
    allow_duplicates: bool,
}

impl Default for NutritionAggregator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NutritionAggregator {
    pub fn new(allow_duplicates: bool) -> Self {
        Self {
            ingredients: Vec::new(),
            allow_duplicates,
        }
    }

    pub fn add_ingredient(
        &mut self,
        food_id: &str,
        snapshot: NutrientSnapshot,
        measure: MeasureUnit,
        quantity: Option<f64>,
    ) -> &[SelectedIngredient] {
        let quantity = sanitize_quantity(quantity);

        if !self.allow_duplicates {
            if let Some(existing) = self
                .ingredients
                .iter_mut()
                .find(|i| i.food_id == food_id && i.measure == measure)
            {
                existing.quantity += quantity;
                return &self.ingredients;
            }
        }

        self.ingredients.push(SelectedIngredient {
            food_id: food_id.to_string(),
            measure,
            snapshot,
            quantity,
        });
        &self.ingredients
    }

    /// Returns false if `index` is out of range.
    pub fn set_quantity(&mut self, index: usize, quantity: Option<f64>) -> bool {
        match self.ingredients.get_mut(index) {
            Some(ingredient) => {
                ingredient.quantity = sanitize_quantity(quantity);
                true
            }
            None => false,
        }
    }

    pub fn remove_ingredient(&mut self, index: usize) -> Option<SelectedIngredient> {
        if index < self.ingredients.len() {
            Some(self.ingredients.remove(index))
        } else {
            None
        }
    }

    pub fn ingredients(&self) -> &[SelectedIngredient] {
        &self.ingredients
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    pub fn table(&self) -> NutritionTable {
        compute_rows(&self.ingredients)
    }
}
