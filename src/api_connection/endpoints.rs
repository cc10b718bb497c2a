use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::connection::FoodDataError;

pub const DEFAULT_BASE_URL: &str = "https://api.edamam.com";
pub const PARSER_PATH: &str = "/api/food-database/v2/parser";
pub const NUTRIENTS_PATH: &str = "/api/food-database/v2/nutrients";
pub const NUTRITION_TYPE: &str = "cooking";

// Nutrient codes in `totalNutrients`
pub const CARB_CODE: &str = "CHOCDF";
pub const FAT_CODE: &str = "FAT";
pub const PROTEIN_CODE: &str = "PROCNT";

const MEASURE_URI_PREFIX: &str = "http://www.edamam.com/ontologies/edamam.owl#Measure_";

/// Unit in which an ingredient quantity is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasureUnit {
    #[serde(rename = "gram")]
    Gram,
    #[serde(rename = "ml")]
    Milliliter,
    #[serde(rename = "tbsp")]
    Tablespoon,
    #[serde(rename = "tsp")]
    Teaspoon,
    #[serde(rename = "serving")]
    Serving,
    #[serde(rename = "unit")]
    Unit,
}

impl MeasureUnit {
    /// Every unit, in the order the measure picker lists them.
    pub const ALL: [MeasureUnit; 6] = [
        MeasureUnit::Gram,
        MeasureUnit::Milliliter,
        MeasureUnit::Tablespoon,
        MeasureUnit::Teaspoon,
        MeasureUnit::Serving,
        MeasureUnit::Unit,
    ];

    /// Short key shown to the user.
    pub fn key(self) -> &'static str {
        match self {
            MeasureUnit::Gram => "gram",
            MeasureUnit::Milliliter => "ml",
            MeasureUnit::Tablespoon => "tbsp",
            MeasureUnit::Teaspoon => "tsp",
            MeasureUnit::Serving => "serving",
            MeasureUnit::Unit => "unit",
        }
    }

    /// Canonical measure URI expected by the nutrients endpoint.
    /// `Serving` and `Unit` share one URI.
    pub fn measure_uri(self) -> String {
        let suffix = match self {
            MeasureUnit::Gram => "gram",
            MeasureUnit::Milliliter => "milliliter",
            MeasureUnit::Tablespoon => "tablespoon",
            MeasureUnit::Teaspoon => "teaspoon",
            MeasureUnit::Serving | MeasureUnit::Unit => "serving",
        };
        format!("{}{}", MEASURE_URI_PREFIX, suffix)
    }
}

impl fmt::Display for MeasureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MeasureUnit {
    type Err = FoodDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gram" | "g" => Ok(MeasureUnit::Gram),
            "ml" | "milliliter" => Ok(MeasureUnit::Milliliter),
            "tbsp" | "tablespoon" => Ok(MeasureUnit::Tablespoon),
            "tsp" | "teaspoon" => Ok(MeasureUnit::Teaspoon),
            "serving" => Ok(MeasureUnit::Serving),
            "unit" => Ok(MeasureUnit::Unit),
            _ => Err(FoodDataError::UnknownMeasure(s.to_string())),
        }
    }
}

// ---- parser endpoint ----

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ParserResponse {
    #[serde(default)]
    pub parsed: Vec<ParserMatch>,
    #[serde(default)]
    pub hints: Vec<ParserMatch>,
}

/// Both `parsed` and `hints` entries wrap a `food` object.
#[derive(Debug, Deserialize, Clone)]
pub struct ParserMatch {
    pub food: FoodRef,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FoodRef {
    #[serde(rename = "foodId")]
    pub food_id: String,
    pub label: String,
}

// ---- nutrients endpoint ----

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NutrientsRequest {
    pub ingredients: Vec<NutrientsRequestIngredient>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NutrientsRequestIngredient {
    pub quantity: f64,
    #[serde(rename = "measureURI")]
    pub measure_uri: String,
    #[serde(rename = "foodId")]
    pub food_id: String,
}

impl NutrientsRequest {
    pub fn single(food_id: &str, quantity: f64, measure: MeasureUnit) -> Self {
        Self {
            ingredients: vec![NutrientsRequestIngredient {
                quantity,
                measure_uri: measure.measure_uri(),
                food_id: food_id.to_string(),
            }],
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NutrientsResponse {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(rename = "totalNutrients", default)]
    pub total_nutrients: HashMap<String, NutrientAmount>,
    #[serde(default)]
    pub ingredients: Vec<NutrientsResponseIngredient>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NutrientAmount {
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NutrientsResponseIngredient {
    #[serde(default)]
    pub parsed: Vec<ParsedIngredientLine>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ParsedIngredientLine {
    #[serde(default)]
    pub food: Option<String>,
}

impl NutrientsResponse {
    pub fn nutrient(&self, code: &str) -> Option<f64> {
        self.total_nutrients.get(code).map(|amount| amount.quantity)
    }

    /// `ingredients[0].parsed[0].food`, if the upstream resolved the ingredient.
    pub fn ingredient_label(&self) -> Option<&str> {
        self.ingredients
            .first()
            .and_then(|ingredient| ingredient.parsed.first())
            .and_then(|line| line.food.as_deref())
            .filter(|label| !label.trim().is_empty())
    }
}
