pub mod connection;
pub mod endpoints;

pub use connection::{Connection, FoodDataError};
pub use endpoints::MeasureUnit;
