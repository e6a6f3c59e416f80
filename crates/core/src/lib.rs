pub mod config;
pub mod domain;
pub mod errors;
pub mod format;
pub mod heuristics;
pub mod spin;

pub use domain::food::{FoodQuery, TravelFilters, TravelMode};
pub use domain::intent::{GuildId, Intent};
pub use domain::meal::{MealPeriod, MealSource};
pub use domain::place::{Coordinates, PlaceCandidate, PlaceDetails, PlaceStub, Review};
pub use domain::weather::WeatherSnapshot;
pub use errors::{ApplicationError, GatewayError, GatewayErrorKind, InterfaceError, Provider};
pub use spin::SpinSource;
