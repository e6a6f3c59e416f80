pub mod food;
pub mod intent;
pub mod meal;
pub mod place;
pub mod weather;
