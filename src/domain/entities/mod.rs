pub mod catalog;
pub mod lookup;
pub mod ordering;
pub mod page;
pub mod params;
pub mod query;
pub mod schema;
pub mod value;
