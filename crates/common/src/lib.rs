pub mod types;

pub use types::RatingId;
