pub mod category;
pub mod preferences;
pub mod recommendations;
pub mod scoring;
pub mod similar;
pub mod tags;
pub mod trending;

pub use recommendations::RecommendationService;
