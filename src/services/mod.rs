pub mod filter_pipeline;
pub mod location_resolver;
pub mod places_aggregator;
