// Application layer - Analysis engines and use cases
pub mod aggregation;
pub mod dashboard_service;
pub mod interpolation;
pub mod smoothing;
pub mod wind_rose;
