// Domain layer - Value types shared by the analysis engines
pub mod dashboard;
pub mod telemetry;
pub mod wind;
