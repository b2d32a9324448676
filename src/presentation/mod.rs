// Presentation layer - Output formats for the batch front end
pub mod report;
