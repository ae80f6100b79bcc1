pub mod catalog;
pub mod comparison;
pub mod pricing;
pub mod raw;
pub mod variant;
