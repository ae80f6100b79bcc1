pub mod catalog_service;
pub mod comparison_service;
pub mod hotel_mapping_service;
pub mod normalizer;
pub mod pricing_service;
pub mod seasonal_pricing_service;
pub mod variant_service;
