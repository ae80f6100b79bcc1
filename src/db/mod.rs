pub mod catalog;
pub mod mongo;
pub mod variant_repository;
