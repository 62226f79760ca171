// Application layer - Use cases and the ports they depend on
pub mod monitoring_repository;
pub mod narrative_generator;
pub mod prompt;
pub mod report_service;
