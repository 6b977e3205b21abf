pub mod activity;
pub mod catalog;
pub mod comparison;
pub mod datasets;
pub mod evaluation;
pub mod health;
pub mod settings;
