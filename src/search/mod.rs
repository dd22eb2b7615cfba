pub mod github;
pub mod web;
