pub mod db;
pub mod monitoring;
pub mod server;
pub mod services;
pub mod version;
pub mod web;
