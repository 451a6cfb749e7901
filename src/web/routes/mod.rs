pub mod check_routes;
pub mod monitor_routes;
pub mod user_routes;
