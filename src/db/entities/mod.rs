//! SeaORM entities mapping the service tables.

pub mod check;
pub mod monitor;
pub mod request_log;
pub mod user;

// Prelude module for easy importing of all entities and their related types
pub mod prelude {
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;

    pub use super::monitor::ActiveModel as MonitorActiveModel;
    pub use super::monitor::Column as MonitorColumn;
    pub use super::monitor::Entity as Monitor;
    pub use super::monitor::Model as MonitorModel;

    pub use super::check::ActiveModel as CheckActiveModel;
    pub use super::check::Column as CheckColumn;
    pub use super::check::Entity as Check;
    pub use super::check::Model as CheckModel;

    pub use super::request_log::ActiveModel as RequestLogActiveModel;
    pub use super::request_log::Column as RequestLogColumn;
    pub use super::request_log::Entity as RequestLog;
    pub use super::request_log::Model as RequestLogModel;
}
