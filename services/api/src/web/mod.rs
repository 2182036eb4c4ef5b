pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_admin;
pub use rest::{
    admin_report_handler, admin_reset_handler, checkin_handler, dashboard_handler,
    leaderboard_handler, register_handler,
};
