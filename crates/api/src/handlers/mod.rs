pub mod connections;
pub mod cron;
