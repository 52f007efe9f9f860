pub mod id;
pub mod models;
pub mod poller;
pub mod reducer;
pub mod store;
