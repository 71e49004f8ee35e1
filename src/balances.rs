pub(crate) mod errors;
pub(crate) mod handler;
pub(crate) mod manager;
pub(crate) mod monitor;
pub(crate) mod providers;
pub(crate) mod traits;
pub(crate) mod types;
