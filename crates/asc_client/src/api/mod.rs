pub(crate) mod apps_handler;
pub mod client;
pub(crate) mod codes_handler;
pub(crate) mod models;
pub(crate) mod offers_handler;
