pub mod cell;
pub mod config;
pub mod field_map;
pub mod http_client;
pub mod standings;
pub mod store;
pub mod sync;
pub mod table_select;
