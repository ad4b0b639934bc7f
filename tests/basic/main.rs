#[path = "../common/mod.rs"]
mod common;

mod db_connection_test;
mod store_test;
