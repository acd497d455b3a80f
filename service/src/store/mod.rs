// wallet_flow_service/src/store/mod.rs

pub mod postgres;

pub use postgres::PgLedgerStore;
