// wallet_flow_service/src/web/handlers/mod.rs

pub mod fulfillment_handlers;
