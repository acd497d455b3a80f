// wallet_flow_service/src/services/mod.rs

pub mod admin_notifier;

pub use admin_notifier::AdminInboxNotifier;
