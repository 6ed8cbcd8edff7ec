pub mod cart_service;
pub mod catalog_service;
pub mod content_store;
pub mod download_service;
pub mod gateways;
pub mod order_service;
pub mod payment_service;
pub mod profile_service;
pub mod webhook_service;
