pub mod checkout_controller;
pub mod checkout_service;
