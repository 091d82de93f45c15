pub mod roast_controller;
pub mod roast_service;
