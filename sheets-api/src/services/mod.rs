pub mod sheets_service;
