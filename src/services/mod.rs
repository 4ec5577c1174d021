pub mod activities_api_service;
pub mod board_service;
pub mod board_view_service;
pub mod status_message_service;
pub mod visitor_service;
