//! Route paths served by the API.

pub const GET_API_HEALTH: &str = "/api/health";
pub const API_CHAT: &str = "/api/chat";
