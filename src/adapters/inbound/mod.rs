mod http_server;

pub use http_server::{AppError, HealthResponse, HttpServer, HttpState, KILL_EXIT_CODE};
