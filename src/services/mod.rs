/// Account registration, lookup, profile updates and search.
pub mod account_service;
/// Password hashing and strength policy.
pub mod credentials;
/// OpenAPI documentation generation.
pub mod documentation;
/// Friend requests and friend lists.
pub mod friendship_service;
/// Health check service.
pub mod health_service;
/// Per-game leaderboard.
pub mod leaderboard_service;
/// Outcome and counter deltas of a finished match.
pub mod match_tally;
/// Login, logout, guest login and session resolution.
pub mod session_service;
/// Per-game player statistics and match history.
pub mod stats_service;
/// Storage connection supervisor driving degraded mode.
pub mod storage_supervisor;
