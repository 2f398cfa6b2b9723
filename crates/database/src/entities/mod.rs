pub mod friend;
pub mod guild;
pub mod leaderboard;
pub mod message;
pub mod user;
