pub mod friend_repository;
pub mod guild_repository;
pub mod leaderboard_repository;
pub mod message_repository;
pub mod user_repository;

pub use friend_repository::FriendRepository;
pub use guild_repository::GuildRepository;
pub use leaderboard_repository::LeaderboardRepository;
pub use message_repository::MessageRepository;
pub use user_repository::UserRepository;
