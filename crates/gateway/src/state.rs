//! Shared handler state: the chat service plus the social repositories.

use sqlx::SqlitePool;

use guildhall_chat::{ChatService, SqliteMembershipStore};
use guildhall_config::ChatConfig;
use guildhall_database::{
    FriendRepository, GuildRepository, LeaderboardRepository, MessageRepository, UserRepository,
};

#[derive(Clone)]
pub struct GatewayState {
    pub chat: ChatService<SqliteMembershipStore>,
    pub users: UserRepository,
    pub guilds: GuildRepository,
    pub friends: FriendRepository,
    pub leaderboard: LeaderboardRepository,
    pub connection_buffer: usize,
}

impl GatewayState {
    pub fn new(pool: SqlitePool, chat_config: &ChatConfig) -> Self {
        let chat = ChatService::new(
            SqliteMembershipStore::new(pool.clone()),
            MessageRepository::new(pool.clone(), chat_config.history_page_size),
        );

        Self {
            chat,
            users: UserRepository::new(pool.clone()),
            guilds: GuildRepository::new(pool.clone()),
            friends: FriendRepository::new(pool.clone()),
            leaderboard: LeaderboardRepository::new(pool),
            connection_buffer: chat_config.connection_buffer,
        }
    }
}
