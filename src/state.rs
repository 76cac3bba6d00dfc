use std::sync::Arc;

use crate::{
    config::Config,
    daily::DailyWord,
    database::{RedisCounterStore, init_redis},
    limiter::RateLimiter,
    search::{MeiliRepository, init_meilisearch},
};

/// Handles built once at startup and shared by every request.
pub struct AppState {
    pub config: Config,
    pub repository: MeiliRepository,
    pub limiter: RateLimiter<RedisCounterStore>,
    pub daily: DailyWord<RedisCounterStore, MeiliRepository>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub async fn new() -> SharedState {
        let config = Config::load();

        let store = RedisCounterStore::new(init_redis(&config.redis_url).await);
        let meili_client = init_meilisearch(&config.meili_url, &config.meili_key).await;
        let repository = MeiliRepository::new(meili_client);

        Arc::new(Self {
            limiter: RateLimiter::new(store.clone()),
            daily: DailyWord::new(store, repository.clone()),
            repository,
            config,
        })
    }
}
