pub mod app_config;
pub mod database;
pub mod repository;
pub mod user_repo;
pub mod booking_repo;
pub mod esim_repo;
pub mod train_repo;
pub mod redis_repo;
pub mod memory;

pub use database::DbClient;
pub use redis_repo::RedisClient;
pub use repository::{BookingRepository, EsimRepository, SessionStore, TrainRepository, UserRepository};
pub use train_repo::TimetableTrainRepository;
