//! Database repositories.

pub mod message;
pub mod message_like;
pub mod subscription;
pub mod user;

pub use message::MessageRepository;
pub use message_like::MessageLikeRepository;
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;
