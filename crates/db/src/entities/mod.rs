//! Database entities.

#![allow(missing_docs)]

pub mod message;
pub mod message_like;
pub mod subscription;
pub mod user;

pub use message::Entity as Message;
pub use message_like::Entity as MessageLike;
pub use subscription::Entity as Subscription;
pub use user::Entity as User;
