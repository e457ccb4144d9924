//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod attachment;
pub mod captcha;
pub mod like;
pub mod mailer;
pub mod message;
pub mod subscription;

pub use account::{AccountService, RegisterInput, UpdateProfileInput, hash_password, verify_password};
pub use attachment::{AttachmentService, FileUpload};
pub use captcha::{CaptchaService, CaptchaVerifier, NoOpCaptcha, RecaptchaVerifier};
pub use like::{LikeService, LikeState};
pub use mailer::Mailer;
pub use message::{
    AuthorFeed, CreateMessageInput, DEFAULT_PAGE_SIZE, MessageService, MessageSummary, Page,
    PageRequest, UpdateMessageInput, UpdateOutcome,
};
pub use subscription::SubscriptionService;
