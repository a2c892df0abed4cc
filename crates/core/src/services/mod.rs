//! Business logic services.

#![allow(missing_docs)]

pub mod authorization;
pub mod comment;
pub mod email;
pub mod feed;
pub mod like;
pub mod media;
pub mod password_reset;
pub mod post;
pub mod user;

pub use authorization::{Action, Actor, Decision, DenyReason, can_author, can_mutate};
pub use comment::{CommentInput, CommentService, CommentView};
pub use email::{EmailMessage, LogMailer, Mailer, MailerRef, MemoryMailer, SmtpMailer, mailer_from_config};
pub use feed::{FeedService, Page, UserFeed};
pub use like::{LikeService, LikeState};
pub use media::{ImageStore, ImageStoreRef, LocalImageStore};
pub use password_reset::{PasswordResetService, ResetPasswordInput, ResetRequestInput};
pub use post::{PostDetail, PostInput, PostService, PostView};
pub use user::{ProfilePicture, RegisterInput, UpdateProfileInput, UserService, UserSummary};
