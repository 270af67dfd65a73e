//! Data models for wf

mod account;
mod collection;
mod post;
mod preferences;
mod remote_post;

pub use account::{Account, AccountSession};
pub use collection::Collection;
pub use post::{
    detect_locale, is_rtl_language, Post, PostContent, PostEdit, PostFont, PostId, PostLocale,
    PostStatus,
};
pub use preferences::Preferences;
pub use remote_post::RemotePost;
