pub mod auth;

pub use auth::{AdminUser, MemberUser, OptionalAdmin, OptionalMember};
