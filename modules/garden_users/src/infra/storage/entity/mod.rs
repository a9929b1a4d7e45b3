pub mod member;
pub mod profile;
