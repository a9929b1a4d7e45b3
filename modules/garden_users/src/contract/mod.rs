pub mod client;
pub mod error;
pub mod model;

pub use client::GardenUsersApi;
pub use error::GardenUsersError;
pub use model::{Member, NewMember, NewProfile, Profile, ProfilePatch};
