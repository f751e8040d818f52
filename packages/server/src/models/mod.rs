pub mod comment;
pub mod health;
pub mod like;
pub mod playlist;
pub mod shared;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;
