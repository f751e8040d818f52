mod common;

mod auth;
mod comment;
mod like;
mod playlist;
mod video;
