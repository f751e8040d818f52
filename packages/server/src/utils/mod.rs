pub mod cookies;
pub mod hash;
pub mod jwt;
pub mod object_id;
pub mod upload;
