pub mod image;
pub mod jwt;
pub mod password;
pub mod short_link;
