pub mod application;
pub mod career;
pub mod certificate;
pub mod client;
pub mod company;
pub mod contact;
pub mod project;
pub mod user;
