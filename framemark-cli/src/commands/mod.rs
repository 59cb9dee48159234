pub mod embed;
pub mod extract;
pub mod fingerprint;
pub mod info;
pub mod verify;
