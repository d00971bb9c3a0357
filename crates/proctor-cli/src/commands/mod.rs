pub mod init;
pub mod preview;
pub mod rehearse;
pub mod validate;
