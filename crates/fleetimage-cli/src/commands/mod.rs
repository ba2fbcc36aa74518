pub mod init;
pub mod resolve;
pub mod run;
