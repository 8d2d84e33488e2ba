pub mod build;
pub mod completion;
pub mod fix;
pub mod impact;
pub mod init;
pub mod run;
pub mod serve;
