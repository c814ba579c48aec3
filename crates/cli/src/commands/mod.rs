pub mod init;
pub mod ls;
pub mod report;
pub mod run;
