pub mod compare;
pub mod init;
pub mod list_models;
pub mod list_tasks;
pub mod run;
pub mod validate;
