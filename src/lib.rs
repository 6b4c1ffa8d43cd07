// Library for tests to access modules

pub mod config;
pub mod correlation;
pub mod error;
mod http;
pub mod instana_repo;
pub mod jenkins_repo;
pub mod models;
pub mod version;
