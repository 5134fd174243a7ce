// file: src/repository/mod.rs
// description: Repository enumeration and cloning module exports
// reference: Internal module structure

pub mod clone;
pub mod enumerator;
pub mod github;

pub use clone::{CloneProvider, GixCloneProvider};
pub use enumerator::{PageSource, RepositoryEnumerator};
pub use github::GithubClient;
