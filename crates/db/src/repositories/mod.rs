pub mod connection_repo;

pub use connection_repo::ConnectionRepo;
