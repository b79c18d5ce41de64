// store

mod session_store;

pub use session_store::*;

// repo

mod user_repo;

pub use user_repo::*;
