pub mod jwt;
pub mod password;
pub mod middleware;

pub use jwt::*;
pub use password::*;
pub use middleware::*;
