mod notification;
mod token;
mod user;

pub use notification::*;
pub use token::*;
pub use user::*;
