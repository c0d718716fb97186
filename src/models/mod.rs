pub mod answer;
pub mod notification;
pub mod question;
pub mod question_flag;
pub mod question_tag;
pub mod user;
pub mod vote;

// Re-export entities for convenience
pub mod prelude {
    pub use super::answer::{self, Entity as Answer};
    pub use super::notification::{self, Entity as Notification};
    pub use super::question::{self, Entity as Question};
    pub use super::question_flag::{self, Entity as QuestionFlag};
    pub use super::question_tag::{self, Entity as QuestionTag};
    pub use super::user::{self, Entity as User};
    pub use super::vote::{self, Entity as Vote};
}
