use crate::user::{self, User};

const MAIL_DOMAIN: &str = "mail.test";

/// An outbound birthday greeting. Derived fresh from a user snapshot each
/// time the user is found eligible; never persisted.
#[derive(Debug, Clone)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// The user the greeting was derived from, for the eligibility re-check
    /// at send time.
    pub user_id: user::Id,
}

impl Message {
    pub fn birthday(user: &User) -> Self {
        Self {
            to: format!(
                "{}.{}@{}",
                mailbox_part(&user.first_name),
                mailbox_part(&user.last_name),
                MAIL_DOMAIN
            ),
            subject: format!("Happy birthday, {}!", user.first_name),
            body: format!(
                "Hey, {} {} it's your birthday!",
                user.first_name, user.last_name
            ),
            user_id: user.id,
        }
    }
}

fn mailbox_part(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(char::is_ascii_lowercase)
        .collect()
}
