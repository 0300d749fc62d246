use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(pub i64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    /// Calendar date of birth; the year is ignored by the emailer.
    pub birthdate: NaiveDate,
    /// A timezone identifier from the [`ZoneTable`](crate::zones::ZoneTable).
    /// Validated at the API boundary.
    pub location: String,
}

/// A user before the store has assigned an id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub location: String,
}

impl NewUser {
    pub fn into_user(self, id: Id) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            birthdate: self.birthdate,
            location: self.location,
        }
    }
}
