use super::{UserEmail, UserName};

pub struct NewUser {
    pub name: UserName,
    pub email: UserEmail,
}

/// An address ready to be stored against an existing user.
#[derive(Debug)]
pub struct NewUserAddress {
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

impl NewUserAddress {
    /// Street and city are mandatory, the rest may be left blank.
    pub fn parse(
        street: String,
        city: String,
        province: String,
        postal_code: String,
        country: String,
    ) -> Result<Self, String> {
        if street.trim().is_empty() {
            return Err("street must not be blank.".into());
        }
        if city.trim().is_empty() {
            return Err("city must not be blank.".into());
        }
        Ok(Self {
            street: street.trim().to_string(),
            city: city.trim().to_string(),
            province: province.trim().to_string(),
            postal_code: postal_code.trim().to_uppercase(),
            country: country.trim().to_string(),
        })
    }
}
