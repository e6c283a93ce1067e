//! Stored rows and the shapes the API hands out.
//!
//! The mapping between them is spelled out field by field, so a column
//! that is added or renamed shows up as a compile error here.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserAddressRow {
    pub id: i64,
    pub user_id: i64,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub addresses: Vec<UserAddress>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct UserAddress {
    pub id: i64,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

impl From<UserAddressRow> for UserAddress {
    fn from(row: UserAddressRow) -> Self {
        Self {
            id: row.id,
            street: row.street,
            city: row.city,
            province: row.province,
            postal_code: row.postal_code,
            country: row.country,
        }
    }
}

impl User {
    /// Addresses belonging to other users are dropped.
    pub fn from_rows(row: UserRow, addresses: Vec<UserAddressRow>) -> Self {
        let addresses = addresses
            .into_iter()
            .filter(|address| address.user_id == row.id)
            .map(UserAddress::from)
            .collect();

        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            addresses,
        }
    }
}
