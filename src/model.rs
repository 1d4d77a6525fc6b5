use crate::schema::{cats, cats_toys, feedings, photos, sessions, toys, users};
use chrono::{NaiveDate, NaiveDateTime};
use derive_more::Display;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use diesel::{prelude::Insertable, AsChangeset, Identifiable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub token: String,
    pub user_id: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = cats)]
pub struct Cat {
    pub id: i32,
    pub name: String,
    pub breed: String,
    pub description: String,
    pub age: i32,
    pub user_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = cats)]
pub struct NewCat {
    pub name: String,
    pub breed: String,
    pub description: String,
    pub age: i32,
    pub user_id: i32,
}

/// Fields a user may set on a cat. The owner is never taken from input.
#[derive(Deserialize, Validate, AsChangeset, Debug, Clone)]
#[diesel(table_name = cats)]
pub struct CatForm {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub breed: String,
    #[validate(length(max = 250))]
    pub description: String,
    #[validate(range(min = 0))]
    pub age: i32,
}

impl CatForm {
    pub fn into_new_cat(self, owner_id: i32) -> NewCat {
        NewCat {
            name: self.name,
            breed: self.breed,
            description: self.description,
            age: self.age,
            user_id: owner_id,
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = toys)]
pub struct Toy {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub user_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = toys)]
pub struct NewToy {
    pub name: String,
    pub color: String,
    pub user_id: i32,
}

#[derive(Deserialize, Validate, AsChangeset, Debug, Clone)]
#[diesel(table_name = toys)]
pub struct ToyForm {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(min = 1, max = 20))]
    pub color: String,
}

impl ToyForm {
    pub fn into_new_toy(self, owner_id: i32) -> NewToy {
        NewToy {
            name: self.name,
            color: self.color,
            user_id: owner_id,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = cats_toys)]
pub struct NewCatToy {
    pub cat_id: i32,
    pub toy_id: i32,
}

#[derive(Debug, Display, PartialEq)]
#[display(fmt = "unknown meal code `{}`", _0)]
pub struct UnknownMeal(String);

impl std::error::Error for UnknownMeal {}

/// Meal slot of a feeding, stored as its one-letter code.
#[derive(AsExpression, FromSqlRow, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[diesel(sql_type = Text)]
pub enum Meal {
    #[default]
    #[serde(rename = "B")]
    Breakfast,
    #[serde(rename = "L")]
    Lunch,
    #[serde(rename = "D")]
    Dinner,
}

impl Meal {
    pub const ALL: [Meal; 3] = [Meal::Breakfast, Meal::Lunch, Meal::Dinner];

    pub fn code(self) -> &'static str {
        match self {
            Meal::Breakfast => "B",
            Meal::Lunch => "L",
            Meal::Dinner => "D",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Meal::Breakfast => "Breakfast",
            Meal::Lunch => "Lunch",
            Meal::Dinner => "Dinner",
        }
    }
}

impl FromStr for Meal {
    type Err = UnknownMeal;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Meal::ALL
            .into_iter()
            .find(|meal| meal.code() == code)
            .ok_or_else(|| UnknownMeal(code.to_string()))
    }
}

impl ToSql<Text, Sqlite> for Meal {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.code());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Meal {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let code = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(code.parse::<Meal>()?)
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = feedings)]
pub struct Feeding {
    pub id: i32,
    pub date: NaiveDate,
    pub meal: Meal,
    pub cat_id: i32,
}

impl fmt::Display for Feeding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.meal.label(), self.date)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = feedings)]
pub struct NewFeeding {
    pub date: NaiveDate,
    pub meal: Meal,
    pub cat_id: i32,
}

#[derive(Debug, Display, PartialEq)]
pub enum FeedingFormError {
    #[display(fmt = "feeding date is required")]
    MissingDate,
    #[display(fmt = "feeding date `{}` is not a YYYY-MM-DD date", _0)]
    InvalidDate(String),
    #[display(fmt = "meal is required")]
    MissingMeal,
    #[display(fmt = "{}", _0)]
    InvalidMeal(UnknownMeal),
    #[display(fmt = "feeding form could not be read")]
    Unreadable,
}

/// Raw feeding submission. Kept as strings so that a bad value reaches the
/// handler instead of failing extraction.
#[derive(Deserialize, Debug, Default)]
pub struct FeedingForm {
    pub date: Option<String>,
    pub meal: Option<String>,
}

impl FeedingForm {
    pub fn parse(&self, cat_id: i32) -> Result<NewFeeding, FeedingFormError> {
        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => return Err(FeedingFormError::MissingDate),
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| FeedingFormError::InvalidDate(raw.to_string()))?,
        };
        let meal = match self.meal.as_deref().map(str::trim) {
            None | Some("") => return Err(FeedingFormError::MissingMeal),
            Some(code) => code.parse().map_err(FeedingFormError::InvalidMeal)?,
        };
        Ok(NewFeeding { date, meal, cat_id })
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = photos)]
pub struct Photo {
    pub id: i32,
    pub url: String,
    pub cat_id: i32,
}

impl fmt::Display for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Photo for cat_id: {} @{}", self.cat_id, self.url)
    }
}

#[derive(Insertable, Validate, Debug)]
#[diesel(table_name = photos)]
pub struct NewPhoto {
    #[validate(length(min = 1, max = 200))]
    pub url: String,
    pub cat_id: i32,
}

#[derive(Deserialize, Validate, Debug, Default)]
#[serde(default)]
pub struct SignupForm {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    pub password1: String,
    pub password2: String,
}

impl SignupForm {
    /// Password and username rules applied on top of the field lengths.
    pub fn check(&self) -> bool {
        let username_ok = self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c));
        let password_ok = self.password1 == self.password2
            && self.password1.chars().count() >= 8
            && !self.password1.chars().all(|c| c.is_ascii_digit())
            && !self.password1.eq_ignore_ascii_case(&self.username);

        self.validate().is_ok() && username_ok && password_ok
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_codes_parse_and_label() {
        assert_eq!("L".parse::<Meal>().unwrap(), Meal::Lunch);
        assert_eq!(Meal::default(), Meal::Breakfast);
        assert_eq!(Meal::Dinner.label(), "Dinner");
        assert!("X".parse::<Meal>().is_err());
    }

    #[test]
    fn feeding_form_rejects_bad_input() {
        let form = FeedingForm {
            date: Some("2024-02-30".into()),
            meal: Some("B".into()),
        };
        assert_eq!(
            form.parse(1).unwrap_err(),
            FeedingFormError::InvalidDate("2024-02-30".into())
        );

        let form = FeedingForm {
            date: Some("2024-02-01".into()),
            meal: Some("Z".into()),
        };
        assert!(matches!(
            form.parse(1),
            Err(FeedingFormError::InvalidMeal(_))
        ));

        assert_eq!(
            FeedingForm::default().parse(1).unwrap_err(),
            FeedingFormError::MissingDate
        );
    }

    #[test]
    fn feeding_display_uses_meal_label() {
        let feeding = Feeding {
            id: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            meal: Meal::Dinner,
            cat_id: 1,
        };
        assert_eq!(feeding.to_string(), "Dinner on 2024-03-09");
    }

    #[test]
    fn signup_form_password_rules() {
        let form = |username: &str, p1: &str, p2: &str| SignupForm {
            username: username.into(),
            password1: p1.into(),
            password2: p2.into(),
        };
        assert!(form("tabby", "whiskers42", "whiskers42").check());
        assert!(!form("tabby", "whiskers42", "whiskers43").check());
        assert!(!form("tabby", "short", "short").check());
        assert!(!form("tabby", "12345678", "12345678").check());
        assert!(!form("tabbycat1", "tabbycat1", "tabbycat1").check());
        assert!(!form("bad name", "whiskers42", "whiskers42").check());
        assert!(!form("", "whiskers42", "whiskers42").check());
    }

    #[test]
    fn cat_form_limits_description() {
        let form = CatForm {
            name: "Felix".into(),
            breed: "Tabby".into(),
            description: "x".repeat(251),
            age: 3,
        };
        assert!(form.validate().is_err());
    }
}
