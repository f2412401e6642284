use serde::{de::value::StrDeserializer, de::DeserializeOwned, de::IntoDeserializer, Deserialize};

use super::model::{ArtisanFilter, ArtisanSort, City, Profession};
use crate::validation::ValidationError;

/// Body of `PUT /users/profile`. Derived reputation fields are not part of it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub experience: Option<i32>,
    pub hourly_rate: Option<f64>,
    pub profession: Option<Profession>,
    pub city: Option<City>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

/// Query string of `GET /artisans`. `all` or empty means no filter.
#[derive(Debug, Default, Deserialize)]
pub struct ArtisanQuery {
    pub profession: Option<String>,
    pub city: Option<String>,
    pub sort: Option<String>,
}

fn parse_choice<T: DeserializeOwned>(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => {
            let de: StrDeserializer<'_, serde::de::value::Error> = value.into_deserializer();
            T::deserialize(de)
                .map(Some)
                .map_err(|_| ValidationError::new(field, format!("unknown value '{value}'")))
        }
    }
}

impl ArtisanQuery {
    pub fn into_filter(self) -> Result<ArtisanFilter, ValidationError> {
        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => ArtisanSort::default(),
            Some(raw) => ArtisanSort::parse(raw)
                .ok_or_else(|| ValidationError::new("sort", format!("unknown sort '{raw}'")))?,
        };
        Ok(ArtisanFilter {
            profession: parse_choice("profession", self.profession.as_deref())?,
            city: parse_choice("city", self.city.as_deref())?,
            sort,
        })
    }
}
