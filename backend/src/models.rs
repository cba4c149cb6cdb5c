use chrono::{DateTime, Utc};
use diesel::prelude::*;
use listing_schema::{
    Amenity, ApartmentDetails, CommercialDetails, LandDetails, Media, PropertySummary, PropertyType,
    PropertyTypeName, PropertyTypeRef, PurposeDetails, RentDetails, SellDetails, UnknownVariant,
    VillaDetails,
};
use std::str::FromStr;

use crate::repository::RepositoryError;
use crate::schema::{
    apartment_details, commercial_details, land_details, media, properties, property_types,
    rent_details, sell_details, users, villa_details,
};

/// Parses a stored enum column. A failure means the row was written by
/// something other than this service.
pub fn parse_stored<E>(value: &str) -> Result<E, RepositoryError>
where
    E: FromStr<Err = UnknownVariant>,
{
    value
        .parse::<E>()
        .map_err(|e| RepositoryError::Corrupt(e.to_string()))
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub struct NewUserRow {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = property_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PropertyTypeRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = property_types)]
pub struct NewPropertyTypeRow {
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = apartment_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApartmentDetailsRow {
    pub property_type_id: i64,
    pub subtype: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub furnished: bool,
    pub level: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = villa_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VillaDetailsRow {
    pub property_type_id: i64,
    pub subtype: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub furnished: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = commercial_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommercialDetailsRow {
    pub property_type_id: i64,
    pub subtype: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = land_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LandDetailsRow {
    pub property_type_id: i64,
    pub subtype: String,
}

/// The details row of one property type, whichever table it lives in.
#[derive(Debug, Clone)]
pub enum DetailsRow {
    Apartment(ApartmentDetailsRow),
    Villa(VillaDetailsRow),
    Commercial(CommercialDetailsRow),
    Land(LandDetailsRow),
}

impl DetailsRow {
    pub fn from_domain(property_type_id: i64, property_type: &PropertyType) -> Self {
        match property_type {
            PropertyType::Apartment { apartment_details: d } => DetailsRow::Apartment(ApartmentDetailsRow {
                property_type_id,
                subtype: d.subtype.to_string(),
                bedrooms: d.bedrooms,
                bathrooms: d.bathrooms,
                furnished: d.furnished,
                level: d.level,
            }),
            PropertyType::Villa { villa_details: d } => DetailsRow::Villa(VillaDetailsRow {
                property_type_id,
                subtype: d.subtype.to_string(),
                bedrooms: d.bedrooms,
                bathrooms: d.bathrooms,
                furnished: d.furnished,
            }),
            PropertyType::Commercial { commercial_details: d } => {
                DetailsRow::Commercial(CommercialDetailsRow {
                    property_type_id,
                    subtype: d.subtype.to_string(),
                })
            }
            PropertyType::Land { land_details: d } => DetailsRow::Land(LandDetailsRow {
                property_type_id,
                subtype: d.subtype.to_string(),
            }),
        }
    }

    pub fn into_domain(self) -> Result<PropertyType, RepositoryError> {
        Ok(match self {
            DetailsRow::Apartment(row) => PropertyType::Apartment {
                apartment_details: ApartmentDetails {
                    subtype: parse_stored(&row.subtype)?,
                    bedrooms: row.bedrooms,
                    bathrooms: row.bathrooms,
                    furnished: row.furnished,
                    level: row.level,
                },
            },
            DetailsRow::Villa(row) => PropertyType::Villa {
                villa_details: VillaDetails {
                    subtype: parse_stored(&row.subtype)?,
                    bedrooms: row.bedrooms,
                    bathrooms: row.bathrooms,
                    furnished: row.furnished,
                },
            },
            DetailsRow::Commercial(row) => PropertyType::Commercial {
                commercial_details: CommercialDetails {
                    subtype: parse_stored(&row.subtype)?,
                },
            },
            DetailsRow::Land(row) => PropertyType::Land {
                land_details: LandDetails {
                    subtype: parse_stored(&row.subtype)?,
                },
            },
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = properties)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PropertyRow {
    pub id: i64,
    pub slug: String,
    pub user_id: String,
    pub property_type_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_name: String,
    pub owner_phone: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub governorate: String,
    pub city: String,
    pub area: f64,
    pub amenities: Vec<String>,
    pub purpose: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = properties)]
pub struct NewPropertyRow {
    pub id: i64,
    pub slug: String,
    pub user_id: String,
    pub property_type_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_name: String,
    pub owner_phone: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub governorate: String,
    pub city: String,
    pub area: f64,
    pub amenities: Vec<String>,
    pub purpose: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sell_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SellDetailsRow {
    pub property_id: i64,
    pub payment_method: String,
    pub down_payment: Option<f64>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = rent_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RentDetailsRow {
    pub property_id: i64,
    pub rent_frequency: String,
    pub deposit: f64,
    pub insurance: f64,
}

/// The purpose-details row of one property.
#[derive(Debug, Clone)]
pub enum PurposeRow {
    Sell(SellDetailsRow),
    Rent(RentDetailsRow),
}

impl PurposeRow {
    pub fn from_domain(property_id: i64, purpose: &PurposeDetails) -> Self {
        match purpose {
            PurposeDetails::Sell { sell_details } => PurposeRow::Sell(SellDetailsRow {
                property_id,
                payment_method: sell_details.payment_method().to_string(),
                down_payment: sell_details.down_payment(),
            }),
            PurposeDetails::Rent { rent_details } => PurposeRow::Rent(RentDetailsRow {
                property_id,
                rent_frequency: rent_details.rent_frequency.to_string(),
                deposit: rent_details.deposit,
                insurance: rent_details.insurance,
            }),
        }
    }

    pub fn into_domain(self) -> Result<PurposeDetails, RepositoryError> {
        match self {
            PurposeRow::Sell(row) => {
                let method = parse_stored(&row.payment_method)?;
                let sell_details = SellDetails::from_parts(method, row.down_payment).ok_or_else(|| {
                    RepositoryError::Corrupt(format!(
                        "property {} is sold by {} without a down payment",
                        row.property_id, row.payment_method
                    ))
                })?;
                Ok(PurposeDetails::Sell { sell_details })
            }
            PurposeRow::Rent(row) => Ok(PurposeDetails::Rent {
                rent_details: RentDetails {
                    rent_frequency: parse_stored(&row.rent_frequency)?,
                    deposit: row.deposit,
                    insurance: row.insurance,
                },
            }),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = media)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MediaRow {
    pub id: i64,
    pub property_id: Option<i64>,
    pub uploader_id: String,
    pub name: String,
    pub url: String,
    pub mime_type: String,
    pub is_primary: bool,
    pub position: i32,
    pub alt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MediaRow> for Media {
    fn from(row: MediaRow) -> Self {
        Media {
            id: row.id,
            name: row.name,
            url: row.url,
            mime_type: row.mime_type,
            is_primary: row.is_primary,
            order: row.position,
            alt: row.alt,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = media)]
pub struct NewMediaRow {
    pub uploader_id: String,
    pub name: String,
    pub url: String,
    pub mime_type: String,
    pub is_primary: bool,
    pub position: i32,
    pub alt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn amenities_from_stored(values: &[String]) -> Result<Vec<Amenity>, RepositoryError> {
    values.iter().map(|v| parse_stored(v)).collect()
}

/// Picks the media item shown in list views: the flagged one, otherwise the
/// lowest `order`.
pub fn pick_primary<I>(rows: I) -> Option<MediaRow>
where
    I: IntoIterator<Item = MediaRow>,
{
    rows.into_iter()
        .min_by_key(|row| (!row.is_primary, row.position, row.id))
}

impl PropertyRow {
    pub fn into_summary(
        self,
        type_name: PropertyTypeName,
        purpose: PurposeRow,
        primary_media: Option<MediaRow>,
    ) -> Result<PropertySummary, RepositoryError> {
        Ok(PropertySummary {
            id: self.id,
            slug: self.slug,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            owner_name: self.owner_name,
            owner_phone: self.owner_phone,
            property_type: PropertyTypeRef { name: type_name },
            title: self.title,
            description: self.description,
            price: self.price,
            governorate: parse_stored(&self.governorate)?,
            city: self.city,
            area: self.area,
            amenities: amenities_from_stored(&self.amenities)?,
            purpose: purpose.into_domain()?,
            primary_media: primary_media.map(Media::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_row(id: i64, position: i32, is_primary: bool) -> MediaRow {
        MediaRow {
            id,
            property_id: Some(1),
            uploader_id: "u".into(),
            name: format!("{id}.jpg"),
            url: format!("https://cdn.example.com/{id}.jpg"),
            mime_type: "image/jpeg".into(),
            is_primary,
            position,
            alt: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn flagged_media_wins_over_order() {
        let picked = pick_primary(vec![media_row(1, 0, false), media_row(2, 3, true)]).unwrap();
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn lowest_order_is_the_fallback() {
        let picked = pick_primary(vec![media_row(5, 2, false), media_row(6, 1, false)]).unwrap();
        assert_eq!(picked.id, 6);
        assert!(pick_primary(Vec::new()).is_none());
    }

    #[test]
    fn cash_row_round_trips() {
        let row = PurposeRow::from_domain(
            4,
            &PurposeDetails::Sell {
                sell_details: SellDetails::Cash,
            },
        );
        let PurposeRow::Sell(sell) = &row else {
            panic!("expected sell row");
        };
        assert_eq!(sell.down_payment, None);
        assert_eq!(
            row.into_domain().unwrap(),
            PurposeDetails::Sell {
                sell_details: SellDetails::Cash
            }
        );
    }

    #[test]
    fn corrupt_enum_is_reported() {
        let err = parse_stored::<PropertyTypeName>("CASTLE").unwrap_err();
        assert!(matches!(err, RepositoryError::Corrupt(_)));
    }
}
