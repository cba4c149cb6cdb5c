use std::collections::HashMap;

use chrono::Utc;
use diesel::dsl::sql;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel::PgTextExpressionMethods;
use listing_schema::slug::listing_slug;
use listing_schema::{
    Media, MediaInsert, OwnerProfile, Property, PropertyInsert, PropertyPurpose, PropertySummary,
    PropertyTypeName,
};

use super::{contains_pattern, PropertyQuery, PropertyRepository, RepositoryError};
use crate::db::{DbConnection, DbPool};
use crate::models::{
    amenities_from_stored, parse_stored, pick_primary, ApartmentDetailsRow, CommercialDetailsRow,
    DetailsRow, LandDetailsRow, MediaRow, NewMediaRow, NewPropertyRow, NewPropertyTypeRow,
    NewUserRow, PropertyRow, PropertyTypeRow, PurposeRow, RentDetailsRow, SellDetailsRow, UserRow,
    VillaDetailsRow,
};
use crate::schema::{
    apartment_details, commercial_details, land_details, media, properties, property_types,
    rent_details, sell_details, users, villa_details,
};

/// Diesel-backed repository. Every multi-table write runs in one
/// transaction on a single pooled connection.
#[derive(Clone)]
pub struct PgPropertyRepository {
    pool: DbPool,
}

impl PgPropertyRepository {
    pub fn new(pool: DbPool) -> Self {
        PgPropertyRepository { pool }
    }

    fn conn(&self) -> Result<DbConnection, RepositoryError> {
        self.pool.get().map_err(|e| {
            log::error!("Failed to get database connection: {}", e);
            RepositoryError::from(e)
        })
    }
}

fn load_details(conn: &mut PgConnection, property_type: &PropertyTypeRow) -> Result<DetailsRow, RepositoryError> {
    let name: PropertyTypeName = parse_stored(&property_type.name)?;
    let id = property_type.id;
    let details = match name {
        PropertyTypeName::Apartment => apartment_details::table
            .find(id)
            .select(ApartmentDetailsRow::as_select())
            .first(conn)
            .optional()?
            .map(DetailsRow::Apartment),
        PropertyTypeName::Villa => villa_details::table
            .find(id)
            .select(VillaDetailsRow::as_select())
            .first(conn)
            .optional()?
            .map(DetailsRow::Villa),
        PropertyTypeName::Commercial => commercial_details::table
            .find(id)
            .select(CommercialDetailsRow::as_select())
            .first(conn)
            .optional()?
            .map(DetailsRow::Commercial),
        PropertyTypeName::Land => land_details::table
            .find(id)
            .select(LandDetailsRow::as_select())
            .first(conn)
            .optional()?
            .map(DetailsRow::Land),
    };
    details.ok_or_else(|| RepositoryError::Corrupt(format!("property type {id} ({name}) has no details row")))
}

/// Loads the sell or rent row of each listing, keyed by listing id.
fn load_purposes(conn: &mut PgConnection, ids: &[i64]) -> Result<HashMap<i64, PurposeRow>, RepositoryError> {
    let mut purposes = HashMap::with_capacity(ids.len());
    let sells: Vec<SellDetailsRow> = sell_details::table
        .filter(sell_details::property_id.eq_any(ids))
        .select(SellDetailsRow::as_select())
        .load(conn)?;
    for row in sells {
        purposes.insert(row.property_id, PurposeRow::Sell(row));
    }
    let rents: Vec<RentDetailsRow> = rent_details::table
        .filter(rent_details::property_id.eq_any(ids))
        .select(RentDetailsRow::as_select())
        .load(conn)?;
    for row in rents {
        purposes.insert(row.property_id, PurposeRow::Rent(row));
    }
    Ok(purposes)
}

fn take_purpose(
    purposes: &mut HashMap<i64, PurposeRow>,
    row: &PropertyRow,
) -> Result<PurposeRow, RepositoryError> {
    let expected: PropertyPurpose = parse_stored(&row.purpose)?;
    match purposes.remove(&row.id) {
        Some(PurposeRow::Sell(sell)) if expected == PropertyPurpose::Sell => Ok(PurposeRow::Sell(sell)),
        Some(PurposeRow::Rent(rent)) if expected == PropertyPurpose::Rent => Ok(PurposeRow::Rent(rent)),
        _ => Err(RepositoryError::Corrupt(format!(
            "property {} has no {} details",
            row.id, expected
        ))),
    }
}

impl PropertyRepository for PgPropertyRepository {
    fn get_page(&self, query: &PropertyQuery) -> Result<Vec<PropertySummary>, RepositoryError> {
        let mut conn = self.conn()?;
        let filters = &query.filters;

        let mut statement = properties::table
            .inner_join(property_types::table)
            .select((PropertyRow::as_select(), property_types::name))
            .order(properties::id.asc())
            .limit(query.take)
            .into_boxed();
        if let Some(cursor) = query.cursor {
            statement = statement.filter(properties::id.gt(cursor));
        }
        if let Some(owner) = &query.owner {
            statement = statement.filter(properties::user_id.eq(owner.clone()));
        }
        if let Some(title) = &filters.title {
            statement = statement.filter(properties::title.ilike(contains_pattern(title)));
        }
        if !filters.property_types.is_empty() {
            let names: Vec<String> = filters.property_types.iter().map(|t| t.to_string()).collect();
            statement = statement.filter(property_types::name.eq_any(names));
        }
        if let Some(purpose) = filters.purpose {
            statement = statement.filter(properties::purpose.eq(purpose.to_string()));
        }
        if !filters.governorates.is_empty() {
            let names: Vec<String> = filters.governorates.iter().map(|g| g.to_string()).collect();
            statement = statement.filter(properties::governorate.eq_any(names));
        }
        if let Some(city) = &filters.city {
            statement = statement.filter(properties::city.ilike(contains_pattern(city)));
        }
        if let Some(min_price) = filters.min_price {
            statement = statement.filter(properties::price.ge(min_price));
        }
        if let Some(max_price) = filters.max_price {
            statement = statement.filter(properties::price.le(max_price));
        }

        let rows: Vec<(PropertyRow, String)> = statement.load(&mut conn)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|(row, _)| row.id).collect();
        let mut purposes = load_purposes(&mut conn, &ids)?;
        let attached: Vec<Option<i64>> = ids.iter().map(|id| Some(*id)).collect();
        let media_rows: Vec<MediaRow> = media::table
            .filter(media::property_id.eq_any(attached))
            .select(MediaRow::as_select())
            .load(&mut conn)?;
        let mut media_by_property: HashMap<i64, Vec<MediaRow>> = HashMap::new();
        for row in media_rows {
            if let Some(property_id) = row.property_id {
                media_by_property.entry(property_id).or_default().push(row);
            }
        }

        rows.into_iter()
            .map(|(row, type_name)| {
                let purpose = take_purpose(&mut purposes, &row)?;
                let primary = media_by_property.remove(&row.id).and_then(pick_primary);
                row.into_summary(parse_stored(&type_name)?, purpose, primary)
            })
            .collect()
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Property>, RepositoryError> {
        let mut conn = self.conn()?;
        let found: Option<(PropertyRow, PropertyTypeRow)> = properties::table
            .inner_join(property_types::table)
            .filter(properties::id.eq(id))
            .select((PropertyRow::as_select(), PropertyTypeRow::as_select()))
            .first(&mut conn)
            .optional()?;
        let Some((row, type_row)) = found else {
            return Ok(None);
        };

        let property_type = load_details(&mut conn, &type_row)?.into_domain()?;
        let mut purposes = load_purposes(&mut conn, &[row.id])?;
        let purpose = take_purpose(&mut purposes, &row)?.into_domain()?;
        let gallery: Vec<Media> = media::table
            .filter(media::property_id.eq(Some(row.id)))
            .order((media::position.asc(), media::id.asc()))
            .select(MediaRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(Media::from)
            .collect();
        let owner: UserRow = users::table
            .find(&row.user_id)
            .select(UserRow::as_select())
            .first(&mut conn)?;

        Ok(Some(Property {
            id: row.id,
            slug: row.slug,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            owner_name: row.owner_name,
            owner_phone: row.owner_phone,
            property_type,
            title: row.title,
            description: row.description,
            price: row.price,
            governorate: parse_stored(&row.governorate)?,
            city: row.city,
            area: row.area,
            amenities: amenities_from_stored(&row.amenities)?,
            purpose,
            media: gallery,
            user: OwnerProfile {
                id: owner.id,
                name: owner.name,
                image: owner.image,
            },
        }))
    }

    fn create_property(&self, user_id: &str, payload: &PropertyInsert) -> Result<i64, RepositoryError> {
        let mut conn = self.conn()?;
        conn.transaction::<i64, RepositoryError, _>(|conn| {
            let type_id: i64 = diesel::insert_into(property_types::table)
                .values(&NewPropertyTypeRow {
                    name: payload.property_type_name().to_string(),
                })
                .returning(property_types::id)
                .get_result(conn)?;
            match DetailsRow::from_domain(type_id, &payload.property_type) {
                DetailsRow::Apartment(row) => diesel::insert_into(apartment_details::table).values(&row).execute(conn)?,
                DetailsRow::Villa(row) => diesel::insert_into(villa_details::table).values(&row).execute(conn)?,
                DetailsRow::Commercial(row) => {
                    diesel::insert_into(commercial_details::table).values(&row).execute(conn)?
                }
                DetailsRow::Land(row) => diesel::insert_into(land_details::table).values(&row).execute(conn)?,
            };

            // The slug embeds the id, so reserve it before inserting.
            let id: i64 = diesel::select(sql::<BigInt>("nextval('properties_id_seq')")).get_result(conn)?;
            let now = Utc::now();
            diesel::insert_into(properties::table)
                .values(&NewPropertyRow {
                    id,
                    slug: listing_slug(&payload.title, id),
                    user_id: user_id.to_string(),
                    property_type_id: type_id,
                    created_at: now,
                    updated_at: now,
                    owner_name: payload.owner_name.clone(),
                    owner_phone: payload.owner_phone.clone(),
                    title: payload.title.clone(),
                    description: payload.description.clone(),
                    price: payload.price,
                    governorate: payload.governorate.to_string(),
                    city: payload.city.clone(),
                    area: payload.area,
                    amenities: payload.amenities.iter().map(|a| a.to_string()).collect(),
                    purpose: payload.purpose.purpose().to_string(),
                })
                .execute(conn)?;

            for (index, reference) in payload.media_data.iter().enumerate() {
                let attached = diesel::update(
                    media::table
                        .filter(media::id.eq(reference.id))
                        .filter(media::uploader_id.eq(user_id))
                        .filter(media::property_id.is_null())
                        .filter(media::url.eq(&reference.url))
                        .filter(media::name.eq(&reference.name)),
                )
                .set((
                    media::property_id.eq(Some(id)),
                    media::position.eq(index as i32),
                    media::is_primary.eq(index == 0),
                    media::updated_at.eq(now),
                ))
                .execute(conn)?;
                if attached == 0 {
                    return Err(RepositoryError::InvalidMedia {
                        index,
                        id: reference.id,
                    });
                }
            }

            match PurposeRow::from_domain(id, &payload.purpose) {
                PurposeRow::Sell(row) => diesel::insert_into(sell_details::table).values(&row).execute(conn)?,
                PurposeRow::Rent(row) => diesel::insert_into(rent_details::table).values(&row).execute(conn)?,
            };
            Ok(id)
        })
        .map_err(|e| {
            if !matches!(e, RepositoryError::InvalidMedia { .. }) {
                log::error!("Failed to create property for {}: {}", user_id, e);
            }
            e
        })
    }

    fn delete_property(&self, user_id: &str, property_id: i64) -> Result<i64, RepositoryError> {
        let mut conn = self.conn()?;
        conn.transaction::<i64, RepositoryError, _>(|conn| {
            let type_id: i64 = properties::table
                .filter(properties::id.eq(property_id))
                .filter(properties::user_id.eq(user_id))
                .select(properties::property_type_id)
                .first(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;
            // Purpose rows and media cascade from the listing, type details
            // cascade from the type row.
            diesel::delete(properties::table.find(property_id)).execute(conn)?;
            diesel::delete(property_types::table.find(type_id)).execute(conn)?;
            Ok(property_id)
        })
    }

    fn insert_media(&self, uploader_id: &str, payload: &MediaInsert) -> Result<i64, RepositoryError> {
        let mut conn = self.conn()?;
        let now = Utc::now();
        let id = diesel::insert_into(media::table)
            .values(&NewMediaRow {
                uploader_id: uploader_id.to_string(),
                name: payload.name.clone(),
                url: payload.url.clone(),
                mime_type: payload.mime_type.clone(),
                is_primary: false,
                position: payload.order,
                alt: payload.alt.clone(),
                created_at: now,
                updated_at: now,
            })
            .returning(media::id)
            .get_result(&mut conn)?;
        Ok(id)
    }

    fn upsert_user(&self, profile: &OwnerProfile) -> Result<(), RepositoryError> {
        let mut conn = self.conn()?;
        let row = NewUserRow {
            id: profile.id.clone(),
            name: profile.name.clone(),
            image: profile.image.clone(),
        };
        diesel::insert_into(users::table)
            .values(&row)
            .on_conflict(users::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }
}
