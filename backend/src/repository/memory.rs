use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use listing_schema::slug::listing_slug;
use listing_schema::{
    Media, MediaInsert, OwnerProfile, Property, PropertyFilters, PropertyInsert, PropertySummary,
    PropertyTypeRef,
};

use super::{PropertyQuery, PropertyRepository, RepositoryError};

struct MediaRecord {
    media: Media,
    uploader_id: String,
    property_id: Option<i64>,
}

#[derive(Default)]
struct Store {
    users: HashMap<String, OwnerProfile>,
    /// Listings without `media` and `user`, which are joined on read.
    properties: BTreeMap<i64, Property>,
    media: BTreeMap<i64, MediaRecord>,
    last_property_id: i64,
    last_media_id: i64,
}

impl Store {
    fn gallery(&self, property_id: i64) -> Vec<Media> {
        let mut gallery: Vec<Media> = self
            .media
            .values()
            .filter(|record| record.property_id == Some(property_id))
            .map(|record| record.media.clone())
            .collect();
        gallery.sort_by_key(|m| (m.order, m.id));
        gallery
    }
}

/// Process-local repository with the same semantics as the Postgres one.
/// Writes either apply fully or not at all.
#[derive(Default)]
pub struct InMemoryPropertyRepository {
    store: Mutex<Store>,
}

impl InMemoryPropertyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches(filters: &PropertyFilters, property: &Property) -> bool {
    filters
        .title
        .as_deref()
        .map_or(true, |title| contains_ignore_case(&property.title, title))
        && (filters.property_types.is_empty()
            || filters.property_types.contains(&property.property_type.name()))
        && filters
            .purpose
            .map_or(true, |purpose| property.purpose.purpose() == purpose)
        && (filters.governorates.is_empty() || filters.governorates.contains(&property.governorate))
        && filters
            .city
            .as_deref()
            .map_or(true, |city| contains_ignore_case(&property.city, city))
        && filters.min_price.map_or(true, |min| property.price >= min)
        && filters.max_price.map_or(true, |max| property.price <= max)
}

fn summarize(property: &Property, primary_media: Option<Media>) -> PropertySummary {
    PropertySummary {
        id: property.id,
        slug: property.slug.clone(),
        user_id: property.user_id.clone(),
        created_at: property.created_at,
        updated_at: property.updated_at,
        owner_name: property.owner_name.clone(),
        owner_phone: property.owner_phone.clone(),
        property_type: PropertyTypeRef {
            name: property.property_type.name(),
        },
        title: property.title.clone(),
        description: property.description.clone(),
        price: property.price,
        governorate: property.governorate,
        city: property.city.clone(),
        area: property.area,
        amenities: property.amenities.clone(),
        purpose: property.purpose.clone(),
        primary_media,
    }
}

fn stored_property(id: i64, user: &OwnerProfile, payload: &PropertyInsert, now: DateTime<Utc>) -> Property {
    Property {
        id,
        slug: listing_slug(&payload.title, id),
        user_id: user.id.clone(),
        created_at: now,
        updated_at: now,
        owner_name: payload.owner_name.clone(),
        owner_phone: payload.owner_phone.clone(),
        property_type: payload.property_type.clone(),
        title: payload.title.clone(),
        description: payload.description.clone(),
        price: payload.price,
        governorate: payload.governorate,
        city: payload.city.clone(),
        area: payload.area,
        amenities: payload.amenities.clone(),
        purpose: payload.purpose.clone(),
        media: Vec::new(),
        user: user.clone(),
    }
}

impl PropertyRepository for InMemoryPropertyRepository {
    fn get_page(&self, query: &PropertyQuery) -> Result<Vec<PropertySummary>, RepositoryError> {
        let store = self.store();
        let after = query.cursor.unwrap_or(0);
        let take = usize::try_from(query.take).unwrap_or(0);
        Ok(store
            .properties
            .range(after.saturating_add(1)..)
            .map(|(_, property)| property)
            .filter(|property| query.owner.as_deref().map_or(true, |owner| property.user_id == owner))
            .filter(|property| matches(&query.filters, property))
            .take(take)
            .map(|property| {
                let gallery = store.gallery(property.id);
                let primary = gallery
                    .iter()
                    .find(|m| m.is_primary)
                    .or_else(|| gallery.first())
                    .cloned();
                summarize(property, primary)
            })
            .collect())
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Property>, RepositoryError> {
        let store = self.store();
        let Some(stored) = store.properties.get(&id) else {
            return Ok(None);
        };
        let mut property = stored.clone();
        if let Some(user) = store.users.get(&property.user_id) {
            property.user = user.clone();
        }
        property.media = store.gallery(id);
        Ok(Some(property))
    }

    fn create_property(&self, user_id: &str, payload: &PropertyInsert) -> Result<i64, RepositoryError> {
        let mut store = self.store();
        // Every check runs before the first write.
        let user = store
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| RepositoryError::Corrupt(format!("user {user_id} is not registered")))?;
        for (index, reference) in payload.media_data.iter().enumerate() {
            let attachable = store.media.get(&reference.id).is_some_and(|record| {
                record.uploader_id == user_id
                    && record.property_id.is_none()
                    && record.media.url == reference.url
                    && record.media.name == reference.name
            });
            if !attachable {
                return Err(RepositoryError::InvalidMedia {
                    index,
                    id: reference.id,
                });
            }
        }

        store.last_property_id += 1;
        let id = store.last_property_id;
        let now = Utc::now();
        store
            .properties
            .insert(id, stored_property(id, &user, payload, now));
        for (index, reference) in payload.media_data.iter().enumerate() {
            if let Some(record) = store.media.get_mut(&reference.id) {
                record.property_id = Some(id);
                record.media.order = index as i32;
                record.media.is_primary = index == 0;
                record.media.updated_at = now;
            }
        }
        Ok(id)
    }

    fn delete_property(&self, user_id: &str, property_id: i64) -> Result<i64, RepositoryError> {
        let mut store = self.store();
        match store.properties.get(&property_id) {
            Some(property) if property.user_id == user_id => {}
            _ => return Err(RepositoryError::NotFound),
        }
        store.properties.remove(&property_id);
        store
            .media
            .retain(|_, record| record.property_id != Some(property_id));
        Ok(property_id)
    }

    fn insert_media(&self, uploader_id: &str, payload: &MediaInsert) -> Result<i64, RepositoryError> {
        let mut store = self.store();
        store.last_media_id += 1;
        let id = store.last_media_id;
        let now = Utc::now();
        store.media.insert(
            id,
            MediaRecord {
                media: Media {
                    id,
                    name: payload.name.clone(),
                    url: payload.url.clone(),
                    mime_type: payload.mime_type.clone(),
                    is_primary: false,
                    order: payload.order,
                    alt: payload.alt.clone(),
                    created_at: now,
                    updated_at: now,
                },
                uploader_id: uploader_id.to_string(),
                property_id: None,
            },
        );
        Ok(id)
    }

    fn upsert_user(&self, profile: &OwnerProfile) -> Result<(), RepositoryError> {
        self.store().users.insert(profile.id.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::list_properties;
    use listing_schema::{PageRequest, PropertyPurpose, PropertyTypeName};
    use serde_json::{json, Value};

    fn owner(id: &str) -> OwnerProfile {
        OwnerProfile {
            id: id.into(),
            name: format!("User {id}"),
            image: None,
        }
    }

    const UPLOAD_URL: &str = "https://listings.s3.us-east-1.amazonaws.com/uploads/front.jpg";

    fn upload(repo: &InMemoryPropertyRepository, user: &str) -> i64 {
        let payload = MediaInsert::from_json(&json!({
            "name": "front.jpg",
            "url": UPLOAD_URL,
            "mimeType": "image/jpeg",
            "order": 3
        }))
        .unwrap();
        repo.insert_media(user, &payload).unwrap()
    }

    fn payload(title: &str, price: f64, media_ids: &[i64]) -> Value {
        let media: Vec<Value> = media_ids
            .iter()
            .map(|id| json!({ "id": id, "url": UPLOAD_URL, "name": "front.jpg" }))
            .collect();
        json!({
            "propertyType": {
                "name": "APARTMENT",
                "apartmentDetails": { "subtype": "DUPLEX", "bedrooms": 3, "bathrooms": 2, "furnished": true, "level": 4 }
            },
            "title": title,
            "description": "Bright corner unit close to the metro",
            "ownerName": "Mona Adel",
            "ownerPhone": "+201012345678",
            "governorate": "CAIRO",
            "city": "Nasr City",
            "area": 140,
            "amenities": ["BALCONY", "ELEVATOR"],
            "price": price,
            "purpose": "SELL",
            "sellDetails": { "paymentMethod": "CASH" },
            "mediaData": media
        })
    }

    fn create(repo: &InMemoryPropertyRepository, user: &str, title: &str, price: f64) -> i64 {
        repo.upsert_user(&owner(user)).unwrap();
        let media_id = upload(repo, user);
        let insert = PropertyInsert::from_json(&payload(title, price, &[media_id])).unwrap();
        repo.create_property(user, &insert).unwrap()
    }

    #[test]
    fn created_listing_reads_back() {
        let repo = InMemoryPropertyRepository::new();
        repo.upsert_user(&owner("a")).unwrap();
        let first = upload(&repo, "a");
        let second = upload(&repo, "a");
        let insert = PropertyInsert::from_json(&payload("Sunny duplex", 2_500_000.0, &[second, first])).unwrap();
        let id = repo.create_property("a", &insert).unwrap();

        let property = repo.get_by_id(id).unwrap().unwrap();
        assert_eq!(property.slug, format!("sunny-duplex-{id}"));
        assert_eq!(property.property_type, insert.property_type);
        assert_eq!(property.purpose, insert.purpose);
        assert_eq!(property.price, insert.price);
        assert_eq!(property.user, owner("a"));
        let order: Vec<(i64, i32, bool)> = property.media.iter().map(|m| (m.id, m.order, m.is_primary)).collect();
        assert_eq!(order, vec![(second, 0, true), (first, 1, false)]);
    }

    #[test]
    fn missing_listing_is_none() {
        let repo = InMemoryPropertyRepository::new();
        assert!(repo.get_by_id(7).unwrap().is_none());
    }

    #[test]
    fn non_owner_cannot_delete() {
        let repo = InMemoryPropertyRepository::new();
        let id = create(&repo, "b", "Villa with garden", 900_000.0);

        assert!(matches!(repo.delete_property("a", id), Err(RepositoryError::NotFound)));
        assert!(repo.get_by_id(id).unwrap().is_some());

        assert_eq!(repo.delete_property("b", id).unwrap(), id);
        assert!(repo.get_by_id(id).unwrap().is_none());
        assert!(matches!(repo.delete_property("b", id), Err(RepositoryError::NotFound)));
    }

    #[test]
    fn foreign_media_leaves_no_partial_listing() {
        let repo = InMemoryPropertyRepository::new();
        repo.upsert_user(&owner("a")).unwrap();
        repo.upsert_user(&owner("b")).unwrap();
        let mine = upload(&repo, "a");
        let theirs = upload(&repo, "b");
        let insert = PropertyInsert::from_json(&payload("Studio", 1_000.0, &[mine, theirs])).unwrap();

        let err = repo.create_property("a", &insert).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidMedia { index: 1, id } if id == theirs));
        assert!(list_properties(&repo, &PageRequest { cursor: None, page_size: 10 }, PropertyFilters::default(), None)
            .unwrap()
            .data
            .is_empty());

        // The rejected upload is still free to attach.
        let retry = PropertyInsert::from_json(&payload("Studio", 1_000.0, &[mine])).unwrap();
        assert!(repo.create_property("a", &retry).is_ok());
    }

    #[test]
    fn media_attaches_only_once() {
        let repo = InMemoryPropertyRepository::new();
        repo.upsert_user(&owner("a")).unwrap();
        let media_id = upload(&repo, "a");
        let insert = PropertyInsert::from_json(&payload("First", 1_000.0, &[media_id])).unwrap();
        repo.create_property("a", &insert).unwrap();
        assert!(matches!(
            repo.create_property("a", &insert),
            Err(RepositoryError::InvalidMedia { index: 0, .. })
        ));
    }

    #[test]
    fn reference_must_match_the_recorded_upload() {
        let repo = InMemoryPropertyRepository::new();
        repo.upsert_user(&owner("a")).unwrap();
        let media_id = upload(&repo, "a");
        let mut body = payload("Loft", 1_000.0, &[media_id]);
        body["mediaData"][0]["url"] = json!("https://elsewhere.example.com/front.jpg");
        let insert = PropertyInsert::from_json(&body).unwrap();
        assert!(matches!(
            repo.create_property("a", &insert),
            Err(RepositoryError::InvalidMedia { index: 0, .. })
        ));

        let insert = PropertyInsert::from_json(&payload("Loft", 1_000.0, &[media_id])).unwrap();
        assert!(repo.create_property("a", &insert).is_ok());
    }

    #[test]
    fn filters_and_pages_compose() {
        let repo = InMemoryPropertyRepository::new();
        let cheap = create(&repo, "a", "Sea view chalet", 500.0);
        let _other = create(&repo, "b", "Downtown office", 5_000.0);
        let pricey = create(&repo, "a", "SEA VIEW penthouse", 9_000.0);

        let filters = PropertyFilters {
            title: Some("sea view".into()),
            property_types: vec![PropertyTypeName::Apartment],
            purpose: Some(PropertyPurpose::Sell),
            ..Default::default()
        };
        let page = list_properties(&repo, &PageRequest { cursor: None, page_size: 1 }, filters.clone(), None).unwrap();
        assert_eq!(page.data.iter().map(|p| p.id).collect::<Vec<_>>(), vec![cheap]);
        assert!(page.data[0].primary_media.as_ref().is_some_and(|m| m.is_primary));

        let next = list_properties(&repo, &PageRequest { cursor: page.next_cursor, page_size: 1 }, filters, None).unwrap();
        assert_eq!(next.data.iter().map(|p| p.id).collect::<Vec<_>>(), vec![pricey]);
        assert_eq!(next.next_cursor, None);

        let ranged = PropertyFilters {
            min_price: Some(500.0),
            max_price: Some(5_000.0),
            ..Default::default()
        };
        let mine = list_properties(&repo, &PageRequest { cursor: None, page_size: 10 }, ranged, Some("a".into())).unwrap();
        assert_eq!(mine.data.iter().map(|p| p.id).collect::<Vec<_>>(), vec![cheap]);
    }
}
