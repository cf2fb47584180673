use crate::features::listings::{
    models::ListingJoined,
    schemas::{ListingSummary, OwnerOut},
};

impl From<ListingJoined> for ListingSummary {
    fn from(row: ListingJoined) -> Self {
        let amenities = row.amenities.map(|a| a.0).unwrap_or_default();

        Self {
            id: row.listing_id,
            title: row.title,
            price: row.price,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            square_feet: row.square_feet,
            property_type: row.property_type,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
            amenities,
            status: row.status,
            owner: OwnerOut {
                id: row.owner_id,
                full_name: row.owner_full_name,
                email: row.owner_email,
            },
            created_at: row.listing_created_at,
            updated_at: row.listing_updated_at,
        }
    }
}
