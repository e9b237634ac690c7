//! First-run dataset.
//!
//! Seeding only writes keys that are absent, so running it against an
//! existing store never overwrites data.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use super::{Repository, StorageError, StorageKey};
use crate::models::{
    AuthState, Employee, PaymentMethod, Product, ProductCategory, Settings, Showroom,
};

/// Writes the default dataset for every missing collection and returns the
/// keys that were seeded.
pub async fn seed_defaults(repo: &Repository) -> Result<Vec<StorageKey>, StorageError> {
    let now = Utc::now();
    let mut seeded = Vec::new();

    if !repo.contains(StorageKey::Showrooms).await? {
        repo.save(StorageKey::Showrooms, &default_showrooms(now)).await?;
        seeded.push(StorageKey::Showrooms);
    }
    if !repo.contains(StorageKey::Products).await? {
        repo.save(StorageKey::Products, &default_products(now)).await?;
        seeded.push(StorageKey::Products);
    }
    if !repo.contains(StorageKey::Employees).await? {
        repo.save(StorageKey::Employees, &default_employees(now)).await?;
        seeded.push(StorageKey::Employees);
    }
    if !repo.contains(StorageKey::Settings).await? {
        repo.save(StorageKey::Settings, &Settings::default()).await?;
        seeded.push(StorageKey::Settings);
    }
    if !repo.contains(StorageKey::Auth).await? {
        repo.save(StorageKey::Auth, &AuthState::signed_out()).await?;
        seeded.push(StorageKey::Auth);
    }

    if !seeded.is_empty() {
        info!(
            keys = ?seeded.iter().map(StorageKey::as_str).collect::<Vec<_>>(),
            "Seeded default data"
        );
    }
    Ok(seeded)
}

pub fn default_showrooms(now: DateTime<Utc>) -> Vec<Showroom> {
    let showroom = |id: &str, name: &str, location: &str, person: &str, phone: &str, email: &str| {
        Showroom {
            id: id.to_string(),
            name: name.to_string(),
            location: location.to_string(),
            contact_person: person.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            created_at: now,
            updated_at: None,
        }
    };

    vec![
        showroom(
            "1",
            "Central Agriculture Store",
            "Mumbai, Maharashtra",
            "Rajesh Kumar",
            "+91 9876543210",
            "rajesh@centralagri.com",
        ),
        showroom(
            "2",
            "Punjab Farming Hub",
            "Ludhiana, Punjab",
            "Gurpreet Singh",
            "+91 9876543211",
            "gurpreet@punjabfarm.com",
        ),
        showroom(
            "3",
            "Tamil Nadu Seeds Center",
            "Chennai, Tamil Nadu",
            "Murugan Krishnan",
            "+91 9876543212",
            "murugan@tnseeds.com",
        ),
    ]
}

pub fn default_products(now: DateTime<Utc>) -> Vec<Product> {
    let product = |id: &str,
                   name: &str,
                   category: ProductCategory,
                   unit: &str,
                   price: Decimal,
                   gst: Decimal,
                   description: &str,
                   stock: [u32; 3]| Product {
        id: id.to_string(),
        name: name.to_string(),
        category,
        unit: unit.to_string(),
        price,
        gst,
        image: None,
        description: Some(description.to_string()),
        stock: ["1", "2", "3"]
            .iter()
            .zip(stock)
            .map(|(showroom, qty)| (showroom.to_string(), qty))
            .collect(),
        created_at: now,
        updated_at: None,
    };

    vec![
        product(
            "1",
            "Basmati Rice Seeds",
            ProductCategory::Seeds,
            "kg",
            dec!(120),
            dec!(5),
            "Premium quality basmati rice seeds for high yield",
            [500, 750, 300],
        ),
        product(
            "2",
            "NPK Fertilizer",
            ProductCategory::Fertilizer,
            "kg",
            dec!(35),
            dec!(12),
            "Balanced NPK fertilizer for all crops",
            [1000, 800, 600],
        ),
        product(
            "3",
            "Organic Pesticide",
            ProductCategory::Pesticide,
            "liters",
            dec!(280),
            dec!(18),
            "Eco-friendly organic pesticide solution",
            [200, 150, 100],
        ),
        product(
            "4",
            "Tractor Plow",
            ProductCategory::Equipment,
            "piece",
            dec!(25000),
            dec!(28),
            "Heavy-duty tractor plow for deep cultivation",
            [5, 3, 2],
        ),
    ]
}

pub fn default_employees(now: DateTime<Utc>) -> Vec<Employee> {
    let employee = |id: &str,
                    name: &str,
                    role: &str,
                    showroom_id: &str,
                    salary: Decimal,
                    phone: &str,
                    email: &str,
                    payment_method: PaymentMethod,
                    advance_taken: Decimal| Employee {
        id: id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        showroom_id: showroom_id.to_string(),
        salary,
        phone: phone.to_string(),
        email: email.to_string(),
        avatar: None,
        payment_method,
        advance_taken,
        created_at: now,
        updated_at: None,
    };

    vec![
        employee(
            "1",
            "Amit Sharma",
            "Store Manager",
            "1",
            dec!(45000),
            "+91 9876543213",
            "amit.sharma@email.com",
            PaymentMethod::BankTransfer,
            Decimal::ZERO,
        ),
        employee(
            "2",
            "Priya Patel",
            "Sales Executive",
            "1",
            dec!(35000),
            "+91 9876543214",
            "priya.patel@email.com",
            PaymentMethod::Cash,
            dec!(5000),
        ),
        employee(
            "3",
            "Suresh Kumar",
            "Inventory Manager",
            "2",
            dec!(40000),
            "+91 9876543215",
            "suresh.kumar@email.com",
            PaymentMethod::BankTransfer,
            dec!(10000),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStorage, DEFAULT_KEY_PREFIX};
    use std::sync::Arc;

    #[tokio::test]
    async fn seeds_missing_collections_once() {
        let repo = Repository::new(Arc::new(InMemoryStorage::new()), DEFAULT_KEY_PREFIX);

        let first = seed_defaults(&repo).await.unwrap();
        assert_eq!(first.len(), 5);

        let second = seed_defaults(&repo).await.unwrap();
        assert!(second.is_empty());

        let showrooms: Vec<Showroom> = repo.load(StorageKey::Showrooms, Vec::new()).await;
        assert_eq!(showrooms.len(), 3);
        let products: Vec<Product> = repo.load(StorageKey::Products, Vec::new()).await;
        assert_eq!(products.len(), 4);
        assert_eq!(products[0].quantity_at("2"), 750);
    }

    #[tokio::test]
    async fn never_overwrites_existing_data() {
        let repo = Repository::new(Arc::new(InMemoryStorage::new()), DEFAULT_KEY_PREFIX);
        repo.save(StorageKey::Products, &Vec::<Product>::new())
            .await
            .unwrap();

        let seeded = seed_defaults(&repo).await.unwrap();
        assert!(!seeded.contains(&StorageKey::Products));

        let products: Vec<Product> = repo.load(StorageKey::Products, Vec::new()).await;
        assert!(products.is_empty());
    }
}
