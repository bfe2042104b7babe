//! Default data for a fresh install.

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use pos_core::time::to_record_timestamp;
use pos_core::{generate_id, hash_password, keys, Settings};

use crate::error::Result;
use crate::state::AppState;

/// Seed users: (nama, username, password, email, phone, role).
const USERS: [(&str, &str, &str, &str, &str, &str); 4] = [
    ("Super Admin", "admin", "admin123", "admin@pos.com", "081234567890", "super_admin"),
    ("Administrator", "admin2", "admin123", "admin2@pos.com", "081234567891", "admin"),
    ("Manager Toko", "manager", "manager123", "manager@pos.com", "081234567892", "manager"),
    ("Kasir 1", "kasir", "kasir123", "kasir@pos.com", "081234567893", "kasir"),
];

/// Seed products: (sku, barcode, nama, kategori, hargaBeli, hargaJual, stok, minStok, deskripsi).
const PRODUCTS: [(&str, &str, &str, &str, u32, u32, u32, u32, &str); 5] = [
    ("PRD-001", "1234567890123", "Produk A - Premium", "Elektronik", 50_000, 75_000, 100, 20, "Produk berkualitas tinggi"),
    ("PRD-002", "1234567890124", "Produk B - Standard", "Elektronik", 30_000, 50_000, 50, 15, "Produk standar"),
    ("PRD-003", "1234567890125", "Produk C - Basic", "Fashion", 25_000, 40_000, 75, 25, "Produk basic"),
    ("PRD-004", "1234567890126", "Produk D - Deluxe", "Fashion", 60_000, 90_000, 30, 10, "Produk deluxe"),
    ("PRD-005", "1234567890127", "Produk E - Economy", "Elektronik", 20_000, 35_000, 150, 30, "Produk ekonomis"),
];

impl AppState {
    /// Write the default users, products, customers, promo codes and
    /// settings when `pos_users` is empty.
    ///
    /// Everything is written in one batch. Returns whether anything was
    /// seeded.
    ///
    /// # Errors
    ///
    /// Returns an error if a password cannot be hashed or the batch does not
    /// fit in the fast cache.
    pub fn seed_defaults(&self) -> Result<bool> {
        if !self.store.get_all(keys::USERS).is_empty() {
            tracing::debug!("Users present, skipping seed");
            return Ok(false);
        }

        let now = Utc::now();
        let stamp = to_record_timestamp(now);

        let mut users = Vec::with_capacity(USERS.len());
        for (nama, username, password, email, phone, role) in USERS {
            users.push(json!({
                "id": generate_id(),
                "nama": nama,
                "username": username,
                "password": hash_password(password, self.config.password_iterations)?,
                "email": email,
                "noTelepon": phone,
                "role": role,
                "status": "active",
                "createdAt": stamp,
                "updatedAt": stamp,
            }));
        }

        let products: Vec<Value> = PRODUCTS
            .iter()
            .map(|&(sku, barcode, nama, kategori, beli, jual, stok, min_stok, deskripsi)| {
                json!({
                    "id": generate_id(),
                    "sku": sku,
                    "barcode": barcode,
                    "nama": nama,
                    "kategori": kategori,
                    "hargaBeli": beli,
                    "hargaJual": jual,
                    "stok": stok,
                    "minStok": min_stok,
                    "satuan": "Pcs",
                    "deskripsi": deskripsi,
                    "createdAt": stamp,
                    "updatedAt": stamp,
                })
            })
            .collect();

        let customers = json!([
            {
                "id": generate_id(),
                "nama": "Pelanggan 1",
                "noTelepon": "081234567890",
                "email": "pelanggan1@email.com",
                "alamat": "Jl. Contoh No. 123",
                "poin": 0,
                "createdAt": stamp,
                "updatedAt": stamp,
            },
            {
                "id": generate_id(),
                "nama": "Pelanggan 2",
                "noTelepon": "081234567891",
                "email": "pelanggan2@email.com",
                "alamat": "Jl. Contoh No. 456",
                "poin": 50,
                "createdAt": stamp,
                "updatedAt": stamp,
            },
        ]);

        let valid_until = to_record_timestamp(now + Duration::days(365));
        let promo_codes = json!([
            {
                "id": generate_id(),
                "code": "DISKON10",
                "type": "percentage",
                "value": 10,
                "minPurchase": 100_000,
                "maxDiscount": 50_000,
                "validFrom": stamp,
                "validUntil": valid_until,
                "usageLimit": 1000,
                "usageCount": 0,
                "status": "active",
            },
            {
                "id": generate_id(),
                "code": "DISKON20K",
                "type": "nominal",
                "value": 20_000,
                "minPurchase": 200_000,
                "maxDiscount": 20_000,
                "validFrom": stamp,
                "validUntil": valid_until,
                "usageLimit": 500,
                "usageCount": 0,
                "status": "active",
            },
        ]);

        let settings = serde_json::to_value(Settings::default())
            .map_err(pos_store::StoreError::from)?;

        self.store.set_many(vec![
            (keys::USERS.into(), Value::Array(users)),
            (keys::PRODUCTS.into(), Value::Array(products)),
            (keys::CUSTOMERS.into(), customers),
            (keys::PROMO_CODES.into(), promo_codes),
            (keys::SETTINGS.into(), settings),
        ])?;

        tracing::info!(
            users = USERS.len(),
            products = PRODUCTS.len(),
            "Seeded default data"
        );
        Ok(true)
    }
}
