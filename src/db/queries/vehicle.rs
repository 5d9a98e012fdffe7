//! Vehicle database queries

use anyhow::Result;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::types::user::{RegisterRequest, RegisterVehicle};
use crate::types::vehicle::{CreateVehicleRequest, UpdateVehicleRequest, Vehicle};

const VEHICLE_COLUMNS: &str = "id, client_id, brand, model, registration, vin, circulation_date, \
     mileage, driver, driver_last_name, driver_first_name, driver_phone, created_at, updated_at";

/// Insert a vehicle on an existing connection
pub async fn insert_vehicle(
    conn: &mut PgConnection,
    client_id: Uuid,
    request: &CreateVehicleRequest,
) -> Result<Vehicle> {
    let query = format!(
        "INSERT INTO vehicles (client_id, brand, model, registration, vin, circulation_date,
                               mileage, driver, driver_last_name, driver_first_name, driver_phone)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {VEHICLE_COLUMNS}"
    );
    let vehicle = sqlx::query_as::<_, Vehicle>(&query)
        .bind(client_id)
        .bind(&request.brand)
        .bind(&request.model)
        .bind(&request.registration)
        .bind(&request.vin)
        .bind(request.circulation_date)
        .bind(request.mileage)
        .bind(request.driver)
        .bind(&request.driver_last_name)
        .bind(&request.driver_first_name)
        .bind(&request.driver_phone)
        .fetch_one(conn)
        .await?;

    Ok(vehicle)
}

/// Insert the vehicle supplied at registration time.
///
/// When no distinct driver is declared, the driver contact falls back to
/// the client's own name and phone.
pub async fn insert_registration_vehicle(
    conn: &mut PgConnection,
    client_id: Uuid,
    account: &RegisterRequest,
    vehicle: &RegisterVehicle,
) -> Result<Vehicle> {
    let (driver_last_name, driver_first_name, driver_phone) = if vehicle.driver {
        (
            vehicle.driver_last_name.clone(),
            vehicle.driver_first_name.clone(),
            vehicle.driver_phone.clone(),
        )
    } else {
        (
            Some(account.last_name.clone()),
            Some(account.first_name.clone()),
            Some(account.phone.clone()),
        )
    };

    let request = CreateVehicleRequest {
        brand: vehicle.brand.clone(),
        model: vehicle.model.clone(),
        registration: vehicle.registration.clone(),
        vin: vehicle.vin.clone(),
        circulation_date: vehicle
            .circulation_date
            .unwrap_or_else(|| Utc::now().date_naive()),
        mileage: vehicle.mileage,
        driver: vehicle.driver,
        driver_last_name,
        driver_first_name,
        driver_phone,
    };

    insert_vehicle(conn, client_id, &request).await
}

/// Create a new vehicle
pub async fn create_vehicle(
    pool: &PgPool,
    client_id: Uuid,
    request: &CreateVehicleRequest,
) -> Result<Vehicle> {
    let mut conn = pool.acquire().await?;
    insert_vehicle(&mut conn, client_id, request).await
}

/// List vehicles owned by a client
pub async fn list_vehicles(pool: &PgPool, client_id: Uuid) -> Result<Vec<Vehicle>> {
    let query = format!(
        "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE client_id = $1 ORDER BY created_at ASC"
    );
    let vehicles = sqlx::query_as::<_, Vehicle>(&query)
        .bind(client_id)
        .fetch_all(pool)
        .await?;

    Ok(vehicles)
}

/// List a client's vehicles on an existing connection (used inside the
/// reconciliation transaction)
pub async fn vehicles_for_client(conn: &mut PgConnection, client_id: Uuid) -> Result<Vec<Vehicle>> {
    let query = format!(
        "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE client_id = $1 ORDER BY created_at ASC"
    );
    let vehicles = sqlx::query_as::<_, Vehicle>(&query)
        .bind(client_id)
        .fetch_all(conn)
        .await?;

    Ok(vehicles)
}

/// Get a single vehicle, scoped to its owning client
pub async fn get_vehicle(pool: &PgPool, id: Uuid, client_id: Uuid) -> Result<Option<Vehicle>> {
    let query = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1 AND client_id = $2");
    let vehicle = sqlx::query_as::<_, Vehicle>(&query)
        .bind(id)
        .bind(client_id)
        .fetch_optional(pool)
        .await?;

    Ok(vehicle)
}

/// Update a vehicle
pub async fn update_vehicle(
    pool: &PgPool,
    client_id: Uuid,
    request: UpdateVehicleRequest,
) -> Result<Option<Vehicle>> {
    // First check if the vehicle exists and belongs to the client
    let Some(existing) = get_vehicle(pool, request.id, client_id).await? else {
        return Ok(None);
    };

    let brand = request.brand.unwrap_or(existing.brand);
    let model = request.model.unwrap_or(existing.model);
    let registration = request.registration.unwrap_or(existing.registration);
    let vin = request.vin.unwrap_or(existing.vin);
    let circulation_date = request.circulation_date.unwrap_or(existing.circulation_date);
    let mileage = request.mileage.unwrap_or(existing.mileage);
    let driver = request.driver.unwrap_or(existing.driver);
    let driver_last_name = request.driver_last_name.or(existing.driver_last_name);
    let driver_first_name = request.driver_first_name.or(existing.driver_first_name);
    let driver_phone = request.driver_phone.or(existing.driver_phone);

    let query = format!(
        "UPDATE vehicles
         SET brand = $1, model = $2, registration = $3, vin = $4, circulation_date = $5,
             mileage = $6, driver = $7, driver_last_name = $8, driver_first_name = $9,
             driver_phone = $10, updated_at = NOW()
         WHERE id = $11 AND client_id = $12
         RETURNING {VEHICLE_COLUMNS}"
    );
    let vehicle = sqlx::query_as::<_, Vehicle>(&query)
        .bind(&brand)
        .bind(&model)
        .bind(&registration)
        .bind(&vin)
        .bind(circulation_date)
        .bind(mileage)
        .bind(driver)
        .bind(&driver_last_name)
        .bind(&driver_first_name)
        .bind(&driver_phone)
        .bind(request.id)
        .bind(client_id)
        .fetch_optional(pool)
        .await?;

    Ok(vehicle)
}

/// Delete a vehicle
pub async fn delete_vehicle(pool: &PgPool, id: Uuid, client_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM vehicles WHERE id = $1 AND client_id = $2")
        .bind(id)
        .bind(client_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
