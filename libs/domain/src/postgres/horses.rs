use chrono::NaiveDate;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use super::{Database, optional_text_enum, text_enum};
use crate::error::DomainResult;
use crate::models::{DewormingRecord, Horse, ShoeingRecord, VaccinationRecord};
use crate::store::HorseStore;

fn horse_from_row(row: &PgRow) -> DomainResult<Horse> {
    Ok(Horse {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        chip_number: row.try_get("chip_number")?,
        sanitary_category: optional_text_enum(row, "sanitary_category")?,
        status: text_enum(row, "status")?,
        owner_id: row.try_get("owner_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn vaccination_from_row(row: &PgRow) -> DomainResult<VaccinationRecord> {
    Ok(VaccinationRecord {
        id: row.try_get("id")?,
        horse_id: row.try_get("horse_id")?,
        vaccine_type: row.try_get("vaccine_type")?,
        date: row.try_get("performed_on")?,
        veterinarian: row.try_get("veterinarian")?,
        brand: row.try_get("brand")?,
        next_due: row.try_get("next_due")?,
        applied: row.try_get("applied")?,
    })
}

fn deworming_from_row(row: &PgRow) -> DomainResult<DewormingRecord> {
    Ok(DewormingRecord {
        id: row.try_get("id")?,
        horse_id: row.try_get("horse_id")?,
        date: row.try_get("performed_on")?,
        brand: row.try_get("brand")?,
        drugs: row.try_get("drugs")?,
        next_due: row.try_get("next_due")?,
    })
}

fn shoeing_from_row(row: &PgRow) -> DomainResult<ShoeingRecord> {
    Ok(ShoeingRecord {
        id: row.try_get("id")?,
        horse_id: row.try_get("horse_id")?,
        date: row.try_get("performed_on")?,
        farrier: row.try_get("farrier")?,
        next_due: row.try_get("next_due")?,
    })
}

impl HorseStore for Database {
    async fn find_horse(&self, id: Uuid) -> DomainResult<Option<Horse>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, chip_number, sanitary_category, status, owner_id, created_at, updated_at
            FROM horses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(horse_from_row).transpose()
    }

    async fn vaccinations_between(
        &self,
        horse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<VaccinationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, horse_id, vaccine_type, performed_on, veterinarian, brand, next_due, applied
            FROM vaccination_records
            WHERE horse_id = $1 AND performed_on BETWEEN $2 AND $3
            ORDER BY performed_on, created_at
            "#,
        )
        .bind(horse_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(vaccination_from_row).collect()
    }

    async fn dewormings_between(
        &self,
        horse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<DewormingRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, horse_id, performed_on, brand, drugs, next_due
            FROM deworming_records
            WHERE horse_id = $1 AND performed_on BETWEEN $2 AND $3
            ORDER BY performed_on, created_at
            "#,
        )
        .bind(horse_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(deworming_from_row).collect()
    }

    async fn vaccinations_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<VaccinationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, horse_id, vaccine_type, performed_on, veterinarian, brand, next_due, applied
            FROM vaccination_records
            WHERE next_due BETWEEN $1 AND $2
            ORDER BY next_due
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(vaccination_from_row).collect()
    }

    async fn shoeings_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<ShoeingRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, horse_id, performed_on, farrier, next_due
            FROM shoeing_records
            WHERE next_due BETWEEN $1 AND $2
            ORDER BY next_due
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(shoeing_from_row).collect()
    }
}
