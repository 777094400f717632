//! PostgreSQL store for submission-service.
//!
//! Sandbox and production invoices live in separate table pairs with identical
//! layouts; [`Environment`] picks the pair for every query.

use crate::models::{Environment, Invoice, InvoiceItem, InvoiceStatus, NewInvoice, Seller};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::reconciler::ReconciliationUpdate;
use crate::services::store::InvoiceStore;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const INVOICE_COLUMNS: &str = "invoice_id, seller_id, invoice_type, invoice_date, buyer_ntn_cnic, \
    buyer_business_name, buyer_province, buyer_address, buyer_registration_type, invoice_ref_no, \
    scenario_id, total_amount, status, fbr_invoice_number, error, created_utc, updated_utc";

const ITEM_COLUMNS: &str = "item_id, invoice_id, sort_order, hs_code, product_description, rate, \
    uom, quantity, total_values, value_sales_excluding_st, fixed_notified_value_or_retail_price, \
    sales_tax_applicable, sales_tax_withheld_at_source, extra_tax, further_tax, fed_payable, \
    discount, sale_type, sro_schedule_no, sro_item_serial_no, error, created_utc";

const SELLER_COLUMNS: &str = "seller_id, seller_code, business_name, ntn_cnic, province, address1, \
    address2, city, fbr_sandbox_token, fbr_prod_token, is_active, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "submission-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for Database {
    #[instrument(
        skip(self, invoice_ids),
        fields(seller_id = %seller_id, environment = %environment)
    )]
    async fn find_invoices(
        &self,
        environment: Environment,
        seller_id: Uuid,
        invoice_ids: &[Uuid],
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_invoices"])
            .start_timer();

        let rows = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM {} WHERE seller_id = $1 AND invoice_id = ANY($2)",
            INVOICE_COLUMNS,
            environment.invoice_table()
        ))
        .bind(seller_id)
        .bind(invoice_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find invoices: {}", e)))?;

        timer.observe_duration();

        // Back into request order; a repeated id is submitted once.
        let mut by_id: HashMap<Uuid, Invoice> =
            rows.into_iter().map(|i| (i.invoice_id, i)).collect();
        Ok(invoice_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }

    #[instrument(skip(self), fields(seller_id = %seller_id, environment = %environment))]
    async fn list_invoices(
        &self,
        environment: Environment,
        seller_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM {} WHERE seller_id = $1 ORDER BY created_utc DESC, invoice_id LIMIT $2",
            INVOICE_COLUMNS,
            environment.invoice_table()
        ))
        .bind(seller_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self), fields(seller_id = %seller_id, invoice_id = %invoice_id))]
    async fn get_invoice(
        &self,
        environment: Environment,
        seller_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM {} WHERE seller_id = $1 AND invoice_id = $2",
            INVOICE_COLUMNS,
            environment.invoice_table()
        ))
        .bind(seller_id)
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_items(
        &self,
        environment: Environment,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_items"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {} FROM {} WHERE invoice_id = $1 ORDER BY sort_order, created_utc, item_id",
            ITEM_COLUMNS,
            environment.item_table()
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get items: {}", e)))?;

        timer.observe_duration();

        Ok(items)
    }

    #[instrument(skip(self), fields(seller_id = %seller_id))]
    async fn get_seller(&self, seller_id: Uuid) -> Result<Option<Seller>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_seller"])
            .start_timer();

        let seller = sqlx::query_as::<_, Seller>(&format!(
            "SELECT {} FROM sellers WHERE seller_id = $1",
            SELLER_COLUMNS
        ))
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get seller: {}", e)))?;

        timer.observe_duration();

        Ok(seller)
    }

    #[instrument(skip(self, reference_numbers), fields(seller_id = %seller_id))]
    async fn existing_reference_numbers(
        &self,
        environment: Environment,
        seller_id: Uuid,
        reference_numbers: &[String],
    ) -> Result<Vec<String>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["existing_reference_numbers"])
            .start_timer();

        let existing = sqlx::query_scalar::<_, String>(&format!(
            "SELECT DISTINCT invoice_ref_no FROM {} \
             WHERE seller_id = $1 AND invoice_ref_no = ANY($2)",
            environment.invoice_table()
        ))
        .bind(seller_id)
        .bind(reference_numbers)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to check reference numbers: {}",
                e
            ))
        })?;

        timer.observe_duration();

        Ok(existing)
    }

    #[instrument(
        skip(self, drafts),
        fields(seller_id = %seller_id, environment = %environment, count = drafts.len())
    )]
    async fn create_invoices(
        &self,
        environment: Environment,
        seller_id: Uuid,
        drafts: &[NewInvoice],
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoices"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let insert_invoice = format!(
            r#"
            INSERT INTO {} (invoice_id, seller_id, invoice_type, invoice_date, buyer_ntn_cnic,
                buyer_business_name, buyer_province, buyer_address, buyer_registration_type,
                invoice_ref_no, scenario_id, total_amount, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            environment.invoice_table(),
            INVOICE_COLUMNS
        );
        let insert_item = format!(
            r#"
            INSERT INTO {} (item_id, invoice_id, sort_order, hs_code, product_description, rate,
                uom, quantity, total_values, value_sales_excluding_st,
                fixed_notified_value_or_retail_price, sales_tax_applicable,
                sales_tax_withheld_at_source, extra_tax, further_tax, fed_payable, discount,
                sale_type, sro_schedule_no, sro_item_serial_no)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20)
            "#,
            environment.item_table()
        );

        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let invoice = sqlx::query_as::<_, Invoice>(&insert_invoice)
                .bind(Uuid::new_v4())
                .bind(seller_id)
                .bind(&draft.invoice_type)
                .bind(draft.invoice_date)
                .bind(&draft.buyer_ntn_cnic)
                .bind(&draft.buyer_business_name)
                .bind(&draft.buyer_province)
                .bind(&draft.buyer_address)
                .bind(&draft.buyer_registration_type)
                .bind(&draft.invoice_ref_no)
                .bind(&draft.scenario_id)
                .bind(draft.total_amount())
                .bind(InvoiceStatus::Pending.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e))
                })?;

            for (position, item) in draft.items.iter().enumerate() {
                sqlx::query(&insert_item)
                    .bind(Uuid::new_v4())
                    .bind(invoice.invoice_id)
                    .bind(position as i32)
                    .bind(&item.hs_code)
                    .bind(&item.product_description)
                    .bind(&item.rate)
                    .bind(&item.uom)
                    .bind(item.quantity)
                    .bind(item.total_values)
                    .bind(item.value_sales_excluding_st)
                    .bind(item.fixed_notified_value_or_retail_price)
                    .bind(item.sales_tax_applicable)
                    .bind(item.sales_tax_withheld_at_source)
                    .bind(item.extra_tax)
                    .bind(item.further_tax)
                    .bind(item.fed_payable)
                    .bind(item.discount)
                    .bind(&item.sale_type)
                    .bind(&item.sro_schedule_no)
                    .bind(&item.sro_item_serial_no)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!(
                            "Failed to create invoice item: {}",
                            e
                        ))
                    })?;
            }

            created.push(invoice);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit invoices: {}", e))
        })?;

        timer.observe_duration();

        info!(count = created.len(), "Invoices created");

        Ok(created)
    }

    #[instrument(
        skip(self, update),
        fields(
            invoice_id = %update.invoice_id,
            environment = %environment,
            status = update.status.as_str()
        )
    )]
    async fn apply_reconciliation(
        &self,
        environment: Environment,
        update: &ReconciliationUpdate,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["apply_reconciliation"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let result = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET status = $1, error = $2,
                fbr_invoice_number = COALESCE($3, fbr_invoice_number),
                updated_utc = NOW()
            WHERE invoice_id = $4
            "#,
            environment.invoice_table()
        ))
        .bind(update.status.as_str())
        .bind(&update.error)
        .bind(&update.fbr_invoice_number)
        .bind(update.invoice_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        if result.rows_affected() == 0 {
            warn!("Invoice disappeared before reconciliation");
        }

        if update.clear_item_errors {
            sqlx::query(&format!(
                "UPDATE {} SET error = NULL WHERE invoice_id = $1",
                environment.item_table()
            ))
            .bind(update.invoice_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to clear item errors: {}", e))
            })?;
        }

        let annotate = format!(
            "UPDATE {} SET error = $1 WHERE item_id = $2 AND invoice_id = $3",
            environment.item_table()
        );
        for (item_id, message) in &update.item_errors {
            sqlx::query(&annotate)
                .bind(message)
                .bind(item_id)
                .bind(update.invoice_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to annotate item: {}", e))
                })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit reconciliation: {}", e))
        })?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
