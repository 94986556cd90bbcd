//! # CSV Export
//!
//! Spreadsheet projections of report results. Each writer emits a header
//! row, then one record per item, LF-terminated. Money is written in major
//! units with two decimals, weights in kilograms with three.
//!
//! ```rust,ignore
//! let sales = db.ledger().query_sales(&SalesFilter::for_day(today)).await?;
//! let file = std::fs::File::create("sales.csv")?;
//! export::sales_csv(&sales, file)?;
//! ```

use std::io::{self, Write};

use thiserror::Error;

use crate::repository::report::ProductPerformance;
use ricemill_core::{Sale, SaleLine, StockMovement, StockStatus};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type ExportResult = Result<(), ExportError>;

const SALES_HEADER: [&str; 13] = [
    "sale_number",
    "created_at",
    "actor_id",
    "payment_mode",
    "payment_status",
    "subtotal",
    "discount",
    "total",
    "discount_reason",
    "customer_name",
    "customer_phone",
    "settled_at",
    "settled_by",
];

const SALE_LINES_HEADER: [&str; 9] = [
    "sale_id",
    "position",
    "code",
    "name",
    "unit_kind",
    "containers",
    "quantity_kg",
    "unit_price",
    "line_total",
];

const STOCK_HEADER: [&str; 8] = [
    "code",
    "name",
    "quality",
    "price_per_kg",
    "container_price",
    "on_hand_kg",
    "min_stock_kg",
    "status",
];

const PERFORMANCE_HEADER: [&str; 6] = [
    "code",
    "name",
    "weight_sold_kg",
    "containers_sold",
    "revenue",
    "sale_count",
];

const MOVEMENTS_HEADER: [&str; 7] = [
    "created_at",
    "product_id",
    "delta_kg",
    "reason",
    "reference_id",
    "note",
    "actor_id",
];

fn writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

pub fn sales_csv<W: Write>(sales: &[Sale], out: W) -> ExportResult {
    let mut csv = writer(out);
    csv.write_record(SALES_HEADER)?;

    for sale in sales {
        csv.write_record([
            sale.sale_number.clone(),
            sale.created_at.to_rfc3339(),
            sale.actor_id.clone(),
            sale.payment_mode.as_str().to_string(),
            sale.payment_status.as_str().to_string(),
            sale.subtotal.to_decimal_string(),
            sale.discount.to_decimal_string(),
            sale.total.to_decimal_string(),
            sale.discount_reason.clone().unwrap_or_default(),
            sale.customer_name.clone().unwrap_or_default(),
            sale.customer_phone.clone().unwrap_or_default(),
            sale.settled_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            sale.settled_by.clone().unwrap_or_default(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

pub fn sale_lines_csv<W: Write>(lines: &[SaleLine], out: W) -> ExportResult {
    let mut csv = writer(out);
    csv.write_record(SALE_LINES_HEADER)?;

    for line in lines {
        csv.write_record([
            line.sale_id.clone(),
            line.position.to_string(),
            line.code_snapshot.clone(),
            line.name_snapshot.clone(),
            line.unit_kind.as_str().to_string(),
            line.container_count.map(|c| c.to_string()).unwrap_or_default(),
            line.quantity.to_kg_string(),
            line.unit_price.to_decimal_string(),
            line.line_total.to_decimal_string(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

pub fn stock_csv<W: Write>(rows: &[StockStatus], out: W) -> ExportResult {
    let mut csv = writer(out);
    csv.write_record(STOCK_HEADER)?;

    for row in rows {
        csv.write_record([
            row.code.clone(),
            row.name.clone(),
            row.quality.as_str().to_string(),
            row.price_per_kg.to_decimal_string(),
            row.container_price
                .map(|p| p.to_decimal_string())
                .unwrap_or_default(),
            row.on_hand.to_kg_string(),
            row.min_stock.to_kg_string(),
            row.level.label().to_string(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

pub fn product_performance_csv<W: Write>(rows: &[ProductPerformance], out: W) -> ExportResult {
    let mut csv = writer(out);
    csv.write_record(PERFORMANCE_HEADER)?;

    for row in rows {
        csv.write_record([
            row.code.clone(),
            row.name.clone(),
            row.weight_sold.to_kg_string(),
            row.containers_sold.to_string(),
            row.revenue.to_decimal_string(),
            row.sale_count.to_string(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

pub fn movements_csv<W: Write>(movements: &[StockMovement], out: W) -> ExportResult {
    let mut csv = writer(out);
    csv.write_record(MOVEMENTS_HEADER)?;

    for m in movements {
        csv.write_record([
            m.created_at.to_rfc3339(),
            m.product_id.clone(),
            m.delta.to_kg_string(),
            m.reason.as_str().to_string(),
            m.reference_id.clone().unwrap_or_default(),
            m.note.clone().unwrap_or_default(),
            m.actor_id.clone(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sale::SalesFilter;
    use crate::testing::{admin, basmati, cashier, seed_product, test_db};
    use ricemill_core::{AdjustmentReason, Money, NewSale, SaleLineRequest, Weight};

    fn lines_of(buf: Vec<u8>) -> Vec<String> {
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_sales_and_lines_export() {
        let db = test_db().await;
        let rice = seed_product(&db, &basmati()).await;
        let receipt = db
            .ledger()
            .create_sale(
                &admin(),
                &NewSale::credit(vec![
                    SaleLineRequest::by_container(&rice.id, 1),
                    SaleLineRequest::by_weight(&rice.id, Weight::from_grams(1_500)),
                ])
                .with_discount(Money::from_cents(2_500), Some("bulk, regular".to_string()))
                .with_customer("Ramesh", None),
            )
            .await
            .unwrap();

        let mut buf = Vec::new();
        sales_csv(std::slice::from_ref(&receipt.sale), &mut buf).unwrap();
        let rows = lines_of(buf);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("sale_number,created_at,actor_id"));
        assert!(rows[1].contains(",credit,outstanding,1722.50,25.00,1697.50,\"bulk, regular\",Ramesh,,,"));

        let mut buf = Vec::new();
        sale_lines_csv(&receipt.lines, &mut buf).unwrap();
        let rows = lines_of(buf);
        assert_eq!(rows.len(), 3);
        assert!(rows[1].ends_with(",0,RICE001,Basmati Rice,container,1,25.000,1625.00,1625.00"));
        assert!(rows[2].ends_with(",1,RICE001,Basmati Rice,weight,,1.500,65.00,97.50"));
    }

    #[tokio::test]
    async fn test_stock_and_movement_export() {
        let db = test_db().await;
        let rice = seed_product(&db, &basmati()).await;
        db.ledger()
            .adjust_stock(&admin(), &rice.id, Weight::from_kg(-420), AdjustmentReason::Adjustment, Some("recount"))
            .await
            .unwrap();

        let mut buf = Vec::new();
        stock_csv(&db.ledger().query_stock_status().await.unwrap(), &mut buf).unwrap();
        let rows = lines_of(buf);
        assert_eq!(rows[0], "code,name,quality,price_per_kg,container_price,on_hand_kg,min_stock_kg,status");
        assert_eq!(rows[1], "RICE001,Basmati Rice,premium,65.00,1625.00,80.000,100.000,Low Stock");

        let mut buf = Vec::new();
        let movements = db.movements().for_product(&rice.id).await.unwrap();
        movements_csv(&movements, &mut buf).unwrap();
        let rows = lines_of(buf);
        assert_eq!(rows.len(), 3);
        assert!(rows[1].contains(",500.000,restock,,opening stock,"));
        assert!(rows[2].contains(",-420.000,adjustment,,recount,"));
    }

    #[tokio::test]
    async fn test_performance_export() {
        let db = test_db().await;
        let rice = seed_product(&db, &basmati()).await;
        db.ledger()
            .create_sale(
                &cashier(),
                &NewSale::cash(vec![SaleLineRequest::by_container(&rice.id, 2)]),
            )
            .await
            .unwrap();

        let rows = db.reports().product_performance(&SalesFilter::new()).await.unwrap();
        let mut buf = Vec::new();
        product_performance_csv(&rows, &mut buf).unwrap();

        assert_eq!(
            lines_of(buf),
            vec![
                "code,name,weight_sold_kg,containers_sold,revenue,sale_count".to_string(),
                "RICE001,Basmati Rice,50.000,2,3250.00,1".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let mut buf = Vec::new();
        sales_csv(&[], &mut buf).unwrap();
        assert_eq!(lines_of(buf).len(), 1);
    }
}
