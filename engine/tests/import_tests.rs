//! Bulk import merge tests
//!
//! Imports carry absolute quantities; merging must flow through the
//! ledger: exactly one movement of magnitude |imported - cached| per
//! changed product, zero movements when the quantity is unchanged, and
//! creation through the initial-stock path for unknown products.

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{
    CreateProductInput, MovementReason, MovementType, ProductImportRecord, Scope,
};
use shopstock_engine::{
    AppError, CollectionStore, ImportOutcome, ImportService, MemoryStore, MovementFilter,
    MovementLedger, ProductRegistry,
};

fn scope() -> Scope {
    Scope::Local("test-shop".to_string())
}

struct Ctx {
    ledger: Arc<MovementLedger>,
    registry: Arc<ProductRegistry>,
    import: ImportService,
}

fn ctx() -> Ctx {
    let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
    let ledger = Arc::new(MovementLedger::new(store.clone(), scope()));
    let registry = Arc::new(ProductRegistry::new(store, scope(), ledger.clone()));
    let import = ImportService::new(registry.clone(), ledger.clone());
    Ctx { ledger, registry, import }
}

fn record(name: &str, quantity: i64) -> ProductImportRecord {
    ProductImportRecord {
        name: name.to_string(),
        description: String::new(),
        category: "divers".to_string(),
        brand: "générique".to_string(),
        purchase_price: Decimal::from(800),
        selling_price: Decimal::from(1000),
        quantity,
    }
}

mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_merge_records_single_delta_movement() {
        let ctx = ctx();
        let product = ctx
            .registry
            .create(CreateProductInput {
                name: "Produit 1".to_string(),
                description: String::new(),
                category: "divers".to_string(),
                brand: "générique".to_string(),
                purchase_price: Decimal::from(800),
                selling_price: Decimal::from(1000),
                initial_quantity: 50,
            })
            .await
            .unwrap();

        let outcome = ctx.import.bulk_merge(vec![record("Produit 1", 45)]).await.unwrap();
        assert_eq!(outcome, ImportOutcome { created: 0, updated: 1, unchanged: 0 });

        let import_movements = ctx
            .ledger
            .query_movements(&MovementFilter {
                product_id: Some(product.id),
                movement_type: Some(MovementType::Outgoing),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(import_movements.len(), 1);
        assert_eq!(import_movements[0].quantity, 5);
        assert_eq!(import_movements[0].reason, MovementReason::Import);
        assert_eq!(ctx.registry.get_by_id(product.id).await.unwrap().quantity, 45);
    }

    #[tokio::test]
    async fn test_merge_equal_quantity_records_nothing() {
        let ctx = ctx();
        let product = ctx
            .registry
            .create(CreateProductInput {
                initial_quantity: 50,
                ..sample_create("Produit 1")
            })
            .await
            .unwrap();

        let outcome = ctx.import.bulk_merge(vec![record("Produit 1", 50)]).await.unwrap();
        assert_eq!(outcome, ImportOutcome { created: 0, updated: 0, unchanged: 1 });

        let movements = ctx
            .ledger
            .query_movements(&MovementFilter {
                product_id: Some(product.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(movements.len(), 1); // only the initial stock entry
    }

    #[tokio::test]
    async fn test_merge_creates_unknown_products() {
        let ctx = ctx();

        let outcome = ctx
            .import
            .bulk_merge(vec![record("Produit 1", 20), record("Produit 2", 0)])
            .await
            .unwrap();
        assert_eq!(outcome, ImportOutcome { created: 2, updated: 0, unchanged: 0 });

        let products = ctx.registry.list().await.unwrap();
        assert_eq!(products.len(), 2);

        let created = ctx.registry.search("Produit 1").await.unwrap().remove(0);
        assert_eq!(created.quantity, 20);
        let movements = ctx
            .ledger
            .query_movements(&MovementFilter {
                product_id: Some(created.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].reason, MovementReason::InitialStock);
    }

    #[tokio::test]
    async fn test_merge_refreshes_metadata() {
        let ctx = ctx();
        let product = ctx
            .registry
            .create(CreateProductInput {
                initial_quantity: 10,
                ..sample_create("Produit 1")
            })
            .await
            .unwrap();

        let mut row = record("Produit 1", 10);
        row.brand = "Marque A".to_string();
        row.selling_price = Decimal::from(1200);
        ctx.import.bulk_merge(vec![row]).await.unwrap();

        let refreshed = ctx.registry.get_by_id(product.id).await.unwrap();
        assert_eq!(refreshed.brand, "Marque A");
        assert_eq!(refreshed.selling_price, Decimal::from(1200));
        assert_eq!(refreshed.quantity, 10);
    }

    #[tokio::test]
    async fn test_merge_rejects_out_of_range_quantities() {
        let ctx = ctx();

        let err = ctx.import.bulk_merge(vec![record("Produit 1", -1)]).await.unwrap_err();
        assert!(matches!(err, AppError::Import(_)));

        let err = ctx
            .import
            .bulk_merge(vec![record("Produit 1", i64::MAX)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Import(_)));

        assert!(ctx.registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parse_csv_with_export_header() {
        let ctx = ctx();
        let csv = "\
name,description,category,brand,purchasePrice,sellingPrice,quantity
Produit 1,,divers,générique,800,1000,45
Produit 2,Sac de 5kg,alimentaire,Marque A,300,450,12
";
        let records = ctx.import.parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Produit 1");
        assert_eq!(records[0].quantity, 45);
        assert_eq!(records[1].purchase_price, Decimal::from(300));
    }

    #[tokio::test]
    async fn test_from_json() {
        let ctx = ctx();
        let json = r#"[
            {"name": "Produit 1", "purchasePrice": "800", "sellingPrice": "1000", "quantity": 45}
        ]"#;
        let records = ctx.import.from_json(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity, 45);
        assert!(records[0].category.is_empty());
    }

    #[tokio::test]
    async fn test_csv_export_round_trip() {
        let ctx = ctx();
        ctx.registry
            .create(CreateProductInput {
                initial_quantity: 7,
                ..sample_create("Produit 1")
            })
            .await
            .unwrap();

        let products = ctx.registry.list().await.unwrap();
        let csv = ctx.import.export_products_csv(&products).unwrap();
        assert!(csv.starts_with("name,description,category,brand,purchasePrice,sellingPrice,quantity"));

        let reparsed = ctx.import.parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(reparsed.len(), 1);
        assert_eq!(reparsed[0].name, "Produit 1");
        assert_eq!(reparsed[0].quantity, 7);

        let stock_csv = ctx.import.export_stock_csv(&products).unwrap();
        assert!(stock_csv.starts_with("name,brand,quantity,purchasePrice,totalValue"));
        assert!(stock_csv.contains("5600")); // 7 * 800
    }

    fn sample_create(name: &str) -> CreateProductInput {
        CreateProductInput {
            name: name.to_string(),
            description: String::new(),
            category: "divers".to_string(),
            brand: "générique".to_string(),
            purchase_price: Decimal::from(800),
            selling_price: Decimal::from(1000),
            initial_quantity: 0,
        }
    }
}
