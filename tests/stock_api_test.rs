// ==========================================
// 库存 API 集成测试
// ==========================================


#[cfg(test)]
mod stock_api_test {
    use bom_engine::api::ApiError;
    use bom_engine::domain::{MovementKind, NewProduct, ProductKind, StockStatus};

    use crate::test_helpers::*;

    #[test]
    fn test_stock_in_and_out_write_one_movement_each() {
        let (_temp, state) = create_test_state();
        seed_frame_scenario(&state, 0.0, 10.0);
        let stock = &state.stock_api;

        let inbound = stock
            .stock_in("M", 5.0, "SUPPLIER-A", "bob", Some("PO-17"))
            .unwrap();
        assert_eq!(inbound.signed_quantity, 5.0);
        assert_eq!(inbound.source_label, "SUPPLIER-A");
        assert_eq!(inbound.destination_label, "WAREHOUSE");
        assert_eq!(inbound.production_id, None);

        let outbound = stock
            .stock_out("M", 3.0, "SCRAP-BIN", MovementKind::Scrap, "bob", None)
            .unwrap();
        assert_eq!(outbound.signed_quantity, -3.0);
        assert_eq!(outbound.source_label, "WAREHOUSE");

        assert_eq!(on_hand(&state, "M"), 12.0);

        // 期初 + 入库 + 出库, 最新在前
        let movements = stock.list_movements("M", 10).unwrap();
        assert_eq!(movements.len(), 3);
        assert_eq!(movements[0].kind, MovementKind::Scrap);
        assert_eq!(movements[1].note.as_deref(), Some("PO-17"));
    }

    #[test]
    fn test_stock_out_cannot_exceed_on_hand() {
        let (_temp, state) = create_test_state();
        seed_frame_scenario(&state, 0.0, 2.0);

        let result = state
            .stock_api
            .stock_out("M", 2.5, "CUSTOMER", MovementKind::StockOut, "bob", None);
        match result {
            Err(ApiError::InsufficientStock(shortages)) => {
                assert_eq!(shortages[0].shortage_quantity, 0.5);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
        assert_eq!(on_hand(&state, "M"), 2.0);
    }

    #[test]
    fn test_stock_out_rejects_non_outbound_kind_and_bad_input() {
        let (_temp, state) = create_test_state();
        seed_frame_scenario(&state, 0.0, 2.0);
        let stock = &state.stock_api;

        assert!(matches!(
            stock.stock_out("M", 1.0, "LINE", MovementKind::ProductionConsume, "bob", None),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            stock.stock_out("M", -1.0, "LINE", MovementKind::StockOut, "bob", None),
            Err(ApiError::InvalidQuantity(_))
        ));
        assert!(matches!(
            stock.stock_in("GHOST", 1.0, "SUPPLIER", "bob", None),
            Err(ApiError::NotFound(_))
        ));
        assert_eq!(on_hand(&state, "M"), 2.0);
    }

    #[test]
    fn test_summary_totals_include_production() {
        let (_temp, state) = create_test_state();
        seed_frame_scenario(&state, 0.0, 10.0);

        state.production_api.produce("R-F", 1.0, "alice", None).unwrap();
        state
            .stock_api
            .stock_in("M", 2.0, "SUPPLIER-A", "bob", None)
            .unwrap();

        let m = state.stock_api.product_summary("M").unwrap();
        assert_eq!(m.product.on_hand_quantity, 6.0);
        assert_eq!(m.total_in, 12.0);
        assert_eq!(m.total_out, 6.0);
        assert_eq!(m.status, StockStatus::Normal);

        let f = state.stock_api.product_summary("F").unwrap();
        assert_eq!(f.total_in, 1.0);
        assert_eq!(f.total_out, 0.0);

        let c = state.stock_api.product_summary("C").unwrap();
        assert_eq!(c.status, StockStatus::Empty);
    }

    #[test]
    fn test_below_threshold_listing() {
        let (_temp, state) = create_test_state();
        let mut bolt = NewProduct::new("BOLT", "Bolt", ProductKind::Raw, 3.0);
        bolt.reorder_threshold = 5.0;
        state.catalog_api.create_product(&bolt, "seed").unwrap();
        state
            .catalog_api
            .create_product(&NewProduct::new("NUT", "Nut", ProductKind::Raw, 50.0), "seed")
            .unwrap();

        let low = state.stock_api.list_below_threshold().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product_id, "BOLT");
        assert_eq!(
            state.stock_api.product_summary("BOLT").unwrap().status,
            StockStatus::Critical
        );

        state
            .stock_api
            .stock_in("BOLT", 10.0, "SUPPLIER", "bob", None)
            .unwrap();
        assert!(state.stock_api.list_below_threshold().unwrap().is_empty());
    }
}
