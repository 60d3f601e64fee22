use std::collections::HashMap;
use std::sync::RwLock;

use storefront_orders::{Order, OrderId};

use super::{OrderStore, OrderStoreError};

/// In-memory order store. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: &Order) -> Result<(), OrderStoreError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| OrderStoreError::Storage("lock poisoned".to_string()))?;
        if orders.contains_key(&order.id_typed()) {
            return Err(OrderStoreError::Duplicate(order.id_typed()));
        }
        orders.insert(order.id_typed(), order.clone());
        Ok(())
    }

    fn get(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| OrderStoreError::Storage("lock poisoned".to_string()))?;
        Ok(orders.get(&id).cloned())
    }

    fn count(&self) -> Result<u64, OrderStoreError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| OrderStoreError::Storage("lock poisoned".to_string()))?;
        Ok(orders.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storefront_carts::CartLine;
    use storefront_catalog::VariantId;
    use storefront_core::{EntityId, UserId};
    use storefront_inventory::WarehouseId;
    use storefront_orders::OrderLine;

    fn order() -> Order {
        let v = VariantId::new(EntityId::new());
        Order::from_allocations(
            OrderId::new(EntityId::new()),
            UserId::new(),
            Utc::now(),
            &[CartLine {
                variant_id: v,
                quantity: 1,
            }],
            vec![OrderLine {
                line_no: 1,
                variant_id: v,
                warehouse_id: WarehouseId::new(EntityId::new()),
                quantity: 1,
            }],
        )
        .unwrap()
    }

    #[test]
    fn insert_then_get_round_trips() {
        let store = InMemoryOrderStore::new();
        let o = order();
        store.insert(&o).unwrap();
        assert_eq!(store.get(o.id_typed()).unwrap(), Some(o));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = InMemoryOrderStore::new();
        let o = order();
        store.insert(&o).unwrap();
        assert!(matches!(
            store.insert(&o).unwrap_err(),
            OrderStoreError::Duplicate(_)
        ));
        assert_eq!(store.count().unwrap(), 1);
    }
}
