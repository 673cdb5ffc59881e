//! Operation ordering and payload planning.

use crate::error::{MigrateError, MigrateResult};
use serde_yaml::Value;
use tm_core::{Operation, OperationMap, OperationType};

/// Sort the operations of one direction into execution order.
///
/// The order comes from [`OperationType::EXECUTION_ORDER`] alone; the order
/// of keys in the file never matters. Unknown keys fail with
/// [`MigrateError::InvalidOperationType`].
pub fn order_operations(operations: &OperationMap) -> MigrateResult<Vec<(OperationType, &Value)>> {
    let mut ordered = operations
        .iter()
        .map(|(key, payload)| {
            OperationType::parse(key)
                .map(|op| (op, payload))
                .ok_or_else(|| MigrateError::InvalidOperationType(key.clone()))
        })
        .collect::<MigrateResult<Vec<_>>>()?;

    ordered.sort_by_key(|(op, _)| op.priority());
    Ok(ordered)
}

/// Order the operations and parse every payload.
pub fn plan(operations: &OperationMap) -> MigrateResult<Vec<(OperationType, Operation)>> {
    order_operations(operations)?
        .into_iter()
        .map(|(op, payload)| Ok((op, Operation::parse(op, payload)?)))
        .collect()
}

#[cfg(test)]
#[path = "order_test.rs"]
mod tests;
