//! Operation records exchanged between replicas.
//!
//! A local edit produces one of these; any other replica reproduces the edit
//! by feeding the record to [`Rgass::apply`](crate::crdt::Rgass::apply).

use serde::{Deserialize, Serialize};

use crate::crdt::types::Identifier;

/// Insert `text` with identifier `id` at `position` of the span named by `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOperation {
    pub target: Identifier,
    pub position: usize,
    pub text: String,
    pub id: Identifier,
}

/// Delete `length` characters starting at `position` of the first span in
/// `targets`, continuing through the following spans in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOperation {
    pub targets: Vec<Identifier>,
    pub position: usize,
    pub length: usize,
}

/// Any operation a replica can receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Insert(InsertOperation),
    Delete(DeleteOperation),
}

impl Operation {
    /// Highest logical clock mentioned by the operation.
    ///
    /// A receiving site advances its own clock past this value so that
    /// anything it inserts afterwards orders after what it has seen.
    pub fn max_clock(&self) -> u64 {
        match self {
            Operation::Insert(insert) => insert.id.clock.max(insert.target.clock),
            Operation::Delete(delete) => delete
                .targets
                .iter()
                .map(|id| id.clock)
                .max()
                .unwrap_or(0),
        }
    }
}

impl From<InsertOperation> for Operation {
    fn from(operation: InsertOperation) -> Self {
        Operation::Insert(operation)
    }
}

impl From<DeleteOperation> for Operation {
    fn from(operation: DeleteOperation) -> Self {
        Operation::Delete(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_json_shape() {
        let operation = Operation::from(DeleteOperation {
            targets: vec![Identifier::new(1, 2, 3, 4)],
            position: 1,
            length: 2,
        });

        let json = serde_json::to_value(&operation).unwrap();
        assert_eq!(json["type"], "delete");
        assert_eq!(json["targets"][0]["clock"], 2);
        assert_eq!(json["length"], 2);

        let back: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(back, operation);
    }

    #[test]
    fn test_max_clock() {
        let insert = Operation::from(InsertOperation {
            target: Identifier::new(1, 7, 1, 3),
            position: 3,
            text: "x".into(),
            id: Identifier::new(1, 9, 2, 1),
        });
        assert_eq!(insert.max_clock(), 9);

        let delete = Operation::from(DeleteOperation {
            targets: vec![Identifier::new(1, 4, 1, 1), Identifier::new(1, 6, 2, 1)],
            position: 0,
            length: 2,
        });
        assert_eq!(delete.max_clock(), 6);
    }
}
