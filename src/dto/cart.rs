use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartLine;

fn default_quantity() -> i32 {
    1
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CartList {
    #[schema(value_type = Vec<CartLine>)]
    pub items: Vec<CartLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_defaults_to_one() {
        let req: AddToCartRequest = serde_json::from_value(serde_json::json!({
            "product_id": Uuid::nil(),
        }))
        .expect("deserialize");
        assert_eq!(req.quantity, 1);
    }
}
