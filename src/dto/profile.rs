use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::users;

/// Recognized dietary flags. Keys not listed here are dropped by serde.
#[derive(Deserialize, Debug, Default, Clone, ToSchema)]
pub struct DietaryPreferencesRequest {
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_pescatarian: Option<bool>,
    pub is_flexitarian: Option<bool>,
    pub is_paleo: Option<bool>,
    pub is_ketogenic: Option<bool>,
    pub is_halal: Option<bool>,
    pub is_kosher: Option<bool>,
    pub is_fruitarian: Option<bool>,
    pub is_gluten_free: Option<bool>,
    pub is_dairy_free: Option<bool>,
    pub is_organic: Option<bool>,
}

impl DietaryPreferencesRequest {
    /// Sets only the flags that were provided.
    pub fn apply(&self, active: &mut users::ActiveModel) {
        macro_rules! apply_flag {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = self.$field {
                        active.$field = Set(value);
                    }
                )*
            };
        }
        apply_flag!(
            is_vegetarian,
            is_vegan,
            is_pescatarian,
            is_flexitarian,
            is_paleo,
            is_ketogenic,
            is_halal,
            is_kosher,
            is_fruitarian,
            is_gluten_free,
            is_dairy_free,
            is_organic,
        );
    }

    pub fn is_empty(&self) -> bool {
        self.provided().is_empty()
    }

    /// Names of the flags present in the request, for audit metadata.
    pub fn provided(&self) -> Vec<&'static str> {
        [
            ("is_vegetarian", self.is_vegetarian),
            ("is_vegan", self.is_vegan),
            ("is_pescatarian", self.is_pescatarian),
            ("is_flexitarian", self.is_flexitarian),
            ("is_paleo", self.is_paleo),
            ("is_ketogenic", self.is_ketogenic),
            ("is_halal", self.is_halal),
            ("is_kosher", self.is_kosher),
            ("is_fruitarian", self.is_fruitarian),
            ("is_gluten_free", self.is_gluten_free),
            ("is_dairy_free", self.is_dairy_free),
            ("is_organic", self.is_organic),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|_| name))
        .collect()
    }
}

/// Profile fields a user may change. `password` has no slot here on purpose.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    #[serde(flatten)]
    pub dietary: DietaryPreferencesRequest,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfilePictureResponse {
    pub message: String,
    pub profile_picture: String,
}

/// Multipart body for the picture upload, for the API docs only.
#[derive(Debug, ToSchema)]
pub struct ProfilePictureForm {
    #[schema(value_type = String, format = Binary)]
    pub profile_picture: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    #[test]
    fn ignores_unknown_keys() {
        let req: DietaryPreferencesRequest = serde_json::from_value(serde_json::json!({
            "is_vegan": true,
            "is_halal": false,
            "is_carnivore": true,
            "password": "nope"
        }))
        .expect("deserialize");
        assert_eq!(req.provided(), vec!["is_vegan", "is_halal"]);
    }

    #[test]
    fn applies_only_provided_flags() {
        let req = DietaryPreferencesRequest {
            is_ketogenic: Some(true),
            ..Default::default()
        };
        let mut active = users::ActiveModel::default();
        req.apply(&mut active);
        assert_eq!(active.is_ketogenic, ActiveValue::Set(true));
        assert!(matches!(active.is_vegan, ActiveValue::NotSet));
        assert!(matches!(active.is_organic, ActiveValue::NotSet));
    }

    #[test]
    fn profile_update_drops_password() {
        let req: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "full_name": "Juan Dela Cruz",
            "password": "hunter2",
            "is_organic": true
        }))
        .expect("deserialize");
        assert_eq!(req.full_name.as_deref(), Some("Juan Dela Cruz"));
        assert_eq!(req.dietary.is_organic, Some(true));
        assert!(req.username.is_none());
    }
}
