use diesel::associations::{Associations, Identifiable};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::Insertable;
use diesel_derive_newtype::DieselNewType;

#[derive(DieselNewType, Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub struct CategoryId(i32);

#[derive(Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::database::schema::categories)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(DieselNewType, Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub struct IngredientId(i32);

#[derive(Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
}

#[derive(DieselNewType, Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub struct RecipeId(i32);

#[derive(Associations, Queryable, Selectable, Identifiable, Clone)]
#[diesel(belongs_to(Category))]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub summary: String,
    pub instructions: String,
    pub time: i32,
    pub serving: i32,
    pub image_data: Option<Vec<u8>>,
    pub category_id: Option<CategoryId>,
}

/// Field values for a recipe insert or overwrite, minus the ingredient
/// links, which travel separately as the working list.
#[derive(Insertable)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeDraft<'a> {
    pub name: &'a str,
    pub summary: &'a str,
    pub instructions: &'a str,
    pub time: i32,
    pub serving: i32,
    pub image_data: Option<&'a [u8]>,
    pub category_id: Option<CategoryId>,
}

#[derive(DieselNewType, Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub struct RecipeIngredientId(i32);

#[derive(Associations, Queryable, Selectable, Identifiable, Clone)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Ingredient))]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
pub struct RecipeIngredient {
    pub id: RecipeIngredientId,
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub quantity: String,
}
