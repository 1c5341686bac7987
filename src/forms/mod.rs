pub mod category;
pub mod ingredient;
pub mod recipe;

pub use category::CategoryForm;
pub use ingredient::IngredientForm;
pub use recipe::RecipeForm;

/// Chosen when the form opens and never changes within one session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode<Id> {
    Add,
    Edit(Id),
}
