use super::Mode;
use crate::database;
use crate::database::models::{CategoryId, Ingredient, IngredientId, RecipeDraft, RecipeId};
use crate::photos;
use crate::repository;
use diesel::QueryResult;
use std::path::PathBuf;
use std::sync::mpsc;

/// One row of the uncommitted ingredient list. The ingredient name is kept
/// alongside the id so the list can be shown without touching the store.
#[derive(Clone)]
pub struct WorkingIngredient {
    pub ingredient_id: IngredientId,
    pub name: String,
    pub quantity: String,
}

pub struct RecipeForm {
    mode: Mode<RecipeId>,
    pub name: String,
    pub summary: String,
    pub instructions: String,
    pub time: i32,
    pub serving: i32,
    pub category: Option<CategoryId>,
    ingredients: Vec<WorkingIngredient>,
    image_data: Option<Vec<u8>>,
    pending_image: Option<mpsc::Receiver<Option<Vec<u8>>>>,
    error: Option<String>,
}

impl RecipeForm {
    pub fn add() -> Self {
        Self {
            mode: Mode::Add,
            name: String::new(),
            summary: String::new(),
            instructions: String::new(),
            time: 5,
            serving: 1,
            category: None,
            ingredients: vec![],
            image_data: None,
            pending_image: None,
            error: None,
        }
    }

    pub fn edit(conn: &mut database::Connection, recipe_id: RecipeId) -> QueryResult<Self> {
        let (recipe, links) = repository::get_recipe(conn, recipe_id)?;
        Ok(Self {
            mode: Mode::Edit(recipe.id),
            name: recipe.name,
            summary: recipe.summary,
            instructions: recipe.instructions,
            time: recipe.time,
            serving: recipe.serving,
            category: recipe.category_id,
            ingredients: links
                .into_iter()
                .map(|(link, ingredient)| WorkingIngredient {
                    ingredient_id: ingredient.id,
                    name: ingredient.name,
                    quantity: link.quantity,
                })
                .collect(),
            image_data: recipe.image_data,
            pending_image: None,
            error: None,
        })
    }

    pub fn can_save(&self) -> bool {
        !self.name.is_empty() && !self.instructions.is_empty()
    }

    pub fn can_delete(&self) -> bool {
        matches!(self.mode, Mode::Edit(_))
    }

    pub fn ingredients(&self) -> &[WorkingIngredient] {
        &self.ingredients
    }

    /// The picker appends with a blank quantity for the user to fill in.
    pub fn add_ingredient(&mut self, ingredient: &Ingredient) {
        self.ingredients.push(WorkingIngredient {
            ingredient_id: ingredient.id,
            name: ingredient.name.clone(),
            quantity: String::new(),
        });
    }

    pub fn remove_ingredient(&mut self, index: usize) {
        self.ingredients.remove(index);
    }

    pub fn set_quantity(&mut self, index: usize, quantity: impl Into<String>) {
        self.ingredients[index].quantity = quantity.into();
    }

    pub fn image_data(&self) -> Option<&[u8]> {
        self.image_data.as_deref()
    }

    /// Kicks off an off-thread load; the result lands on a later
    /// `poll_image`. Picking again replaces any load still in flight.
    pub fn pick_image(&mut self, path: PathBuf) {
        self.pending_image = Some(photos::fetch(path));
    }

    pub fn image_loading(&self) -> bool {
        self.pending_image.is_some()
    }

    pub fn poll_image(&mut self) {
        let Some(receiver) = &self.pending_image else {
            return;
        };
        match receiver.try_recv() {
            Ok(loaded) => {
                self.image_data = loaded;
                self.pending_image = None;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => self.pending_image = None,
        }
    }

    pub fn remove_image(&mut self) {
        self.image_data = None;
        self.pending_image = None;
    }

    /// Returns true when the save went through and the form should close.
    /// Both modes persist the working ingredient list as-is, replacing
    /// whatever link rows the recipe had.
    pub fn save(&mut self, conn: &mut database::Connection) -> bool {
        if !self.can_save() {
            return false;
        }
        let links: Vec<_> = self
            .ingredients
            .iter()
            .map(|w| (w.ingredient_id, w.quantity.clone()))
            .collect();
        let draft = RecipeDraft {
            name: &self.name,
            summary: &self.summary,
            instructions: &self.instructions,
            time: self.time,
            serving: self.serving,
            image_data: self.image_data.as_deref(),
            category_id: self.category,
        };
        let result = match self.mode {
            Mode::Add => repository::insert_recipe(conn, draft, &links).map(|_| ()),
            Mode::Edit(edit_id) => repository::update_recipe(conn, edit_id, draft, &links),
        };
        self.finish(result)
    }

    /// Edit mode only; cascades to the recipe's link rows.
    pub fn delete(&mut self, conn: &mut database::Connection) -> bool {
        let Mode::Edit(edit_id) = self.mode else {
            return false;
        };
        self.finish(repository::delete_recipe(conn, edit_id))
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn finish(&mut self, result: QueryResult<()>) -> bool {
        match result {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(error.to_string());
                false
            }
        }
    }
}
