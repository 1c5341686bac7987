use super::Mode;
use crate::database;
use crate::database::models::{Ingredient, IngredientId};
use crate::repository;
use diesel::QueryResult;

pub struct IngredientForm {
    mode: Mode<IngredientId>,
    pub name: String,
    error: Option<String>,
}

impl IngredientForm {
    pub fn add() -> Self {
        Self {
            mode: Mode::Add,
            name: String::new(),
            error: None,
        }
    }

    pub fn edit(ingredient: &Ingredient) -> Self {
        Self {
            mode: Mode::Edit(ingredient.id),
            name: ingredient.name.clone(),
            error: None,
        }
    }

    pub fn can_save(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn can_delete(&self) -> bool {
        matches!(self.mode, Mode::Edit(_))
    }

    /// Returns true when the save went through and the form should close.
    pub fn save(&mut self, conn: &mut database::Connection) -> bool {
        if !self.can_save() {
            return false;
        }
        let result = match self.mode {
            Mode::Add => repository::add_ingredient(conn, &self.name).map(|_| ()),
            Mode::Edit(edit_id) => repository::edit_ingredient(conn, edit_id, &self.name),
        };
        self.finish(result)
    }

    /// Edit mode only; every recipe link referencing the ingredient goes
    /// with it.
    pub fn delete(&mut self, conn: &mut database::Connection) -> bool {
        let Mode::Edit(edit_id) = self.mode else {
            return false;
        };
        self.finish(repository::delete_ingredient(conn, edit_id))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_edit() {
        let mut conn = database::establish_in_memory();

        let mut form = IngredientForm::add();
        form.name = "Basil".into();
        assert!(form.save(&mut conn));

        let stored = repository::ingredient_by_name(&mut conn, "Basil")
            .unwrap()
            .unwrap();
        let mut form = IngredientForm::edit(&stored);
        form.name = "Fresh Basil".into();
        assert!(form.save(&mut conn));

        let names: Vec<_> = repository::list_ingredients(&mut conn, "")
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, ["Fresh Basil"]);
    }

    #[test]
    fn empty_name_cannot_save() {
        let mut conn = database::establish_in_memory();
        let mut form = IngredientForm::add();
        assert!(!form.can_save());
        assert!(!form.save(&mut conn));
        assert!(repository::list_ingredients(&mut conn, "").unwrap().is_empty());
    }

    #[test]
    fn delete_cascades_to_recipe_links() {
        let mut conn = database::establish_in_memory();
        let basil = repository::add_ingredient(&mut conn, "Basil").unwrap();
        let recipe_id = repository::insert_recipe(
            &mut conn,
            crate::database::models::RecipeDraft {
                name: "Pizza",
                summary: "",
                instructions: "bake",
                time: 30,
                serving: 2,
                image_data: None,
                category_id: None,
            },
            &[(basil.id, "2 leaves".into())],
        )
        .unwrap();

        let mut form = IngredientForm::edit(&basil);
        assert!(form.delete(&mut conn));

        let (_, links) = repository::get_recipe(&mut conn, recipe_id).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn duplicate_name_surfaces_the_save_error() {
        let mut conn = database::establish_in_memory();
        repository::add_ingredient(&mut conn, "Basil").unwrap();

        let mut form = IngredientForm::add();
        form.name = "Basil".into();
        assert!(!form.save(&mut conn));
        assert!(form.error().is_some());

        form.dismiss_error();
        form.name = "Thai Basil".into();
        assert!(form.save(&mut conn));
        assert!(form.error().is_none());
    }
}
